// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Errors that can occur during SMTP operations.
///
/// Each variant captures a specific failure mode with a descriptive message.
#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
	/// Failed to connect to the relay or to negotiate TLS with it.
	#[error("connection failed: {0}")]
	Connection(String),

	/// The relay rejected a message or the connection dropped mid-batch.
	#[error("delivery to {recipient} failed: {reason}")]
	DeliveryFailed { recipient: String, reason: String },

	/// Invalid email address format.
	#[error("invalid email address: {0}")]
	Address(String),

	/// A message could not be assembled.
	#[error("failed to build message: {0}")]
	Build(String),

	/// Invalid configuration (missing required fields, invalid values).
	#[error("invalid configuration: {0}")]
	Config(String),

	/// The batch was cancelled before every message was sent.
	#[error("delivery cancelled after {sent} message(s)")]
	Cancelled { sent: usize },
}

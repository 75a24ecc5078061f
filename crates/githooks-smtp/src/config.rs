// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Relay settings for [`Notifier`](crate::Notifier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
	/// Relay hostname.
	#[serde(default = "default_host")]
	pub host: String,

	/// Relay port. Common values: 25 (relay), 587 (submission).
	#[serde(default = "default_port")]
	pub port: u16,

	/// Envelope sender and `From` address.
	#[serde(default)]
	pub from_address: String,

	/// Upgrade the connection with STARTTLS before sending.
	#[serde(default)]
	pub use_tls: bool,

	/// Socket timeout for connecting and for every relay round trip.
	/// `None` waits indefinitely.
	#[serde(default = "default_timeout_secs")]
	pub timeout_secs: Option<u64>,
}

fn default_host() -> String {
	"localhost".to_string()
}

fn default_port() -> u16 {
	25
}

fn default_timeout_secs() -> Option<u64> {
	Some(60)
}

impl Default for SmtpConfig {
	fn default() -> Self {
		Self {
			host: default_host(),
			port: default_port(),
			from_address: String::new(),
			use_tls: false,
			timeout_secs: default_timeout_secs(),
		}
	}
}

impl SmtpConfig {
	pub fn timeout(&self) -> Option<Duration> {
		self.timeout_secs.map(Duration::from_secs)
	}
}

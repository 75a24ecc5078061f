// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use githooks_common_process::ProcessError;

/// Errors that can occur while querying git.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
	/// The git binary could not be found.
	#[error("git is not installed or not in PATH")]
	GitNotInstalled,

	/// Running git failed (non-zero exit, timeout, cancellation, I/O).
	#[error(transparent)]
	Process(ProcessError),

	/// Git produced output in an unexpected shape.
	#[error("could not parse 'git {command}' output: {message}")]
	Parse {
		command: &'static str,
		message: String,
	},

	/// The caller asked for something that has no answer.
	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	/// `git check-attr` answered for a different path or attribute.
	#[error(
		"git check-attr answered '{output}' when asked for attribute '{attribute}' of '{path}'"
	)]
	AttributeLookupMismatch {
		path: String,
		attribute: String,
		output: String,
	},

	/// The temporary index for an attribute lookup could not be created.
	#[error("failed to create temporary index: {0}")]
	TempIndex(#[source] std::io::Error),
}

impl From<ProcessError> for GitError {
	fn from(err: ProcessError) -> Self {
		match err {
			ProcessError::NotFound { .. } => Self::GitNotInstalled,
			other => Self::Process(other),
		}
	}
}

impl GitError {
	pub(crate) fn parse(command: &'static str, message: impl Into<String>) -> Self {
		Self::Parse {
			command,
			message: message.into(),
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::time::Duration;

/// Errors produced while running an external command.
///
/// `command` fields hold the command line as rendered by its
/// [`DisplayPolicy`](crate::DisplayPolicy), never the full argument list.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
	/// The executable could not be found.
	#[error("program not found in PATH: {program}")]
	NotFound { program: String },

	/// Spawning or waiting on the child failed.
	#[error("failed to run '{command}': {source}")]
	Io {
		command: String,
		#[source]
		source: std::io::Error,
	},

	/// The command exited unsuccessfully while success was enforced.
	#[error("command '{command}' returned non-zero exit status {} ({stderr})", describe_code(.code))]
	CommandFailed {
		command: String,
		code: Option<i32>,
		stderr: String,
	},

	/// The command did not finish within the allowed time and was killed.
	#[error("command '{command}' timed out after {timeout:?}")]
	TimedOut { command: String, timeout: Duration },

	/// The cancellation token fired before the command finished.
	#[error("command '{command}' was cancelled")]
	Cancelled { command: String },
}

impl ProcessError {
	/// Exit code of a failed command, if it exited normally.
	pub fn exit_code(&self) -> Option<i32> {
		match self {
			Self::CommandFailed { code, .. } => *code,
			_ => None,
		}
	}
}

fn describe_code(code: &Option<i32>) -> String {
	code.map_or_else(|| "terminated by signal".to_string(), |c| c.to_string())
}

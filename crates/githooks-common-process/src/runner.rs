// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::borrow::Cow;
use std::io::{self, Read};
use std::process::{Child, ExitStatus};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};
use wait_timeout::ChildExt;

use crate::command::CommandLine;
use crate::error::ProcessError;

/// How often a running child is checked against its deadline and
/// cancellation token.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long output readers get to finish after their child was killed.
/// A grandchild still holding a pipe open keeps its reader blocked; such a
/// reader is detached once this elapses.
const READER_GRACE: Duration = Duration::from_millis(500);

/// Result of a finished command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
	/// Exit code, or `None` when the child was terminated by a signal.
	pub exit_code: Option<i32>,
	pub stdout: Vec<u8>,
	pub stderr: Vec<u8>,
}

impl CommandOutput {
	pub fn success(&self) -> bool {
		self.exit_code == Some(0)
	}

	pub fn stdout_lossy(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.stdout)
	}

	pub fn stderr_lossy(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.stderr)
	}
}

/// Per-invocation options.
#[derive(Clone, Debug)]
pub struct RunOptions {
	/// Fail with [`ProcessError::CommandFailed`] on a non-zero exit.
	pub check: bool,
	/// Kill the child and fail with [`ProcessError::TimedOut`] after this long.
	/// `None` blocks until the child exits.
	pub timeout: Option<Duration>,
	/// Kill the child and fail with [`ProcessError::Cancelled`] once fired.
	pub cancel: Option<CancellationToken>,
}

impl Default for RunOptions {
	fn default() -> Self {
		Self {
			check: true,
			timeout: None,
			cancel: None,
		}
	}
}

impl RunOptions {
	/// Return the output regardless of exit status.
	pub fn unchecked(mut self) -> Self {
		self.check = false;
		self
	}

	pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
		self.cancel = Some(cancel);
		self
	}
}

/// Trait abstracting process execution for testability.
pub trait ProcessRunner: Send + Sync {
	/// Run `command` to completion, blocking the caller.
	fn run(&self, command: &CommandLine, options: &RunOptions) -> Result<CommandOutput, ProcessError>;
}

/// Runs commands as real child processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
	pub fn new() -> Self {
		Self
	}
}

impl ProcessRunner for SystemRunner {
	fn run(&self, command: &CommandLine, options: &RunOptions) -> Result<CommandOutput, ProcessError> {
		let rendered = command.rendered();

		if options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
			return Err(ProcessError::Cancelled { command: rendered });
		}

		trace!(
				cmd = %rendered,
				cwd = ?command.get_current_dir(),
				"running command"
		);

		let mut child = command.to_command().spawn().map_err(|e| {
			if e.kind() == io::ErrorKind::NotFound {
				warn!(program = %command.program(), "program not found in PATH");
				ProcessError::NotFound {
					program: command.program().to_string(),
				}
			} else {
				ProcessError::Io {
					command: rendered.clone(),
					source: e,
				}
			}
		})?;

		// Both pipes are drained concurrently so a child filling one of them
		// cannot block while we wait on the other.
		let stdout_reader = spawn_reader(child.stdout.take());
		let stderr_reader = spawn_reader(child.stderr.take());

		let status = match wait_for_exit(&mut child, options) {
			Ok(WaitOutcome::Exited(status)) => status,
			Ok(WaitOutcome::TimedOut(timeout)) => {
				kill_and_reap(&mut child);
				release_readers(&rendered, [stdout_reader, stderr_reader]);
				warn!(cmd = %rendered, ?timeout, "command timed out");
				return Err(ProcessError::TimedOut {
					command: rendered,
					timeout,
				});
			}
			Ok(WaitOutcome::Cancelled) => {
				kill_and_reap(&mut child);
				release_readers(&rendered, [stdout_reader, stderr_reader]);
				debug!(cmd = %rendered, "command cancelled");
				return Err(ProcessError::Cancelled { command: rendered });
			}
			Err(e) => {
				kill_and_reap(&mut child);
				release_readers(&rendered, [stdout_reader, stderr_reader]);
				return Err(ProcessError::Io {
					command: rendered,
					source: e,
				});
			}
		};

		let stdout = join_reader(stdout_reader).map_err(|e| ProcessError::Io {
			command: rendered.clone(),
			source: e,
		})?;
		let stderr = join_reader(stderr_reader).map_err(|e| ProcessError::Io {
			command: rendered.clone(),
			source: e,
		})?;

		let output = CommandOutput {
			exit_code: status.code(),
			stdout,
			stderr,
		};

		debug!(
				cmd = %rendered,
				exit_code = ?output.exit_code,
				stdout_len = output.stdout.len(),
				stderr_len = output.stderr.len(),
				"command finished"
		);

		if options.check && !status.success() {
			let stderr = output.stderr_lossy().trim().to_string();
			error!(
					cmd = %rendered,
					exit_code = ?output.exit_code,
					stderr = %stderr,
					"command returned non-zero exit status"
			);
			return Err(ProcessError::CommandFailed {
				command: rendered,
				code: output.exit_code,
				stderr,
			});
		}

		Ok(output)
	}
}

enum WaitOutcome {
	Exited(ExitStatus),
	TimedOut(Duration),
	Cancelled,
}

fn wait_for_exit(child: &mut Child, options: &RunOptions) -> io::Result<WaitOutcome> {
	if options.timeout.is_none() && options.cancel.is_none() {
		return child.wait().map(WaitOutcome::Exited);
	}

	let deadline = options.timeout.map(|t| (Instant::now() + t, t));

	loop {
		if options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
			return Ok(WaitOutcome::Cancelled);
		}

		let slice = match deadline {
			Some((at, timeout)) => {
				let now = Instant::now();
				if now >= at {
					return Ok(WaitOutcome::TimedOut(timeout));
				}
				(at - now).min(POLL_INTERVAL)
			}
			None => POLL_INTERVAL,
		};

		if let Some(status) = child.wait_timeout(slice)? {
			return Ok(WaitOutcome::Exited(status));
		}
	}
}

fn kill_and_reap(child: &mut Child) {
	let _ = child.kill();
	let _ = child.wait();
}

type ReaderHandle = JoinHandle<io::Result<Vec<u8>>>;

/// Joins the readers of a killed child, detaching any still blocked after
/// [`READER_GRACE`].
fn release_readers(command: &str, readers: [Option<ReaderHandle>; 2]) {
	let deadline = Instant::now() + READER_GRACE;
	for reader in readers.into_iter().flatten() {
		while !reader.is_finished() && Instant::now() < deadline {
			thread::sleep(Duration::from_millis(10));
		}
		if reader.is_finished() {
			let _ = reader.join();
		} else {
			debug!(cmd = %command, "output pipe still held open, detaching reader");
		}
	}
}

fn spawn_reader<R>(stream: Option<R>) -> Option<ReaderHandle>
where
	R: Read + Send + 'static,
{
	stream.map(|mut stream| {
		thread::spawn(move || -> io::Result<Vec<u8>> {
			let mut buffer = Vec::new();
			stream.read_to_end(&mut buffer)?;
			Ok(buffer)
		})
	})
}

fn join_reader(handle: Option<ReaderHandle>) -> io::Result<Vec<u8>> {
	match handle {
		Some(handle) => handle
			.join()
			.map_err(|_| io::Error::new(io::ErrorKind::Other, "output reader thread panicked"))?,
		None => Ok(Vec::new()),
	}
}

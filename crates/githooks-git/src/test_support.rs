// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Helpers shared by the unit tests: real throwaway repositories and a
//! scripted runner returning canned git output.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Mutex;

use githooks_common_process::{CommandLine, CommandOutput, ProcessError, ProcessRunner, RunOptions};

pub fn git(dir: &Path, args: &[&str]) -> String {
	let output = Command::new("git")
		.args(args)
		.current_dir(dir)
		.output()
		.expect("failed to spawn git");
	assert!(
		output.status.success(),
		"git {args:?} failed: {}",
		String::from_utf8_lossy(&output.stderr)
	);
	String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn init_git_repo(dir: &Path) {
	git(dir, &["init", "-q"]);
	git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
	git(dir, &["config", "user.email", "test@test.com"]);
	git(dir, &["config", "user.name", "Test"]);
	git(dir, &["config", "commit.gpgsign", "false"]);
	git(dir, &["config", "diff.renames", "true"]);
}

/// Writes `name`, commits it and returns the new commit hash.
pub fn commit_file(dir: &Path, name: &str, content: &str, message: &str) -> String {
	fs::write(dir.join(name), content).expect("write failed");
	git(dir, &["add", name]);
	git(dir, &["commit", "-q", "-m", message]);
	git(dir, &["rev-parse", "HEAD"])
}

pub fn remove_file(dir: &Path, name: &str) {
	fs::remove_file(dir.join(name)).expect("remove failed");
}

/// One record in the default `git log` format.
pub fn log_line(sha: &str, name: &str, email: &str, message: &str) -> String {
	format!("{sha}\x1f{name}\x1f{email}\x1fMon Jan 1 00:00:00 2024 +0000\x1f{message}\x1e\n")
}

/// One line in `git show --raw --no-abbrev` format.
pub fn raw_line(status: &str, path: &str) -> String {
	format!(
		":100755 100755 {} {} {status}\t{path}",
		"1".repeat(40),
		"2".repeat(40)
	)
}

enum Reply {
	Output(String),
	Failure { code: i32, stderr: String },
}

/// Runner that answers by git subcommand and records every invocation.
#[derive(Default)]
pub struct ScriptedRunner {
	replies: Vec<(String, Reply)>,
	commands: Mutex<Vec<CommandLine>>,
}

impl ScriptedRunner {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn on(mut self, subcommand: &str, stdout: &str) -> Self {
		self
			.replies
			.push((subcommand.to_string(), Reply::Output(stdout.to_string())));
		self
	}

	pub fn fail(mut self, subcommand: &str, code: i32, stderr: &str) -> Self {
		self.replies.push((
			subcommand.to_string(),
			Reply::Failure {
				code,
				stderr: stderr.to_string(),
			},
		));
		self
	}

	pub fn commands(&self) -> Vec<CommandLine> {
		self.commands.lock().unwrap().clone()
	}

	/// Arguments of every recorded invocation, program excluded.
	pub fn calls(&self) -> Vec<Vec<String>> {
		self
			.commands()
			.iter()
			.map(|c| c.get_args().to_vec())
			.collect()
	}
}

impl ProcessRunner for ScriptedRunner {
	fn run(&self, command: &CommandLine, options: &RunOptions) -> Result<CommandOutput, ProcessError> {
		self.commands.lock().unwrap().push(command.clone());

		let subcommand = command.get_args().first().cloned().unwrap_or_default();
		let reply = self
			.replies
			.iter()
			.find(|(name, _)| *name == subcommand)
			.map(|(_, reply)| reply);

		match reply {
			Some(Reply::Output(stdout)) => Ok(CommandOutput {
				exit_code: Some(0),
				stdout: stdout.clone().into_bytes(),
				stderr: Vec::new(),
			}),
			Some(Reply::Failure { code, stderr }) if options.check => Err(ProcessError::CommandFailed {
				command: command.rendered(),
				code: Some(*code),
				stderr: stderr.clone(),
			}),
			Some(Reply::Failure { code, stderr }) => Ok(CommandOutput {
				exit_code: Some(*code),
				stdout: Vec::new(),
				stderr: stderr.clone().into_bytes(),
			}),
			None => panic!("unexpected command: {}", command.rendered()),
		}
	}
}

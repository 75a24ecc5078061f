// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Structured command descriptors.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Default number of argv entries shown when a command is rendered.
pub const DEFAULT_MAX_DISPLAYED_ARGS: usize = 10;

/// Controls how a command line is rendered in log lines and error messages.
///
/// Ref exclusion lists can make `git log` invocations very long, so only the
/// first `max_args` argv entries (program included) are shown, followed by a
/// count of the omitted ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayPolicy {
	pub max_args: usize,
}

impl Default for DisplayPolicy {
	fn default() -> Self {
		Self {
			max_args: DEFAULT_MAX_DISPLAYED_ARGS,
		}
	}
}

impl DisplayPolicy {
	/// Render `argv` according to this policy.
	pub fn render<S: AsRef<str>>(&self, argv: &[S]) -> String {
		let shown = argv.len().min(self.max_args);
		let mut out = argv[..shown]
			.iter()
			.map(AsRef::as_ref)
			.collect::<Vec<_>>()
			.join(" ");

		let cut = argv.len() - shown;
		if cut > 0 {
			if !out.is_empty() {
				out.push(' ');
			}
			out.push_str(&format!("... (cut {cut})"));
		}
		out
	}
}

/// Environment handed to the child process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Environment {
	/// Inherit the caller's environment unmodified.
	#[default]
	Inherit,
	/// Inherit the caller's environment and set the given variables on top.
	Overlay(BTreeMap<OsString, OsString>),
	/// Start from an empty environment containing only the given variables.
	Replace(BTreeMap<OsString, OsString>),
}

impl Environment {
	/// Inherited environment plus the given overrides.
	pub fn overlay<K, V, I>(vars: I) -> Self
	where
		K: Into<OsString>,
		V: Into<OsString>,
		I: IntoIterator<Item = (K, V)>,
	{
		Self::Overlay(
			vars
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}

	/// Exactly the given variables and nothing else.
	pub fn replace<K, V, I>(vars: I) -> Self
	where
		K: Into<OsString>,
		V: Into<OsString>,
		I: IntoIterator<Item = (K, V)>,
	{
		Self::Replace(
			vars
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}

	fn apply(&self, cmd: &mut Command) {
		match self {
			Self::Inherit => {}
			Self::Overlay(vars) => {
				cmd.envs(vars);
			}
			Self::Replace(vars) => {
				cmd.env_clear();
				cmd.envs(vars);
			}
		}
	}
}

/// A command to run: program, arguments, working directory and environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLine {
	program: String,
	args: Vec<String>,
	current_dir: Option<PathBuf>,
	env: Environment,
	display: DisplayPolicy,
}

impl CommandLine {
	pub fn new(program: impl Into<String>) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
			current_dir: None,
			env: Environment::Inherit,
			display: DisplayPolicy::default(),
		}
	}

	pub fn arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(arg.into());
		self
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}

	/// Directory the child runs in. Defaults to the caller's working directory.
	pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.current_dir = Some(dir.into());
		self
	}

	pub fn env(mut self, env: Environment) -> Self {
		self.env = env;
		self
	}

	pub fn display_policy(mut self, display: DisplayPolicy) -> Self {
		self.display = display;
		self
	}

	pub fn program(&self) -> &str {
		&self.program
	}

	pub fn get_args(&self) -> &[String] {
		&self.args
	}

	pub fn get_current_dir(&self) -> Option<&Path> {
		self.current_dir.as_deref()
	}

	pub fn get_env(&self) -> &Environment {
		&self.env
	}

	/// The command line as shown in logs and errors.
	pub fn rendered(&self) -> String {
		let argv: Vec<&str> = std::iter::once(self.program.as_str())
			.chain(self.args.iter().map(String::as_str))
			.collect();
		self.display.render(&argv)
	}

	/// Build the [`Command`] to spawn. Stdin is closed, stdout and stderr are
	/// piped so they can be captured independently.
	pub(crate) fn to_command(&self) -> Command {
		let mut cmd = Command::new(&self.program);
		cmd.args(&self.args);
		if let Some(dir) = &self.current_dir {
			cmd.current_dir(dir);
		}
		self.env.apply(&mut cmd);
		cmd.stdin(Stdio::null());
		cmd.stdout(Stdio::piped());
		cmd.stderr(Stdio::piped());
		cmd
	}
}

impl fmt::Display for CommandLine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.rendered())
	}
}

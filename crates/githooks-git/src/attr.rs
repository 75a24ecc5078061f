// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Attribute lookup against a revision's tree.

use std::fmt;
use std::path::Path;

use githooks_common_process::{Environment, ProcessRunner};
use serde::{Serialize, Serializer};
use tracing::{debug, instrument};

use crate::client::CommandGitClient;
use crate::error::GitError;

/// Value of a git attribute as reported by `git check-attr`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
	Unspecified,
	Set,
	Unset,
	Value(String),
}

impl AttrValue {
	fn from_git(value: &str) -> Self {
		match value {
			"unspecified" => Self::Unspecified,
			"set" => Self::Set,
			"unset" => Self::Unset,
			other => Self::Value(other.to_string()),
		}
	}

	/// The textual form git uses for this value.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Unspecified => "unspecified",
			Self::Set => "set",
			Self::Unset => "unset",
			Self::Value(value) => value,
		}
	}

	pub fn is_specified(&self) -> bool {
		!matches!(self, Self::Unspecified)
	}
}

impl fmt::Display for AttrValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for AttrValue {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<R: ProcessRunner> CommandGitClient<R> {
	/// Looks up `attribute` for `filename` as of `revision`.
	///
	/// The tree of `revision` is read into a private temporary index, so the
	/// repository's own index is never touched. The temporary index is
	/// removed before returning, on success and on every error path.
	#[instrument(name = "git_check_attr", skip(self, repo), fields(repo = %repo.display()))]
	pub fn get_attribute(
		&self,
		repo: &Path,
		revision: &str,
		filename: &str,
		attribute: &str,
	) -> Result<AttrValue, GitError> {
		let mut builder = tempfile::Builder::new();
		builder.prefix("githooks-index-");
		let index_dir = match &self.options().temp_dir {
			Some(dir) => builder.tempdir_in(dir),
			None => builder.tempdir(),
		}
		.map_err(GitError::TempIndex)?;

		// The child runs inside the repository, so a relative temp_dir must not
		// reach git as a relative index path.
		let index_file =
			std::path::absolute(index_dir.path().join("index")).map_err(GitError::TempIndex)?;
		let env = Environment::overlay([("GIT_INDEX_FILE", index_file.into_os_string())]);

		let read_tree = self
			.git(repo)
			.args(["read-tree", revision])
			.env(env.clone());
		self.run_git(&read_tree)?;

		let check_attr = self
			.git(repo)
			.args(["check-attr", "-z", "--cached", attribute, "--", filename])
			.env(env);
		let output = self.run_git(&check_attr)?;

		let value = parse_check_attr(&output.stdout_lossy(), filename, attribute)?;
		debug!(filename, attribute, value = %value, "resolved git attribute");
		Ok(value)
	}
}

/// Parses one `<path> NUL <attribute> NUL <value> NUL` triple from
/// `check-attr -z`. Paths are printed verbatim, never C-quoted.
fn parse_check_attr(output: &str, filename: &str, attribute: &str) -> Result<AttrValue, GitError> {
	let mut fields = output.split('\0');
	match (fields.next(), fields.next(), fields.next()) {
		(Some(path), Some(name), Some(value)) if path == filename && name == attribute => {
			Ok(AttrValue::from_git(value))
		}
		_ => Err(GitError::AttributeLookupMismatch {
			path: filename.to_string(),
			attribute: attribute.to_string(),
			output: output.trim_end_matches('\0').replace('\0', ": "),
		}),
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::fmt;

use serde::Serialize;

/// One commit from a `git log` query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
	/// Full 40-character commit hash.
	pub commit: String,
	pub author_name: String,
	pub author_email: String,
	/// Author date exactly as git printed it.
	pub date: String,
	/// Commit subject line.
	pub message: String,
}

/// How a file changed in a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FileStatus {
	#[serde(rename = "M")]
	Modified,
	#[serde(rename = "A")]
	Added,
	#[serde(rename = "D")]
	Deleted,
}

impl FileStatus {
	/// Parse git's one-letter raw diff status.
	pub fn from_code(code: &str) -> Option<Self> {
		match code {
			"M" => Some(Self::Modified),
			"A" => Some(Self::Added),
			"D" => Some(Self::Deleted),
			_ => None,
		}
	}

	pub fn code(self) -> &'static str {
		match self {
			Self::Modified => "M",
			Self::Added => "A",
			Self::Deleted => "D",
		}
	}
}

impl fmt::Display for FileStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.code())
	}
}

/// One changed file from a `git show --raw` query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileChangeRecord {
	pub path: String,
	pub status: FileStatus,
	/// Blob before the change (all zeros for added files).
	pub old_object_id: String,
	/// Blob after the change (all zeros for deleted files).
	pub new_object_id: String,
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Git queries used by server-side hooks.
//!
//! [`CommandGitClient`] shells out to the git binary through a
//! [`ProcessRunner`](githooks_common_process::ProcessRunner) and turns its
//! output into [`CommitRecord`]s and [`FileChangeRecord`]s, and looks up
//! attributes of a file at a given revision without touching the
//! repository's own index.

pub mod attr;
pub mod client;
pub mod error;
pub mod format;
pub mod memo;
pub mod records;

#[cfg(test)]
mod test_support;

pub use attr::AttrValue;
pub use client::{CommandGitClient, GitClientOptions, LogQuery, RenamePolicy};
pub use error::GitError;
pub use format::{ExtensionFilter, LogFormat, ShowFormat};
pub use memo::MemoCache;
pub use records::{CommitRecord, FileChangeRecord, FileStatus};

/// Revision git reports for the "old" side of a newly created ref and the
/// "new" side of a deleted one.
pub const NULL_REVISION: &str = "0000000000000000000000000000000000000000";

/// Returns true for the all-zero revision.
pub fn is_null_revision(revision: &str) -> bool {
	revision == NULL_REVISION
}

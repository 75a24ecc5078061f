// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolved configuration and its conversions into client options.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use githooks_common_process::RunOptions;
use githooks_git::{GitClientOptions, RenamePolicy};
use githooks_smtp::SmtpConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Top-level configuration, as read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
	pub git: GitSection,
	pub smtp: SmtpConfig,
}

/// `[git]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSection {
	/// Git executable, looked up in PATH unless absolute.
	pub binary: String,
	/// Kill git invocations running longer than this. Unset waits forever.
	pub command_timeout_secs: Option<u64>,
	pub log_cache_capacity: usize,
	/// Report renames as a deletion plus an addition instead of skipping them.
	pub detect_renames: bool,
	/// Where temporary attribute indexes are created.
	pub temp_dir: Option<PathBuf>,
}

impl Default for GitSection {
	fn default() -> Self {
		Self {
			binary: "git".to_string(),
			command_timeout_secs: None,
			log_cache_capacity: githooks_git::memo::DEFAULT_CAPACITY,
			detect_renames: false,
			temp_dir: None,
		}
	}
}

impl HooksConfig {
	/// Checks values that deserialize fine but cannot be used.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.git.binary.trim().is_empty() {
			return Err(ConfigError::invalid_value("git.binary", "must not be empty"));
		}
		if self.git.log_cache_capacity == 0 {
			return Err(ConfigError::invalid_value(
				"git.log_cache_capacity",
				"must be at least 1",
			));
		}
		if self.git.command_timeout_secs == Some(0) {
			return Err(ConfigError::invalid_value(
				"git.command_timeout_secs",
				"must be at least 1",
			));
		}
		if self.smtp.host.trim().is_empty() {
			return Err(ConfigError::invalid_value("smtp.host", "must not be empty"));
		}
		if self.smtp.port == 0 {
			return Err(ConfigError::invalid_value("smtp.port", "must be non-zero"));
		}
		if self.smtp.timeout_secs == Some(0) {
			return Err(ConfigError::invalid_value(
				"smtp.timeout_secs",
				"must be at least 1",
			));
		}
		Ok(())
	}

	/// The SMTP settings, requiring a sender address.
	pub fn mail_config(&self) -> Result<&SmtpConfig, ConfigError> {
		if self.smtp.from_address.trim().is_empty() {
			return Err(ConfigError::missing_field("smtp.from_address"));
		}
		Ok(&self.smtp)
	}

	pub fn git_client_options(&self) -> Result<GitClientOptions, ConfigError> {
		let log_cache_capacity = NonZeroUsize::new(self.git.log_cache_capacity).ok_or_else(|| {
			ConfigError::invalid_value("git.log_cache_capacity", "must be at least 1")
		})?;
		let rename_policy = if self.git.detect_renames {
			RenamePolicy::DeleteAdd
		} else {
			RenamePolicy::Skip
		};

		Ok(GitClientOptions {
			git_binary: self.git.binary.clone(),
			rename_policy,
			run_options: RunOptions::default()
				.with_timeout(self.git.command_timeout_secs.map(Duration::from_secs)),
			log_cache_capacity,
			temp_dir: self.git.temp_dir.clone(),
			..GitClientOptions::default()
		})
	}
}

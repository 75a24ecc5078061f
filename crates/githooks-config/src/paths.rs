// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! XDG Base Directory compliant path resolution.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::ConfigError;

/// Location of the user config file below the config home.
pub const CONFIG_FILE: &str = "githooks/config.toml";

/// Resolve the user config file: `$XDG_CONFIG_HOME/githooks/config.toml`,
/// falling back to `~/.config/githooks/config.toml`.
pub fn user_config_file() -> Result<PathBuf, ConfigError> {
	resolve_config_file(std::env::var_os("XDG_CONFIG_HOME"), dirs::home_dir())
}

fn resolve_config_file(
	config_home: Option<OsString>,
	home: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
	let config_home = match config_home.filter(|dir| !dir.is_empty()) {
		Some(dir) => PathBuf::from(dir),
		None => home.ok_or(ConfigError::HomeDirNotFound)?.join(".config"),
	};

	let path = config_home.join(CONFIG_FILE);
	tracing::debug!(path = %path.display(), "resolved user config file");
	Ok(path)
}

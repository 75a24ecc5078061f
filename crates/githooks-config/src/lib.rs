// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the git hook helpers.
//!
//! Values are resolved in order, later sources winning:
//! - built-in defaults
//! - a TOML file, either given explicitly or found at
//!   `$XDG_CONFIG_HOME/githooks/config.toml`
//! - `GITHOOKS_*` environment variables
//!
//! ```toml
//! [git]
//! binary = "/usr/bin/git"
//! command_timeout_secs = 120
//! log_cache_capacity = 64
//! detect_renames = false
//!
//! [smtp]
//! host = "localhost"
//! port = 25
//! from_address = "git@example.com"
//! use_tls = false
//! timeout_secs = 60
//! ```

pub mod env;
pub mod error;
pub mod paths;
pub mod runtime;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

pub use error::ConfigError;
pub use runtime::{GitSection, HooksConfig};

/// Load configuration from all sources.
///
/// An explicit `path` must exist. Without one, the user config file is read
/// when present and defaults are used otherwise.
pub fn load_config(path: Option<&Path>) -> Result<HooksConfig, ConfigError> {
	let file = match path {
		Some(path) => Some(path.to_path_buf()),
		None => discover_user_config(),
	};

	let mut config = match &file {
		Some(file) => load_file(file)?,
		None => {
			debug!("no config file found, using defaults");
			HooksConfig::default()
		}
	};

	env::apply_env_overrides(&mut config)?;
	config.validate()?;
	Ok(config)
}

/// Parse one TOML file. Missing fields take their defaults.
pub fn load_file(path: &Path) -> Result<HooksConfig, ConfigError> {
	let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
		path: path.to_path_buf(),
		source,
	})?;
	let config = toml::from_str(&text).map_err(|source| ConfigError::TomlParse {
		path: path.to_path_buf(),
		source,
	})?;
	info!(path = %path.display(), "loaded config file");
	Ok(config)
}

fn discover_user_config() -> Option<PathBuf> {
	match paths::user_config_file() {
		Ok(path) if path.is_file() => Some(path),
		Ok(_) => None,
		Err(e) => {
			debug!(error = %e, "skipping user config file");
			None
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment variable overrides.

use std::str::FromStr;

use crate::{ConfigError, HooksConfig};

pub const GIT_BINARY: &str = "GITHOOKS_GIT_BINARY";
pub const GIT_TIMEOUT_SECS: &str = "GITHOOKS_GIT_TIMEOUT_SECS";
pub const LOG_CACHE_CAPACITY: &str = "GITHOOKS_LOG_CACHE_CAPACITY";
pub const SMTP_HOST: &str = "GITHOOKS_SMTP_HOST";
pub const SMTP_PORT: &str = "GITHOOKS_SMTP_PORT";
pub const SMTP_FROM_ADDRESS: &str = "GITHOOKS_SMTP_FROM_ADDRESS";
pub const SMTP_USE_TLS: &str = "GITHOOKS_SMTP_USE_TLS";
pub const SMTP_TIMEOUT_SECS: &str = "GITHOOKS_SMTP_TIMEOUT_SECS";

/// Applies overrides from the process environment.
pub fn apply_env_overrides(config: &mut HooksConfig) -> Result<(), ConfigError> {
	apply_overrides(config, |name| std::env::var(name).ok())
}

/// Applies overrides read through `lookup`. Unset and empty variables are
/// ignored.
pub fn apply_overrides<F>(config: &mut HooksConfig, lookup: F) -> Result<(), ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

	if let Some(value) = get(GIT_BINARY) {
		config.git.binary = value;
	}
	if let Some(value) = get(GIT_TIMEOUT_SECS) {
		config.git.command_timeout_secs = Some(parse(GIT_TIMEOUT_SECS, &value)?);
	}
	if let Some(value) = get(LOG_CACHE_CAPACITY) {
		config.git.log_cache_capacity = parse(LOG_CACHE_CAPACITY, &value)?;
	}
	if let Some(value) = get(SMTP_HOST) {
		config.smtp.host = value;
	}
	if let Some(value) = get(SMTP_PORT) {
		config.smtp.port = parse(SMTP_PORT, &value)?;
	}
	if let Some(value) = get(SMTP_FROM_ADDRESS) {
		config.smtp.from_address = value;
	}
	if let Some(value) = get(SMTP_USE_TLS) {
		config.smtp.use_tls = parse_bool(SMTP_USE_TLS, &value)?;
	}
	if let Some(value) = get(SMTP_TIMEOUT_SECS) {
		config.smtp.timeout_secs = Some(parse(SMTP_TIMEOUT_SECS, &value)?);
	}
	Ok(())
}

fn parse<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	value
		.trim()
		.parse()
		.map_err(|e| ConfigError::invalid_value(name, format!("{value:?}: {e}")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(ConfigError::invalid_value(
			name,
			format!("{value:?} is not a boolean"),
		)),
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod args;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use args::Args;

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	// Logs go to stderr; stdout carries the JSON results.
	let default_level = if args.verbose { "debug" } else { "info" };
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
		)
		.with_writer(std::io::stderr)
		.init();

	let config = githooks_config::load_config(args.config.as_deref())?;
	commands::run(args.command, &config)
}

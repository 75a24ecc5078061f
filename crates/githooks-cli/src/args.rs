// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Helpers for git server-side hooks.
#[derive(Parser, Debug)]
#[command(name = "githooks", version)]
pub struct Args {
	/// Config file (default: $XDG_CONFIG_HOME/githooks/config.toml)
	#[arg(long, global = true, env = "GITHOOKS_CONFIG")]
	pub config: Option<PathBuf>,

	/// Log at debug level unless RUST_LOG says otherwise
	#[arg(short, long, global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Print the commits a ref update introduces, as JSON
	Log {
		repo: PathBuf,
		/// Full ref name, e.g. refs/heads/main
		#[arg(value_name = "REF")]
		branch: String,
		old: String,
		new: String,
		/// Exclude commits already reachable from any other ref
		#[arg(long)]
		exclude_other_refs: bool,
	},

	/// Print the files a commit changes against its first parent, as JSON
	Show {
		repo: PathBuf,
		rev: String,
		/// Only report paths ending in this suffix (repeatable)
		#[arg(long = "ext", value_name = "SUFFIX")]
		extensions: Vec<String>,
	},

	/// Print every ref name in the repository, as JSON
	Refs { repo: PathBuf },

	/// Print the value of a git attribute for a path at a revision
	CheckAttr {
		repo: PathBuf,
		rev: String,
		path: String,
		attribute: String,
	},

	/// Send the same notification body to each recipient
	SendMail {
		#[arg(long)]
		subject: String,
		/// Recipient address (repeatable)
		#[arg(long = "to", value_name = "ADDRESS", required = true)]
		recipients: Vec<String>,
		/// File holding the plain-text body, `-` for stdin
		#[arg(long, value_name = "PATH")]
		body_file: PathBuf,
	},
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::Context;
use githooks_config::HooksConfig;
use githooks_git::{CommandGitClient, ExtensionFilter, LogQuery};
use githooks_smtp::{MailJob, Notifier};
use serde::Serialize;
use tracing::info;

use crate::args::Command;

pub fn run(command: Command, config: &HooksConfig) -> anyhow::Result<()> {
	let mut stdout = io::stdout().lock();
	match command {
		Command::Log {
			repo,
			branch,
			old,
			new,
			exclude_other_refs,
		} => {
			let client = CommandGitClient::new(config.git_client_options()?);
			let query = LogQuery::new(repo, branch, old, new).this_branch_only(!exclude_other_refs);
			let commits = client.parse_log(&query)?;
			print_json(&mut stdout, &*commits)
		}
		Command::Show {
			repo,
			rev,
			extensions,
		} => {
			let client = CommandGitClient::new(config.git_client_options()?);
			let filter = (!extensions.is_empty()).then(|| ExtensionFilter::new(extensions));
			let changes = client.parse_show(&repo, &rev, filter.as_ref())?;
			print_json(&mut stdout, &changes)
		}
		Command::Refs { repo } => {
			let client = CommandGitClient::new(config.git_client_options()?);
			print_json(&mut stdout, &client.list_refs(&repo)?)
		}
		Command::CheckAttr {
			repo,
			rev,
			path,
			attribute,
		} => {
			let client = CommandGitClient::new(config.git_client_options()?);
			let value = client.get_attribute(&repo, &rev, &path, &attribute)?;
			print_json(
				&mut stdout,
				&serde_json::json!({ "path": path, "attribute": attribute, "value": value }),
			)
		}
		Command::SendMail {
			subject,
			recipients,
			body_file,
		} => {
			let body = read_body(&body_file)?;
			let mut job = MailJob::new(subject);
			for recipient in recipients {
				job.add(recipient, body.as_str());
			}

			let notifier = Notifier::new(config.mail_config()?)?;
			let sent = notifier.send_mail(&job)?;
			info!(sent, "notifications sent");
			Ok(())
		}
	}
}

fn print_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> anyhow::Result<()> {
	serde_json::to_writer_pretty(&mut *out, value)?;
	writeln!(out)?;
	Ok(())
}

/// Reads the mail body, replacing invalid UTF-8.
fn read_body(path: &Path) -> anyhow::Result<String> {
	let mut bytes = Vec::new();
	if path == Path::new("-") {
		io::stdin()
			.read_to_end(&mut bytes)
			.context("failed to read body from stdin")?;
	} else {
		bytes = std::fs::read(path)
			.with_context(|| format!("failed to read body file {}", path.display()))?;
	}
	Ok(String::from_utf8_lossy(&bytes).into_owned())
}

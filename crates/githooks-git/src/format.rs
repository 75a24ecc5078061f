// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Output formats requested from git and the parsers for them.

use std::borrow::Cow;

use regex::Regex;
use tracing::{debug, error};

use crate::error::GitError;
use crate::records::{CommitRecord, FileChangeRecord, FileStatus};

/// Names of the `git log` fields, in the order they are requested.
pub const COMMIT_FIELDS: [&str; 5] = ["commit", "author_name", "author_email", "date", "message"];

/// Pattern matching one `git show --raw --no-abbrev` line, e.g.
/// `:100755 100755 7469841... 7399137... M	githooks.py`.
pub const DEFAULT_RAW_LINE_PATTERN: &str =
	r"^:\d{6}\s\d{6}\s(?P<old>[0-9a-f]{40})\s(?P<new>[0-9a-f]{40})\s(?P<status>[MAD])\s+(?P<path>.+)$";

/// The `git log --format` used to extract [`CommitRecord`]s.
///
/// Fields and records are delimited by non-printing control characters so
/// that any visible character in a commit subject is unambiguous.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFormat {
	pub field_separator: char,
	pub record_separator: char,
	/// Placeholder used for the `date` field. `%ad` honours `--date`/`log.date`.
	pub date_placeholder: String,
}

impl Default for LogFormat {
	fn default() -> Self {
		Self {
			field_separator: '\x1f',
			record_separator: '\x1e',
			date_placeholder: "%ad".to_string(),
		}
	}
}

impl LogFormat {
	/// The `--format=` argument for `git log`.
	pub fn format_arg(&self) -> String {
		let fs = hex_placeholder(self.field_separator);
		let placeholders = ["%H", "%an", "%ae", self.date_placeholder.as_str(), "%s"];
		format!(
			"--format={}{}",
			placeholders.join(&fs),
			hex_placeholder(self.record_separator)
		)
	}

	/// Parse `git log` output produced with [`format_arg`](Self::format_arg).
	///
	/// Empty output yields no records. A record whose field count differs from
	/// [`COMMIT_FIELDS`] fails the whole parse: a partial result would hide
	/// commits from the notification.
	pub fn parse(&self, output: &str) -> Result<Vec<CommitRecord>, GitError> {
		let rs = self.record_separator;
		let body = output.trim_matches(|c| c == '\n' || c == rs);
		if body.trim().is_empty() {
			return Ok(Vec::new());
		}

		body
			.split(rs)
			.enumerate()
			.map(|(index, row)| {
				let row = row.trim_matches(|c| c == '\n' || c == '\r');
				let fields: Vec<&str> = row.split(self.field_separator).collect();
				let [commit, author_name, author_email, date, message] = fields[..] else {
					return Err(GitError::parse(
						"log",
						format!(
							"record {index} has {} fields, expected {}: {row:?}",
							fields.len(),
							COMMIT_FIELDS.len()
						),
					));
				};
				Ok(CommitRecord {
					commit: commit.to_string(),
					author_name: author_name.to_string(),
					author_email: author_email.to_string(),
					date: date.to_string(),
					message: message.to_string(),
				})
			})
			.collect()
	}
}

fn hex_placeholder(c: char) -> String {
	format!("%x{:02x}", c as u32)
}

/// Parser for `git show --raw --no-abbrev` lines.
#[derive(Clone, Debug)]
pub struct ShowFormat {
	line_pattern: Regex,
}

impl Default for ShowFormat {
	fn default() -> Self {
		Self {
			line_pattern: Regex::new(DEFAULT_RAW_LINE_PATTERN).expect("default raw line pattern is valid"),
		}
	}
}

impl ShowFormat {
	/// Use a custom line pattern. It must define the named groups `old`, `new`,
	/// `status` and `path`.
	pub fn with_pattern(line_pattern: Regex) -> Result<Self, GitError> {
		let names: Vec<&str> = line_pattern.capture_names().flatten().collect();
		for required in ["old", "new", "status", "path"] {
			if !names.contains(&required) {
				return Err(GitError::InvalidArgument(format!(
					"raw line pattern is missing the '{required}' group"
				)));
			}
		}
		Ok(Self { line_pattern })
	}

	/// Parse a single raw diff line.
	pub fn parse_line(&self, line: &str) -> Option<FileChangeRecord> {
		let caps = self.line_pattern.captures(line)?;
		let status = FileStatus::from_code(caps.name("status")?.as_str())?;
		Some(FileChangeRecord {
			path: unquote_path(caps.name("path")?.as_str()).into_owned(),
			status,
			old_object_id: caps.name("old")?.as_str().to_string(),
			new_object_id: caps.name("new")?.as_str().to_string(),
		})
	}

	/// Parse every line of `git show` output, keeping paths accepted by
	/// `filter`. Lines that do not match are logged and skipped.
	pub fn parse(&self, output: &str, filter: Option<&ExtensionFilter>) -> Vec<FileChangeRecord> {
		let mut records = Vec::new();
		for line in output.lines() {
			if line.trim().is_empty() {
				continue;
			}
			let Some(record) = self.parse_line(line) else {
				error!(line = %line, "could not parse 'git show' output line");
				continue;
			};
			if filter.map_or(true, |f| f.matches(&record.path)) {
				debug!(path = %record.path, status = %record.status, "parsed changed file");
				records.push(record);
			}
		}
		records
	}
}

/// Undoes git's C-style path quoting, e.g. `"caf\303\251.py"` to `café.py`.
///
/// git quotes paths holding control characters, `"`, `\` or (with the
/// default `core.quotePath`) non-ASCII bytes. Unquoted paths are returned
/// as-is.
pub fn unquote_path(path: &str) -> Cow<'_, str> {
	let Some(inner) = path.strip_prefix('"').and_then(|p| p.strip_suffix('"')) else {
		return Cow::Borrowed(path);
	};

	let raw = inner.as_bytes();
	let mut bytes = Vec::with_capacity(raw.len());
	let mut i = 0;
	while i < raw.len() {
		if raw[i] != b'\\' || i + 1 == raw.len() {
			bytes.push(raw[i]);
			i += 1;
			continue;
		}
		let escape = raw[i + 1];
		let (byte, width) = match escape {
			b'a' => (0x07, 2),
			b'b' => (0x08, 2),
			b't' => (b'\t', 2),
			b'n' => (b'\n', 2),
			b'v' => (0x0b, 2),
			b'f' => (0x0c, 2),
			b'r' => (b'\r', 2),
			b'0'..=b'3' if is_octal_tail(&raw[i + 2..]) => (
				(escape - b'0') * 64 + (raw[i + 2] - b'0') * 8 + (raw[i + 3] - b'0'),
				4,
			),
			other => (other, 2),
		};
		bytes.push(byte);
		i += width;
	}

	Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
}

fn is_octal_tail(rest: &[u8]) -> bool {
	rest.len() >= 2 && rest[..2].iter().all(|b| (b'0'..=b'7').contains(b))
}

/// Allow-list of filename suffixes such as `.py` or `.txt`.
///
/// An empty filter matches nothing; pass no filter to keep every path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
	suffixes: Vec<String>,
}

impl ExtensionFilter {
	pub fn new<I, S>(suffixes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			suffixes: suffixes.into_iter().map(Into::into).collect(),
		}
	}

	pub fn matches(&self, path: &str) -> bool {
		self.suffixes.iter().any(|s| path.ends_with(s.as_str()))
	}

	pub fn suffixes(&self) -> &[String] {
		&self.suffixes
	}
}

impl<S: Into<String>> FromIterator<S> for ExtensionFilter {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self::new(iter)
	}
}

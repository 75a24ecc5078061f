// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Message assembly for notification mails.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use lettre::address::Envelope;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::Message;

use crate::error::SmtpError;

/// One notification batch: a shared subject and a body per recipient.
///
/// Recipients are kept ordered so delivery order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailJob {
	pub subject: String,
	pub recipients: BTreeMap<String, String>,
}

impl MailJob {
	pub fn new(subject: impl Into<String>) -> Self {
		Self {
			subject: subject.into(),
			recipients: BTreeMap::new(),
		}
	}

	/// Adds a recipient, replacing any body already queued for that address.
	pub fn add(&mut self, address: impl Into<String>, body: impl Into<String>) -> &mut Self {
		self.recipients.insert(address.into(), body.into());
		self
	}

	pub fn is_empty(&self) -> bool {
		self.recipients.is_empty()
	}

	pub fn len(&self) -> usize {
		self.recipients.len()
	}
}

/// Wraps plain text so mail clients render it preformatted.
pub fn wrap_html(text: &str) -> String {
	format!("<HTML><BODY><div><pre>{text}</pre></div></BODY></HTML>")
}

/// A fully formatted message ready for the relay.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
	pub recipient: String,
	pub envelope: Envelope,
	pub formatted: Vec<u8>,
}

/// Builds the message sent to one recipient.
///
/// The body is `multipart/related` holding a `multipart/alternative` with a
/// single `text/html; charset=utf-8` part. Each call stamps a `Date` in the
/// local timezone and a freshly generated `Message-ID`.
pub fn build_message(
	from: &Mailbox,
	to: &str,
	subject: &str,
	body: &str,
) -> Result<OutgoingMail, SmtpError> {
	let mailbox: Mailbox = to
		.parse()
		.map_err(|e| SmtpError::Address(format!("{to}: {e}")))?;

	let message = Message::builder()
		.from(from.clone())
		.to(mailbox)
		.subject(subject)
		.message_id(None)
		.multipart(
			MultiPart::related().multipart(
				MultiPart::alternative().singlepart(SinglePart::html(wrap_html(body))),
			),
		)
		.map_err(|e| SmtpError::Build(e.to_string()))?;

	Ok(OutgoingMail {
		recipient: to.to_string(),
		envelope: message.envelope().clone(),
		formatted: with_local_date(&message.formatted(), Local::now()),
	})
}

/// Replaces the top-level `Date` header, which lettre always writes in UTC.
fn with_local_date(formatted: &[u8], now: DateTime<Local>) -> Vec<u8> {
	let header_end = formatted
		.windows(4)
		.position(|w| w == b"\r\n\r\n")
		.map_or(formatted.len(), |i| i + 2);
	let (headers, body) = formatted.split_at(header_end);

	let mut out = Vec::with_capacity(formatted.len() + 40);
	out.extend_from_slice(format!("Date: {}\r\n", now.to_rfc2822()).as_bytes());
	for line in headers.split_inclusive(|b| *b == b'\n') {
		if !line.starts_with(b"Date:") {
			out.extend_from_slice(line);
		}
	}
	out.extend_from_slice(body);
	out
}

/// Parses the configured sender into a mailbox.
pub(crate) fn sender_mailbox(address: &str) -> Result<Mailbox, SmtpError> {
	if address.trim().is_empty() {
		return Err(SmtpError::Config("from_address is required".to_string()));
	}
	address
		.parse()
		.map_err(|e| SmtpError::Address(format!("{address}: {e}")))
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batch delivery.

use std::collections::BTreeMap;

use lettre::message::Mailbox;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::SmtpConfig;
use crate::error::SmtpError;
use crate::message::{build_message, sender_mailbox, MailJob, OutgoingMail};
use crate::transport::{RelayConnection, RelayConnector, SmtpRelay};

/// Sends [`MailJob`]s through a relay.
pub struct Notifier<C = SmtpRelay> {
	connector: C,
	from: Mailbox,
	cancel: Option<CancellationToken>,
}

impl Notifier<SmtpRelay> {
	pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
		Self::with_connector(SmtpRelay::new(config)?, &config.from_address)
	}
}

impl<C: RelayConnector> Notifier<C> {
	pub fn with_connector(connector: C, from_address: &str) -> Result<Self, SmtpError> {
		Ok(Self {
			connector,
			from: sender_mailbox(from_address)?,
			cancel: None,
		})
	}

	/// Stops a running batch before its next message once `token` fires.
	pub fn with_cancel(mut self, token: CancellationToken) -> Self {
		self.cancel = Some(token);
		self
	}

	/// Delivers one message per recipient over a single relay connection.
	///
	/// Every message is built before connecting, so an invalid address fails
	/// the batch without sending anything. An empty job opens no connection.
	/// The first delivery failure aborts the remaining sends. The connection
	/// is closed on every path once it has been opened.
	///
	/// Returns the number of messages delivered.
	#[instrument(skip(self, job), fields(subject = %job.subject, recipients = job.len()))]
	pub fn send_mail(&self, job: &MailJob) -> Result<usize, SmtpError> {
		if job.is_empty() {
			debug!("no recipients, skipping relay connection");
			return Ok(0);
		}

		let messages = job
			.recipients
			.iter()
			.map(|(to, body)| build_message(&self.from, to, &job.subject, body))
			.collect::<Result<Vec<OutgoingMail>, SmtpError>>()?;

		if !self.connector.is_encrypted() {
			warn!("delivering over plaintext SMTP without authentication");
		}

		let mut connection = OpenConnection(self.connector.connect()?);
		let mut sent = 0;
		for mail in &messages {
			if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
				warn!(sent, "mail batch cancelled");
				return Err(SmtpError::Cancelled { sent });
			}

			if let Err(reason) = connection.0.deliver(&mail.envelope, &mail.formatted) {
				error!(recipient = %mail.recipient, %reason, sent, "delivery failed, aborting batch");
				return Err(SmtpError::DeliveryFailed {
					recipient: mail.recipient.clone(),
					reason,
				});
			}
			debug!(recipient = %mail.recipient, "message delivered");
			sent += 1;
		}

		info!(sent, "mail batch delivered");
		Ok(sent)
	}
}

/// Closes the wrapped connection when dropped.
struct OpenConnection<T: RelayConnection>(T);

impl<T: RelayConnection> Drop for OpenConnection<T> {
	fn drop(&mut self) {
		self.0.close();
	}
}

/// Sends one message per entry in `recipients` through `host:port`.
///
/// Convenience wrapper over [`Notifier`] for callers without a config file.
pub fn send_mail(
	recipients: &BTreeMap<String, String>,
	from_address: &str,
	subject: &str,
	host: &str,
	port: u16,
) -> Result<usize, SmtpError> {
	let config = SmtpConfig {
		host: host.to_string(),
		port,
		from_address: from_address.to_string(),
		..SmtpConfig::default()
	};
	let job = MailJob {
		subject: subject.to_string(),
		recipients: recipients.clone(),
	};
	Notifier::new(&config)?.send_mail(&job)
}

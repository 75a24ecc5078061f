// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Relay connections.
//!
//! [`RelayConnector`] opens one connection per batch; [`RelayConnection`]
//! sends pre-formatted messages over it and closes it. [`SmtpRelay`] is the
//! lettre-backed implementation used outside of tests.

use std::time::Duration;

use lettre::address::Envelope;
use lettre::transport::smtp::client::{SmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use tracing::{debug, instrument};

use crate::config::SmtpConfig;
use crate::error::SmtpError;

/// An open session with a mail relay.
pub trait RelayConnection {
	/// Sends one formatted message to the recipients in `envelope`.
	///
	/// Returns the reason the relay gave on failure.
	fn deliver(&mut self, envelope: &Envelope, message: &[u8]) -> Result<(), String>;

	/// Ends the session. Best effort; failures are not reported.
	fn close(&mut self);
}

/// Opens relay sessions.
pub trait RelayConnector {
	type Connection: RelayConnection;

	fn connect(&self) -> Result<Self::Connection, SmtpError>;

	/// Whether sessions are encrypted.
	fn is_encrypted(&self) -> bool;
}

/// Plain SMTP relay, optionally upgraded with STARTTLS.
#[derive(Debug, Clone)]
pub struct SmtpRelay {
	host: String,
	port: u16,
	timeout: Option<Duration>,
	use_tls: bool,
}

impl SmtpRelay {
	pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
		if config.host.trim().is_empty() {
			return Err(SmtpError::Config("host is required".to_string()));
		}
		if config.port == 0 {
			return Err(SmtpError::Config("port must be non-zero".to_string()));
		}
		Ok(Self {
			host: config.host.clone(),
			port: config.port,
			timeout: config.timeout(),
			use_tls: config.use_tls,
		})
	}
}

impl RelayConnector for SmtpRelay {
	type Connection = SmtpConnection;

	#[instrument(skip(self), fields(host = %self.host, port = self.port, tls = self.use_tls))]
	fn connect(&self) -> Result<SmtpConnection, SmtpError> {
		let hello = ClientId::default();
		let mut connection = SmtpConnection::connect(
			(self.host.as_str(), self.port),
			self.timeout,
			&hello,
			None,
			None,
		)
		.map_err(|e| SmtpError::Connection(format!("{}:{}: {e}", self.host, self.port)))?;

		if self.use_tls {
			let upgrade = TlsParameters::new(self.host.clone())
				.and_then(|params| connection.starttls(&params, &hello));
			if let Err(e) = upgrade {
				connection.abort();
				return Err(SmtpError::Connection(format!("STARTTLS with {}: {e}", self.host)));
			}
		}

		debug!("connected to relay");
		Ok(connection)
	}

	fn is_encrypted(&self) -> bool {
		self.use_tls
	}
}

impl RelayConnection for SmtpConnection {
	fn deliver(&mut self, envelope: &Envelope, message: &[u8]) -> Result<(), String> {
		self.send(envelope, message).map(|_| ()).map_err(|e| e.to_string())
	}

	fn close(&mut self) {
		if let Err(e) = self.quit() {
			debug!(error = %e, "QUIT failed, aborting connection");
			self.abort();
		}
	}
}

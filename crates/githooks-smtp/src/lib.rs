// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SMTP delivery of git hook notifications.
//!
//! A [`MailJob`] maps each recipient to their own body text and shares one
//! subject line. [`Notifier::send_mail`] builds one HTML message per
//! recipient with [`lettre`] and delivers the whole batch over a single relay
//! connection, which is closed again whether or not every message went out.
//!
//! # Example
//!
//! ```no_run
//! use githooks_smtp::{MailJob, Notifier, SmtpConfig};
//!
//! # fn example() -> Result<(), githooks_smtp::SmtpError> {
//! let config = SmtpConfig {
//!     host: "localhost".to_string(),
//!     port: 25,
//!     from_address: "git@example.com".to_string(),
//!     use_tls: false,
//!     timeout_secs: Some(60),
//! };
//!
//! let mut job = MailJob::new("[repo] 2 new commits on main");
//! job.add("alice@example.com", "commit 1\ncommit 2");
//!
//! Notifier::new(&config)?.send_mail(&job)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! Delivery is plaintext and unauthenticated unless `use_tls` is set, in
//! which case the connection is upgraded with STARTTLS before any message is
//! sent. Plaintext batches are logged at `warn`.

pub mod config;
pub mod error;
pub mod message;
pub mod notifier;
pub mod transport;

pub use config::SmtpConfig;
pub use error::SmtpError;
pub use message::{build_message, wrap_html, MailJob, OutgoingMail};
pub use notifier::{send_mail, Notifier};
pub use transport::{RelayConnection, RelayConnector, SmtpRelay};

pub use tokio_util::sync::CancellationToken;

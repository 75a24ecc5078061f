// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Blocking process runner used by the git hook helpers.
//!
//! Every command is described by a [`CommandLine`], which carries the argument
//! list together with the policy used to render it in logs and errors. The
//! [`ProcessRunner`] trait is the seam the git layer depends on; the
//! [`SystemRunner`] implementation spawns real processes.
//!
//! Output is captured in full and only handed back once the child exits, so
//! this is suited to short, bounded-output commands such as `git log` or
//! `git show` on a pushed range.

pub mod command;
pub mod error;
pub mod runner;

pub use command::{CommandLine, DisplayPolicy, Environment};
pub use error::ProcessError;
pub use runner::{CommandOutput, ProcessRunner, RunOptions, SystemRunner};

pub use tokio_util::sync::CancellationToken;

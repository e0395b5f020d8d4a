// Copyright 2025 perf-gate Contributors
// SPDX-License-Identifier: Apache-2.0

//! The notification channel seam.
//!
//! A channel never lets a failure escape as a panic or a process exit: every
//! problem is reported as a [`ChannelError`] and the dispatcher decides what
//! to do next.

use async_trait::async_trait;
use perf_gate_core::MissingCredentials;
use thiserror::Error;

/// Why a single channel could not deliver a message.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Required credentials are absent or empty
    #[error(transparent)]
    NotConfigured(#[from] MissingCredentials),

    /// Connection, TLS, timeout or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote end answered but refused the message
    #[error("Rejected with HTTP {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The message could not be built (bad address, bad header)
    #[error("Invalid message: {0}")]
    Message(String),
}

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;

/// A delivery mechanism for alert messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// `Ok` iff every required credential is present.
    fn configured(&self) -> std::result::Result<(), MissingCredentials>;

    /// Deliver `message`. One attempt, no retries.
    async fn send(&self, message: &str) -> Result<()>;
}

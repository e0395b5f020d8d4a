// Copyright 2025 perf-gate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Alert dispatch for perf-gate.
//!
//! Messages go to an ordered list of channels, stopping at the first one
//! that delivers:
//!
//! - **Telegram**: Bot API `sendMessage` (primary)
//! - **Email**: SMTP over TLS (fallback)
//!
//! # Example
//!
//! ```ignore
//! use perf_gate_notify::prelude::*;
//!
//! let dispatcher = AlertDispatcher::from_config(&config)?;
//! let report = dispatcher.dispatch("FPS decreased from 100 to 90").await;
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod channel;
pub mod dispatcher;
pub mod email;
pub mod telegram;

use thiserror::Error;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::channel::{ChannelError, NotificationChannel};
    pub use super::dispatcher::{
        AlertDispatcher, AttemptOutcome, ChannelAttempt, DeliveryPolicy, DispatchReport,
    };
    pub use super::email::EmailChannel;
    pub use super::telegram::TelegramChannel;
    pub use super::NotifyError;
}

pub use channel::{ChannelError, NotificationChannel};
pub use dispatcher::{AlertDispatcher, DeliveryPolicy, DispatchReport};

/// Exit status when no channel delivered under the strict policy.
pub const EXIT_UNDELIVERED: u8 = 1;

/// Errors surfaced by the dispatcher as a whole.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Every channel was skipped or failed.
    #[error("All notification channels exhausted: {attempts}")]
    AllChannelsExhausted {
        /// Per-channel summary
        attempts: String,
    },

    /// A channel could not be constructed.
    #[error("Failed to set up notification channel: {0}")]
    Channel(#[from] ChannelError),
}

impl NotifyError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        EXIT_UNDELIVERED
    }
}

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

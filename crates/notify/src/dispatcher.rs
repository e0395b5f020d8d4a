// Copyright 2025 perf-gate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ordered alert dispatch with fallback.
//!
//! Channels are tried strictly one after another. An unconfigured channel is
//! skipped without any network I/O. The first successful delivery stops the
//! walk. The caller always gets a [`DispatchReport`]; whether an undelivered
//! report is an error is decided by the [`DeliveryPolicy`].

use crate::channel::NotificationChannel;
use crate::email::EmailChannel;
use crate::telegram::TelegramChannel;
use crate::{NotifyError, Result};
use perf_gate_core::GateConfig;
use std::fmt;
use tracing::{info, warn};

/// What to do when no channel delivered the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    /// Report [`NotifyError::AllChannelsExhausted`].
    #[default]
    Strict,
    /// Log the failure and return normally.
    FireAndForget,
}

impl DeliveryPolicy {
    /// Policy selected by the `notify_strict` setting.
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            Self::Strict
        } else {
            Self::FireAndForget
        }
    }
}

/// Outcome of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The channel accepted the message.
    Delivered,
    /// The channel was not configured; no I/O happened.
    Skipped(String),
    /// The channel was tried and failed.
    Failed(String),
}

/// Record of one channel in a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelAttempt {
    /// Channel name
    pub channel: &'static str,
    /// What happened
    pub outcome: AttemptOutcome,
}

impl fmt::Display for ChannelAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Delivered => write!(f, "{}: delivered", self.channel),
            AttemptOutcome::Skipped(reason) => write!(f, "{}: skipped ({})", self.channel, reason),
            AttemptOutcome::Failed(reason) => write!(f, "{}: failed ({})", self.channel, reason),
        }
    }
}

/// Aggregate result of a dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Channels in the order they were considered
    pub attempts: Vec<ChannelAttempt>,
    /// Channel that delivered the message, if any
    pub delivered_via: Option<&'static str>,
}

impl DispatchReport {
    /// Whether some channel delivered the message.
    pub fn is_delivered(&self) -> bool {
        self.delivered_via.is_some()
    }

    /// Channels that were skipped for missing configuration.
    pub fn skipped(&self) -> impl Iterator<Item = &ChannelAttempt> {
        self.attempts
            .iter()
            .filter(|a| matches!(a.outcome, AttemptOutcome::Skipped(_)))
    }

    /// Apply `policy` to this report.
    pub fn into_result(self, policy: DeliveryPolicy) -> Result<Self> {
        if self.is_delivered() || policy == DeliveryPolicy::FireAndForget {
            return Ok(self);
        }
        Err(NotifyError::AllChannelsExhausted {
            attempts: self
                .attempts
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        })
    }
}

/// Sends alert messages through an ordered list of channels.
///
/// # Example
///
/// ```no_run
/// use perf_gate_core::GateConfig;
/// use perf_gate_notify::AlertDispatcher;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = GateConfig::from_env()?;
/// let dispatcher = AlertDispatcher::from_config(&config)?;
/// let report = dispatcher.notify("FPS decreased from 100 to 90").await?;
/// println!("delivered via {:?}", report.delivered_via);
/// # Ok(())
/// # }
/// ```
pub struct AlertDispatcher {
    channels: Vec<Box<dyn NotificationChannel>>,
    policy: DeliveryPolicy,
}

impl AlertDispatcher {
    /// Create a dispatcher over `channels`, tried in the given order.
    pub fn new(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self {
            channels,
            policy: DeliveryPolicy::default(),
        }
    }

    /// Telegram first, email as fallback, policy from `notify_strict`.
    pub fn from_config(config: &GateConfig) -> Result<Self> {
        let channels: Vec<Box<dyn NotificationChannel>> = vec![
            Box::new(TelegramChannel::from_config(config)?),
            Box::new(EmailChannel::from_config(config)),
        ];
        Ok(Self::new(channels).with_policy(DeliveryPolicy::from_strict(config.notify_strict)))
    }

    /// Override the delivery policy.
    pub fn with_policy(mut self, policy: DeliveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Configured delivery policy.
    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// Names of the channels, in order.
    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Try every channel in order until one delivers `message`.
    pub async fn dispatch(&self, message: &str) -> DispatchReport {
        let mut report = DispatchReport::default();

        for channel in &self.channels {
            let name = channel.name();

            if let Err(missing) = channel.configured() {
                warn!(channel = name, reason = %missing, "Skipping unconfigured channel");
                report.attempts.push(ChannelAttempt {
                    channel: name,
                    outcome: AttemptOutcome::Skipped(missing.to_string()),
                });
                continue;
            }

            match channel.send(message).await {
                Ok(()) => {
                    info!(channel = name, "Notification delivered");
                    report.attempts.push(ChannelAttempt {
                        channel: name,
                        outcome: AttemptOutcome::Delivered,
                    });
                    report.delivered_via = Some(name);
                    break;
                }
                Err(e) => {
                    warn!(channel = name, error = %e, "Notification channel failed");
                    report.attempts.push(ChannelAttempt {
                        channel: name,
                        outcome: AttemptOutcome::Failed(e.to_string()),
                    });
                }
            }
        }

        if !report.is_delivered() {
            warn!(
                channels = report.attempts.len(),
                "All notification channels exhausted"
            );
        }

        report
    }

    /// Dispatch and apply the configured [`DeliveryPolicy`].
    pub async fn notify(&self, message: &str) -> Result<DispatchReport> {
        self.dispatch(message).await.into_result(self.policy)
    }
}

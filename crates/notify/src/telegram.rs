// Copyright 2025 perf-gate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Telegram Bot API channel.
//!
//! Posts a form-encoded `{chat_id, text}` payload to
//! `{api_url}/bot{token}/sendMessage`. Anything but a 2xx answer is a
//! failure. The bot token is part of the URL, so transport errors are
//! stripped of their URL before being reported.

use crate::channel::{ChannelError, NotificationChannel, Result};
use async_trait::async_trait;
use perf_gate_core::{GateConfig, MissingCredentials, TelegramCredentials};
use std::time::Duration;
use tracing::debug;

/// Chat-bot notification channel.
pub struct TelegramChannel {
    credentials: std::result::Result<TelegramCredentials, MissingCredentials>,
    client: reqwest::Client,
}

impl TelegramChannel {
    /// Create a channel with explicit credentials.
    pub fn new(credentials: TelegramCredentials, timeout: Duration) -> Result<Self> {
        Self::build(Ok(credentials), timeout)
    }

    /// Create a channel from process configuration.
    ///
    /// Missing credentials do not fail construction; the channel reports
    /// itself as unconfigured instead.
    pub fn from_config(config: &GateConfig) -> Result<Self> {
        Self::build(config.telegram(), config.notify_timeout())
    }

    fn build(
        credentials: std::result::Result<TelegramCredentials, MissingCredentials>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        Ok(Self {
            credentials,
            client,
        })
    }

    fn endpoint(credentials: &TelegramCredentials) -> String {
        format!(
            "{}/bot{}/sendMessage",
            credentials.api_url.trim_end_matches('/'),
            credentials.token
        )
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn configured(&self) -> std::result::Result<(), MissingCredentials> {
        self.credentials.as_ref().map(|_| ()).map_err(Clone::clone)
    }

    async fn send(&self, message: &str) -> Result<()> {
        let credentials = self.credentials.as_ref().map_err(|e| e.clone())?;

        let response = self
            .client
            .post(Self::endpoint(credentials))
            .form(&[("chat_id", credentials.chat_id.as_str()), ("text", message)])
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(chat_id = %credentials.chat_id, "Telegram message accepted");
        Ok(())
    }
}

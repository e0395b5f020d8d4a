// Copyright 2025 perf-gate Contributors
// SPDX-License-Identifier: Apache-2.0

//! SMTP email channel.
//!
//! Opens a TLS-secured session to the relay (implicit TLS on port 465,
//! STARTTLS on any other port), authenticates and sends one plain-text
//! message with a fixed subject.

use crate::channel::{ChannelError, NotificationChannel, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use perf_gate_core::{GateConfig, MissingCredentials, SmtpCredentials};
use std::time::Duration;
use tracing::debug;

/// Subject line of every alert email.
pub const EMAIL_SUBJECT: &str = "Pipeline notification";

/// Port on which the relay speaks TLS from the first byte.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Email notification channel.
pub struct EmailChannel {
    credentials: std::result::Result<SmtpCredentials, MissingCredentials>,
    timeout: Duration,
}

impl EmailChannel {
    /// Create a channel with explicit credentials.
    pub fn new(credentials: SmtpCredentials, timeout: Duration) -> Self {
        Self {
            credentials: Ok(credentials),
            timeout,
        }
    }

    /// Create a channel from process configuration.
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            credentials: config.smtp(),
            timeout: config.notify_timeout(),
        }
    }

    fn build_message(credentials: &SmtpCredentials, text: &str) -> Result<Message> {
        let from: Mailbox = credentials
            .from
            .parse()
            .map_err(|e| ChannelError::Message(format!("from address: {e}")))?;
        let to: Mailbox = credentials
            .to
            .parse()
            .map_err(|e| ChannelError::Message(format!("to address: {e}")))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(EMAIL_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(text.to_string())
            .map_err(|e| ChannelError::Message(e.to_string()))
    }

    fn transport(&self, credentials: &SmtpCredentials) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = if credentials.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&credentials.server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&credentials.server)
        }
        .map_err(|e| ChannelError::Transport(e.to_string()))?;

        Ok(builder
            .port(credentials.port)
            .credentials(Credentials::new(
                credentials.username.clone(),
                credentials.password.clone(),
            ))
            .timeout(Some(self.timeout))
            .build())
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    fn configured(&self) -> std::result::Result<(), MissingCredentials> {
        self.credentials.as_ref().map(|_| ()).map_err(Clone::clone)
    }

    async fn send(&self, message: &str) -> Result<()> {
        let credentials = self.credentials.as_ref().map_err(|e| e.clone())?;
        let email = Self::build_message(credentials, message)?;
        let transport = self.transport(credentials)?;

        transport
            .send(email)
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        debug!(server = %credentials.server, to = %credentials.to, "Email accepted by relay");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(port: u16) -> SmtpCredentials {
        SmtpCredentials {
            server: "127.0.0.1".to_string(),
            port,
            username: "bot".to_string(),
            password: "secret".to_string(),
            from: "ci@example.com".to_string(),
            to: "team@example.com".to_string(),
        }
    }

    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_message_has_fixed_subject() {
        let message = EmailChannel::build_message(&credentials(465), "FPS decreased").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Pipeline notification"));
        assert!(raw.contains("FPS decreased"));
    }

    #[test]
    fn test_invalid_address_is_message_error() {
        let mut creds = credentials(465);
        creds.to = "not an address".to_string();
        assert!(matches!(
            EmailChannel::build_message(&creds, "hi"),
            Err(ChannelError::Message(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_contained() {
        let channel = EmailChannel::new(credentials(closed_port()), Duration::from_secs(2));
        let err = channel.send("hello").await.unwrap_err();
        assert!(matches!(err, ChannelError::Transport(_)));
    }

    #[tokio::test]
    async fn test_unconfigured_channel_fails_without_connecting() {
        let channel = EmailChannel::from_config(&GateConfig::default());
        assert!(channel.configured().is_err());
        assert!(matches!(
            channel.send("hello").await,
            Err(ChannelError::NotConfigured(_))
        ));
    }
}

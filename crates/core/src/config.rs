// Copyright 2025 perf-gate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Process configuration.
//!
//! All settings arrive through environment variables (optionally seeded from
//! a `.env` file). They are read once at process start into a [`GateConfig`]
//! which is then passed by reference to the comparator and the dispatcher.
//!
//! # Example
//!
//! ```no_run
//! use perf_gate_core::config::GateConfig;
//!
//! let config = GateConfig::from_env()?;
//! if let Ok(telegram) = config.telegram() {
//!     println!("telegram chat {}", telegram.chat_id);
//! }
//! # Ok::<(), perf_gate_core::GateError>(())
//! ```

use crate::error::Result;
use serde::{Deserialize, Deserializer};
use std::ffi::OsString;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Default alert text when none is supplied.
pub const DEFAULT_NOTIFY_MESSAGE: &str = "Pipeline notification";

/// Default per-attempt network timeout.
pub const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;

/// Default SMTP port (implicit TLS).
pub const DEFAULT_SMTP_PORT: u16 = 465;

/// Default Telegram Bot API base URL.
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Recognised configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Bot token for the chat-bot channel
    TelegramToken,
    /// Destination chat for the chat-bot channel
    TelegramChatId,
    /// Bot API base URL
    TelegramApiUrl,
    /// SMTP relay host
    SmtpServer,
    /// SMTP relay port
    SmtpPort,
    /// SMTP login
    SmtpUsername,
    /// SMTP password
    SmtpPassword,
    /// Sender address
    FromEmail,
    /// Recipient address
    ToEmail,
    /// Alert text
    NotifyMessage,
    /// Per-attempt network timeout in seconds
    NotifyTimeoutSecs,
    /// Fail the process when every channel is exhausted
    NotifyStrict,
    /// Treat a zero baseline as "no baseline yet"
    LenientZeroBaseline,
}

impl ConfigKey {
    /// Every recognised key, in documentation order.
    pub const ALL: [ConfigKey; 13] = [
        ConfigKey::TelegramToken,
        ConfigKey::TelegramChatId,
        ConfigKey::TelegramApiUrl,
        ConfigKey::SmtpServer,
        ConfigKey::SmtpPort,
        ConfigKey::SmtpUsername,
        ConfigKey::SmtpPassword,
        ConfigKey::FromEmail,
        ConfigKey::ToEmail,
        ConfigKey::NotifyMessage,
        ConfigKey::NotifyTimeoutSecs,
        ConfigKey::NotifyStrict,
        ConfigKey::LenientZeroBaseline,
    ];

    /// Field name inside [`GateConfig`].
    pub fn key(&self) -> &'static str {
        match self {
            Self::TelegramToken => "telegram_token",
            Self::TelegramChatId => "telegram_chat_id",
            Self::TelegramApiUrl => "telegram_api_url",
            Self::SmtpServer => "smtp_server",
            Self::SmtpPort => "smtp_port",
            Self::SmtpUsername => "smtp_username",
            Self::SmtpPassword => "smtp_password",
            Self::FromEmail => "from_email",
            Self::ToEmail => "to_email",
            Self::NotifyMessage => "notify_message",
            Self::NotifyTimeoutSecs => "notify_timeout_secs",
            Self::NotifyStrict => "notify_strict",
            Self::LenientZeroBaseline => "lenient_zero_baseline",
        }
    }

    /// Environment variable carrying this key.
    pub fn env_var(&self) -> String {
        self.key().to_uppercase()
    }

    /// Key carried by the environment variable `name`, if recognised.
    pub fn from_env_var(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.env_var() == name)
    }

    /// Whether the value must never be printed.
    pub fn is_secret(&self) -> bool {
        matches!(self, Self::TelegramToken | Self::SmtpPassword)
    }
}

/// A channel is missing one or more required settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{channel} channel not configured, missing {}", fields.join(", "))]
pub struct MissingCredentials {
    /// Channel name
    pub channel: &'static str,
    /// Environment variables that are absent, empty or invalid
    pub fields: Vec<String>,
}

/// Credentials for the chat-bot channel.
#[derive(Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    /// Bot token
    pub token: String,
    /// Destination chat id
    pub chat_id: String,
    /// Bot API base URL
    pub api_url: String,
}

impl fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Credentials for the email channel.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpCredentials {
    /// Mail relay host
    pub server: String,
    /// Mail relay port
    pub port: u16,
    /// Login
    pub username: String,
    /// Password
    pub password: String,
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
}

impl fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// Configuration read once at process start.
#[derive(Clone, Deserialize)]
pub struct GateConfig {
    /// Bot token
    #[serde(default)]
    pub telegram_token: Option<String>,
    /// Chat the bot posts to
    #[serde(default)]
    pub telegram_chat_id: Option<String>,
    /// Bot API base URL override
    #[serde(default)]
    pub telegram_api_url: Option<String>,
    /// Mail relay host
    #[serde(default)]
    pub smtp_server: Option<String>,
    /// Kept as text so that a malformed port only disables the email channel.
    #[serde(default)]
    pub smtp_port: Option<String>,
    /// Mail relay login
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// Mail relay password
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// Sender address
    #[serde(default)]
    pub from_email: Option<String>,
    /// Recipient address
    #[serde(default)]
    pub to_email: Option<String>,
    /// Alert text used when none is passed explicitly
    #[serde(default = "default_notify_message")]
    pub notify_message: String,
    /// Per-attempt network timeout in seconds
    #[serde(
        default = "default_notify_timeout_secs",
        deserialize_with = "lenient_timeout_secs"
    )]
    pub notify_timeout_secs: u64,
    /// Fail when every channel is exhausted
    #[serde(default = "default_true", deserialize_with = "lenient_flag")]
    pub notify_strict: bool,
    /// Treat a zero baseline as "no baseline yet"
    #[serde(default = "default_true", deserialize_with = "lenient_flag")]
    pub lenient_zero_baseline: bool,
}

// Scalar settings never abort a run: a value that does not parse falls back
// to the default with a warning.

fn lenient_timeout_secs<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().parse().unwrap_or_else(|_| {
        warn!(
            value = %raw,
            default = DEFAULT_NOTIFY_TIMEOUT_SECS,
            "Ignoring invalid NOTIFY_TIMEOUT_SECS"
        );
        DEFAULT_NOTIFY_TIMEOUT_SECS
    }))
}

fn lenient_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            warn!(value = %raw, "Ignoring invalid boolean setting, using true");
            default_true()
        }
    })
}

fn default_notify_message() -> String {
    DEFAULT_NOTIFY_MESSAGE.to_string()
}

fn default_notify_timeout_secs() -> u64 {
    DEFAULT_NOTIFY_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            telegram_token: None,
            telegram_chat_id: None,
            telegram_api_url: None,
            smtp_server: None,
            smtp_port: None,
            smtp_username: None,
            smtp_password: None,
            from_email: None,
            to_email: None,
            notify_message: default_notify_message(),
            notify_timeout_secs: default_notify_timeout_secs(),
            notify_strict: true,
            lenient_zero_baseline: true,
        }
    }
}

impl fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("GateConfig")
            .field("telegram_token", &redact(&self.telegram_token))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &redact(&self.smtp_password))
            .field("from_email", &self.from_email)
            .field("to_email", &self.to_email)
            .field("notify_message", &self.notify_message)
            .field("notify_timeout_secs", &self.notify_timeout_secs)
            .field("notify_strict", &self.notify_strict)
            .field("lenient_zero_baseline", &self.lenient_zero_baseline)
            .finish()
    }
}

impl GateConfig {
    /// Load from the process environment, after applying `.env` if present.
    ///
    /// Only the recognised variables are read. Unrelated variables are never
    /// looked at, whatever their encoding.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(crate::GateError::Config(e.to_string())),
        }
        Self::from_os_vars(ConfigKey::ALL.into_iter().filter_map(|key| {
            let name = key.env_var();
            std::env::var_os(&name).map(|value| (OsString::from(name), value))
        }))
    }

    /// Load from an explicit variable map instead of the process environment.
    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_os_vars(
            vars.into_iter()
                .map(|(k, v)| (OsString::from(k.into()), OsString::from(v.into()))),
        )
    }

    /// Load from raw variables as the operating system hands them out.
    ///
    /// Unrecognised names are dropped. A recognised variable whose value is
    /// not valid UTF-8 is treated as unset.
    pub fn from_os_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Result<Self> {
        let mut map = config::Map::new();
        for (name, value) in vars {
            let Some(key) = name.to_str().and_then(ConfigKey::from_env_var) else {
                continue;
            };
            match value.into_string() {
                Ok(value) => {
                    map.insert(key.env_var(), value);
                }
                Err(_) => warn!(variable = %key.env_var(), "Ignoring non UTF-8 value"),
            }
        }
        Self::load(config::Environment::default().source(Some(map)))
    }

    fn load(source: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize::<GateConfig>()?;
        Ok(config)
    }

    /// Chat-bot credentials, if every required field is set.
    pub fn telegram(&self) -> std::result::Result<TelegramCredentials, MissingCredentials> {
        let mut missing = Vec::new();
        let token = require(&self.telegram_token, ConfigKey::TelegramToken, &mut missing);
        let chat_id = require(&self.telegram_chat_id, ConfigKey::TelegramChatId, &mut missing);

        match (token, chat_id) {
            (Some(token), Some(chat_id)) => Ok(TelegramCredentials {
                token,
                chat_id,
                api_url: non_empty(&self.telegram_api_url)
                    .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            }),
            _ => Err(MissingCredentials {
                channel: "telegram",
                fields: missing,
            }),
        }
    }

    /// Email credentials, if every required field is set.
    pub fn smtp(&self) -> std::result::Result<SmtpCredentials, MissingCredentials> {
        let mut missing = Vec::new();
        let server = require(&self.smtp_server, ConfigKey::SmtpServer, &mut missing);
        let username = require(&self.smtp_username, ConfigKey::SmtpUsername, &mut missing);
        let password = require(&self.smtp_password, ConfigKey::SmtpPassword, &mut missing);
        let from = require(&self.from_email, ConfigKey::FromEmail, &mut missing);
        let to = require(&self.to_email, ConfigKey::ToEmail, &mut missing);

        let port = match non_empty(&self.smtp_port) {
            None => Some(DEFAULT_SMTP_PORT),
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) if port != 0 => Some(port),
                _ => {
                    missing.push(ConfigKey::SmtpPort.env_var());
                    None
                }
            },
        };

        match (server, port, username, password, from, to) {
            (Some(server), Some(port), Some(username), Some(password), Some(from), Some(to)) => {
                Ok(SmtpCredentials {
                    server,
                    port,
                    username,
                    password,
                    from,
                    to,
                })
            }
            _ => Err(MissingCredentials {
                channel: "email",
                fields: missing,
            }),
        }
    }

    /// Per-attempt network timeout.
    pub fn notify_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.notify_timeout_secs.max(1))
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

fn require(value: &Option<String>, key: ConfigKey, missing: &mut Vec<String>) -> Option<String> {
    let value = non_empty(value);
    if value.is_none() {
        missing.push(key.env_var());
    }
    value
}

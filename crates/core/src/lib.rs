// Copyright 2025 perf-gate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types shared by every perf-gate crate.
//!
//! - [`error`] - The [`GateError`] taxonomy and exit status mapping
//! - [`config`] - [`GateConfig`], read once from the environment

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;

pub use config::{GateConfig, MissingCredentials, SmtpCredentials, TelegramCredentials};
pub use error::{GateError, Result};

//! CLI for perf-gate.
//!
//! This crate provides the `perf-gate` command-line interface. Every
//! subcommand takes positional arguments only:
//!
//! - `parse LOG OUTPUT` - extract the mean FPS from a benchmark log
//! - `compare NEW BASELINE OUTPUT THRESHOLD` - gate on the baseline
//! - `notify [MESSAGE]` - send an alert, Telegram first, email as fallback
//! - `status` - show which notification channels are configured

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use perf_gate_benchmarks::{BaselineRule, RegressionGate, Threshold};
use perf_gate_core::config::ConfigKey;
use perf_gate_core::error::{EXIT_ABORTED, EXIT_REGRESSION};
use perf_gate_core::{GateConfig, GateError};
use perf_gate_notify::{AlertDispatcher, NotifyError};
use std::fmt::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log format (`json` or text).
pub const LOG_FORMAT_ENV: &str = "PERF_GATE_LOG_FORMAT";

/// Exit status for success.
pub const EXIT_OK: u8 = 0;

/// perf-gate CLI.
#[derive(Parser, Debug)]
#[command(name = "perf-gate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the mean FPS from a benchmark log and write it as JSON.
    ///
    /// Fails without writing OUTPUT when no line matches
    /// `<n> candles: <fps> FPS`.
    Parse {
        /// Benchmark log to scan.
        log: PathBuf,
        /// Result file to write.
        output: PathBuf,
    },

    /// Compare a new result with the baseline.
    ///
    /// Exits 0 on pass or when the baseline was just created, 1 on
    /// regression, 2 when the run could not be judged.
    Compare {
        /// New result produced by `parse`.
        new: PathBuf,
        /// Baseline result, created from NEW if absent.
        baseline: PathBuf,
        /// Where a copy of the new result is written.
        output: PathBuf,
        /// Tolerated drop in percent.
        threshold: f64,
    },

    /// Send an alert through Telegram, falling back to email.
    Notify {
        /// Alert text; defaults to NOTIFY_MESSAGE.
        message: Option<String>,
    },

    /// Show version and notification channel configuration.
    Status,
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr so that stdout carries only command output. The filter
/// comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Parse arguments, load configuration and run the selected command.
///
/// # Returns
///
/// The process exit status on a judged run, or an error for aborted runs.
pub async fn run() -> anyhow::Result<u8> {
    let cli = Cli::parse();
    let config = GateConfig::from_env().context("failed to load configuration")?;
    execute(cli.command, &config).await
}

/// Run one command against an already-loaded configuration.
pub async fn execute(command: Commands, config: &GateConfig) -> anyhow::Result<u8> {
    match command {
        Commands::Parse { log, output } => {
            let result = perf_gate_benchmarks::parse_log_to_result(&log, &output)?;
            info!(fps = result.fps, output = %output.display(), "Benchmark result written");
            Ok(EXIT_OK)
        }

        Commands::Compare {
            new,
            baseline,
            output,
            threshold,
        } => {
            let gate = RegressionGate::new(Threshold::new(threshold)?)
                .with_rule(BaselineRule::from_lenient(config.lenient_zero_baseline));
            let outcome = gate.run(&new, &baseline, &output)?;

            println!("{}", outcome.summary());
            Ok(if outcome.passed {
                EXIT_OK
            } else {
                EXIT_REGRESSION
            })
        }

        Commands::Notify { message } => {
            let message = message.unwrap_or_else(|| config.notify_message.clone());
            let dispatcher = AlertDispatcher::from_config(config)?;
            let report = dispatcher.notify(&message).await?;

            match report.delivered_via {
                Some(channel) => println!("Notification sent via {}", channel),
                None => println!("Notification not delivered"),
            }
            Ok(EXIT_OK)
        }

        Commands::Status => {
            print!("{}", status_report(config));
            Ok(EXIT_OK)
        }
    }
}

/// Map an error from [`run`] to a process exit status.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<GateError>() {
        return e.exit_code();
    }
    if let Some(e) = err.downcast_ref::<NotifyError>() {
        return e.exit_code();
    }
    EXIT_ABORTED
}

/// Human-readable configuration summary. Secret values are never printed.
pub fn status_report(config: &GateConfig) -> String {
    let mut output = String::new();

    writeln!(output, "perf-gate {}", env!("CARGO_PKG_VERSION")).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Notification channels (in order):").unwrap();
    let telegram = match config.telegram() {
        Ok(creds) => format!("configured (chat {})", creds.chat_id),
        Err(missing) => missing.to_string(),
    };
    let email = match config.smtp() {
        Ok(creds) => format!("configured ({}:{} -> {})", creds.server, creds.port, creds.to),
        Err(missing) => missing.to_string(),
    };
    writeln!(output, "  - telegram: {}", telegram).unwrap();
    writeln!(output, "  - email: {}", email).unwrap();

    writeln!(output).unwrap();
    writeln!(output, "Policies:").unwrap();
    writeln!(
        output,
        "  - delivery: {}",
        if config.notify_strict {
            "strict"
        } else {
            "fire-and-forget"
        }
    )
    .unwrap();
    writeln!(
        output,
        "  - zero baseline: {}",
        if config.lenient_zero_baseline {
            "lenient"
        } else {
            "strict"
        }
    )
    .unwrap();
    writeln!(output, "  - network timeout: {}s", config.notify_timeout().as_secs()).unwrap();

    writeln!(output).unwrap();
    writeln!(output, "Recognised environment variables:").unwrap();
    for key in ConfigKey::ALL {
        let note = if key.is_secret() { " (secret)" } else { "" };
        writeln!(output, "  - {}{}", key.env_var(), note).unwrap();
    }

    output
}

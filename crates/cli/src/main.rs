//! perf-gate CLI entry point.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    perf_gate_cli::init_tracing();

    match perf_gate_cli::run().await {
        Ok(status) => ExitCode::from(status),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(perf_gate_cli::exit_code(&e))
        }
    }
}

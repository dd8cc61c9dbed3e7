//! modgenie - guarded discovery, editing and test deployment of infrastructure modules

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use modgenie_cli::cli::Cli;
use modgenie_cli::output::OutputContext;
use modgenie_cli::output::json::format_anyhow;

/// Environment variable read before `RUST_LOG`.
const LOG_ENV: &str = "MODGENIE_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let flags = cli.output_flags();
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            if flags.json {
                match format_anyhow(&e) {
                    Ok(text) => println!("{text}"),
                    Err(_) => eprintln!("Error: {e:#}"),
                }
            } else {
                OutputContext::new(flags.no_color, flags.quiet).error(&format!("{e:#}"));
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

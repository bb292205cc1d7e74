// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # fleetcheck
//!
//! The `fleetcheck` binary runs both halves of a fleet check deployment.
//!
//! ## Commands
//!
//! - `fleetcheck serve` - Run the dispatcher HTTP API
//! - `fleetcheck agent` - Run an agent node on this machine
//! - `fleetcheck submit <FILE>` - Send a batch of checks to a running dispatcher
//! - `fleetcheck config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use fleetcheck::commands::{self, ConfigCommand, SubmitCommand};
use fleetcheck::server;

const DEFAULT_DISPATCHER_PORT: u16 = 8000;
const DEFAULT_AGENT_PORT: u16 = 9000;

/// Fleet check dispatcher - evaluate checks across a fleet of agent nodes
#[derive(Parser)]
#[command(name = "fleetcheck")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery, which also honours
    /// $FLEETCHECK_CONFIG_PATH when that file exists)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host to bind (serve, agent) or to contact (submit)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Port to bind (serve, agent) or to contact (submit)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "FLEETCHECK_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, env = "FLEETCHECK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dispatcher
    #[command(name = "serve")]
    Serve,

    /// Run an agent node (port falls back to $PORT, then 9000)
    #[command(name = "agent")]
    Agent,

    /// Submit a batch of checks to a running dispatcher
    #[command(name = "submit")]
    Submit(SubmitCommand),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.log_format)?;

    match cli.command {
        Some(Commands::Serve) => {
            info!("Starting fleetcheck dispatcher");
            server::start_dispatcher(cli.config, cli.host, cli.port).await
        }
        Some(Commands::Agent) => {
            let port = match cli.port {
                Some(port) => port,
                None => agent_port_from_env()?,
            };
            let host = cli.host.as_deref().unwrap_or("0.0.0.0");
            info!("Starting fleetcheck agent node");
            server::start_agent(host, port).await
        }
        Some(Commands::Submit(command)) => {
            let host = cli.host.as_deref().unwrap_or("127.0.0.1");
            let port = cli.port.unwrap_or(DEFAULT_DISPATCHER_PORT);
            commands::submit::handle_command(command, host, port).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

fn agent_port_from_env() -> Result<u16> {
    match std::env::var("PORT") {
        Ok(value) => value
            .parse()
            .with_context(|| format!("Invalid PORT value: {}", value)),
        Err(_) => Ok(DEFAULT_AGENT_PORT),
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Text => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_env_path_is_left_to_discovery() {
        std::env::set_var("FLEETCHECK_CONFIG_PATH", "/nonexistent/fleetcheck-config.yaml");
        let cli = Cli::try_parse_from(["fleetcheck", "serve"]).unwrap();
        std::env::remove_var("FLEETCHECK_CONFIG_PATH");

        assert!(cli.config.is_none());
        assert!(matches!(cli.command, Some(Commands::Serve)));
    }

    #[test]
    fn test_explicit_config_flag() {
        let cli = Cli::try_parse_from(["fleetcheck", "config", "validate", "--config", "fleet.yaml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("fleet.yaml")));
    }
}

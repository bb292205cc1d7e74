// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Submit a batch of checks to a running dispatcher

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use fleetcheck_core::application::CheckBatch;
use fleetcheck_core::domain::check::OutcomeCategory;
use fleetcheck_core::domain::report::{BatchResponse, CheckReport};

use crate::client::DispatcherClient;

#[derive(Args)]
pub struct SubmitCommand {
    /// JSON file mapping check IDs to checks
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print the raw JSON response instead of a summary
    #[arg(long)]
    pub json: bool,
}

pub async fn handle_command(command: SubmitCommand, host: &str, port: u16) -> Result<()> {
    let batch = read_batch(&command.file)?;
    let client = DispatcherClient::new(host, port)?;

    let response = client.submit_batch(&batch).await?;

    if command.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_summary(&response);
    }

    Ok(())
}

fn read_batch(path: &Path) -> Result<CheckBatch> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid batch file: {:?}", path))
}

fn print_summary(response: &BatchResponse) {
    let mut ids: Vec<_> = response.keys().collect();
    ids.sort();

    for id in ids {
        let report = &response[id];
        if report.malformed {
            println!("{} {}: {}", "✗".red(), id.as_str().bold(), report.error_message.red());
            continue;
        }

        println!("{} {}", "●".cyan(), id.as_str().bold());
        for category in OutcomeCategory::ALL {
            let nodes = report.nodes(category);
            if nodes.is_empty() {
                continue;
            }
            println!("    {:<12} {}", paint(category), nodes.join(", "));
        }
    }

    let malformed = response.values().filter(|r| r.malformed).count();
    println!();
    println!(
        "{} checks, {} malformed, {} node results",
        response.len(),
        malformed,
        response.values().map(CheckReport::total_nodes).sum::<usize>()
    );
}

fn paint(category: OutcomeCategory) -> colored::ColoredString {
    let label = category.as_str();
    match category {
        OutcomeCategory::Passed => label.green(),
        OutcomeCategory::Failed => label.red(),
        OutcomeCategory::Errored => label.yellow(),
        OutcomeCategory::Unreachable => label.dimmed(),
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Check Probes
//!
//! The evaluations an agent node runs on its own host. Matching is plain
//! substring containment: file contents are searched as raw bytes and the
//! process list as the text printed by `ps`, with no encoding or line semantics.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Filesystem and process-table access for the agent service

use std::path::Path;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Error getting process list: {0}")]
    ProcessList(#[from] std::io::Error),

    #[error("Process listing exited with {0}")]
    ProcessListStatus(std::process::ExitStatus),
}

#[derive(Debug, Clone, Default)]
pub struct LocalProbe;

impl LocalProbe {
    pub fn new() -> Self {
        Self
    }

    /// True when anything (file, directory, link target) exists at `path`.
    pub async fn file_exists(&self, path: &str) -> bool {
        tokio::fs::metadata(Path::new(path)).await.is_ok()
    }

    /// True when the whole file contains `needle`. A missing or unreadable file
    /// is a negative result, not an error.
    pub async fn file_contains(&self, path: &str, needle: &str) -> bool {
        match tokio::fs::read(Path::new(path)).await {
            Ok(contents) => contains_bytes(&contents, needle.as_bytes()),
            Err(e) => {
                debug!("Cannot read {} for containment check: {}", path, e);
                false
            }
        }
    }

    /// True when any line of `ps -e -o command` contains `fragment`.
    /// Approximate by nature: this is not process-name equality.
    pub async fn is_running(&self, fragment: &str) -> Result<bool, ProbeError> {
        let output = Command::new("ps").args(["-e", "-o", "command"]).output().await?;
        if !output.status.success() {
            return Err(ProbeError::ProcessListStatus(output.status));
        }
        Ok(contains_bytes(&output.stdout, fragment.as_bytes()))
    }
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}

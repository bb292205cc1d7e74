// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Check Domain Types
//!
//! A [`Check`] is one caller-specified diagnostic assertion evaluated across
//! every agent node in the fleet. Each (check, node) pairing resolves to exactly
//! one [`OutcomeCategory`].
//!
//! # Architecture
//!
//! - **Layer:** Domain
//! - **Purpose:** Check identity, kind parsing and outcome classification

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Wire name for the existence check kind.
pub const KIND_FILE_EXISTS: &str = "file_exists";
/// Wire name for the containment check kind.
pub const KIND_FILE_CONTAINS: &str = "file_contains";
/// Wire name for the process-running check kind.
pub const KIND_IS_RUNNING: &str = "is_running";

/// Caller-assigned check identifier, unique within one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckId(pub String);

impl CheckId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of evaluations an agent node knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    FileExists,
    FileContains,
    IsRunning,
}

impl CheckKind {
    /// Parse the inbound `type` field. Unknown names yield `None` so the
    /// caller can mark that single check malformed instead of rejecting the batch.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            KIND_FILE_EXISTS => Some(Self::FileExists),
            KIND_FILE_CONTAINS => Some(Self::FileContains),
            KIND_IS_RUNNING => Some(Self::IsRunning),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileExists => KIND_FILE_EXISTS,
            Self::FileContains => KIND_FILE_CONTAINS,
            Self::IsRunning => KIND_IS_RUNNING,
        }
    }
}

/// One named diagnostic request as submitted by the caller.
///
/// `kind` is kept as the raw wire string: an unrecognised kind is a per-check
/// problem surfaced in that check's report, never a batch decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// Target path on the agent node (unused by process checks).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub path: String,

    /// One of `file_exists`, `file_contains`, `is_running`. Missing or null
    /// decodes as empty and is reported as an unknown kind.
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    pub kind: String,

    /// Substring for containment, process-name fragment for process checks.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub check: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Check {
    pub fn new(kind: impl Into<String>, path: impl Into<String>, check: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
            check: check.into(),
        }
    }

    pub fn file_exists(path: impl Into<String>) -> Self {
        Self::new(KIND_FILE_EXISTS, path, "")
    }

    pub fn file_contains(path: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::new(KIND_FILE_CONTAINS, path, needle)
    }

    pub fn is_running(process_name: impl Into<String>) -> Self {
        Self::new(KIND_IS_RUNNING, "", process_name)
    }

    /// Resolve the wire `type` into a [`CheckKind`].
    pub fn parsed_kind(&self) -> Result<CheckKind, CheckError> {
        CheckKind::parse(&self.kind).ok_or_else(|| CheckError::UnknownKind(self.kind.clone()))
    }
}

/// Classification of one (check, node) evaluation. Total and mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    /// Node evaluated the check and it held.
    Passed,
    /// Node evaluated the check and it did not hold.
    Failed,
    /// Node was reachable but the result could not be determined.
    Errored,
    /// Node could not be contacted.
    Unreachable,
}

impl OutcomeCategory {
    pub const ALL: [OutcomeCategory; 4] = [
        OutcomeCategory::Passed,
        OutcomeCategory::Failed,
        OutcomeCategory::Errored,
        OutcomeCategory::Unreachable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Errored => "errored",
            Self::Unreachable => "unreachable",
        }
    }
}

impl From<bool> for OutcomeCategory {
    fn from(result: bool) -> Self {
        if result {
            Self::Passed
        } else {
            Self::Failed
        }
    }
}

impl fmt::Display for OutcomeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a check is short-circuited before any node is contacted.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Unknown check type: `{0}`")]
    UnknownKind(String),

    #[error("Failed to serialize node payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CheckError {
    /// Message placed in the malformed report.
    ///
    /// Serialization failures are internal and reported generically.
    pub fn report_message(&self) -> String {
        match self {
            Self::UnknownKind(_) => self.to_string(),
            Self::Serialization(_) => "Internal Server Error".to_string(),
        }
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Check Report Aggregate
//!
//! The finalized per-check aggregation of every node outcome, and the batch
//! response that keys those reports by check identifier.
//!
//! # Invariants
//!
//! - A malformed report has all four node collections empty and a non-empty message.
//! - A finalized non-malformed report lists every fleet node exactly once,
//!   across exactly one of the four collections.

use crate::domain::check::{CheckId, OutcomeCategory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mapping from check identifier to its finalized report.
pub type BatchResponse = HashMap<CheckId, CheckReport>;

/// Finalized report for one check. Field names on the wire match the
/// response shape existing dispatcher clients already parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    /// Carried as the response map key, not inside the object.
    #[serde(skip)]
    pub id: CheckId,

    /// Set when the check itself was invalid and no node was contacted.
    #[serde(rename = "ErroneousRequest")]
    pub malformed: bool,

    /// Meaningful only when `malformed` is set.
    #[serde(rename = "ErrorMessage")]
    pub error_message: String,

    #[serde(rename = "PassedMachines", default)]
    pub passed: Vec<String>,

    #[serde(rename = "FailedMachines", default)]
    pub failed: Vec<String>,

    /// Nodes whose result could not be determined; the caller may retry later.
    #[serde(rename = "ErrorMachines", default)]
    pub errored: Vec<String>,

    #[serde(rename = "UnReachableMachines", default)]
    pub unreachable: Vec<String>,
}

impl CheckReport {
    /// Report for a check that was short-circuited before dispatch.
    pub fn malformed(id: CheckId, message: impl Into<String>) -> Self {
        Self {
            id,
            malformed: true,
            error_message: message.into(),
            ..Default::default()
        }
    }

    /// Assemble a finalized report from the four drained category collections.
    pub fn from_categories(
        id: CheckId,
        passed: Vec<String>,
        failed: Vec<String>,
        errored: Vec<String>,
        unreachable: Vec<String>,
    ) -> Self {
        Self {
            id,
            malformed: false,
            error_message: String::new(),
            passed,
            failed,
            errored,
            unreachable,
        }
    }

    pub fn nodes(&self, category: OutcomeCategory) -> &[String] {
        match category {
            OutcomeCategory::Passed => &self.passed,
            OutcomeCategory::Failed => &self.failed,
            OutcomeCategory::Errored => &self.errored,
            OutcomeCategory::Unreachable => &self.unreachable,
        }
    }

    /// Total node labels recorded across all four categories.
    pub fn total_nodes(&self) -> usize {
        OutcomeCategory::ALL
            .iter()
            .map(|category| self.nodes(*category).len())
            .sum()
    }

    /// Category a node landed in, if any.
    pub fn category_of(&self, label: &str) -> Option<OutcomeCategory> {
        OutcomeCategory::ALL
            .into_iter()
            .find(|category| self.nodes(*category).iter().any(|n| n == label))
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Run Check Batch Use Case
//!
//! Application service evaluating every check of one inbound request.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Start one fan-out coordinator per check concurrently and
//!   assemble the keyed batch response once every report is final
//! - **Collaborators:**
//!   - Application: CheckFanOut, DispatchPool (shared, process-wide)
//!   - Domain: Check, CheckReport, AgentNode

use crate::application::dispatch_pool::JobSubmitter;
use crate::application::fan_out::CheckFanOut;
use crate::domain::check::{Check, CheckId};
use crate::domain::node_config::AgentNode;
use crate::domain::report::{BatchResponse, CheckReport};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument, Span};
use uuid::Uuid;

/// Decoded inbound batch: caller-chosen identifier to check.
pub type CheckBatch = HashMap<CheckId, Check>;

/// Run Check Batch Use Case
#[async_trait]
pub trait BatchOrchestrator: Send + Sync {
    /// Evaluate every check against the whole fleet.
    ///
    /// Every key of `checks` appears exactly once in the response. Per-node and
    /// per-check failures are reported as data; this call itself cannot fail.
    async fn run_batch(&self, checks: CheckBatch) -> BatchResponse;

    /// Number of agent nodes every check is evaluated against.
    fn fleet_size(&self) -> usize;
}

/// Standard implementation of BatchOrchestrator
pub struct StandardBatchOrchestrator {
    fan_out: Arc<CheckFanOut>,
}

impl StandardBatchOrchestrator {
    pub fn new(nodes: Arc<Vec<AgentNode>>, submitter: JobSubmitter) -> Self {
        Self {
            fan_out: Arc::new(CheckFanOut::new(nodes, submitter)),
        }
    }
}

#[async_trait]
impl BatchOrchestrator for StandardBatchOrchestrator {
    async fn run_batch(&self, checks: CheckBatch) -> BatchResponse {
        if checks.is_empty() {
            return BatchResponse::new();
        }

        let batch_id = Uuid::new_v4();
        let span = info_span!("batch", %batch_id, checks = checks.len());
        info!(parent: &span, "Evaluating {} checks across {} nodes", checks.len(), self.fan_out.node_count());

        let coordinators: Vec<_> = checks
            .into_iter()
            .map(|(id, check)| {
                let fan_out = self.fan_out.clone();
                let task_id = id.clone();
                let task = tokio::spawn(
                    async move { fan_out.run(task_id, &check).await }.instrument(span.clone()),
                );
                (id, task)
            })
            .collect();

        let response = collect_reports(coordinators, &span).await;

        info!(parent: &span, "Batch complete");
        response
    }

    fn fleet_size(&self) -> usize {
        self.fan_out.node_count()
    }
}

/// Await every coordinator. A coordinator that died still yields a report for
/// its key, marked malformed.
async fn collect_reports(
    coordinators: Vec<(CheckId, JoinHandle<CheckReport>)>,
    span: &Span,
) -> BatchResponse {
    let mut response = BatchResponse::with_capacity(coordinators.len());
    for (id, task) in coordinators {
        let report = match task.await {
            Ok(report) => report,
            Err(e) => {
                error!(parent: span, "Coordinator for check {} failed: {}", id, e);
                CheckReport::malformed(id.clone(), "Internal Server Error")
            }
        };
        response.insert(id, report);
    }
    response
}

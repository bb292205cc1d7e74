// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Check Fan-Out Coordinator
//!
//! Turns one [`Check`] into one remote call per agent node and produces the
//! check's finalized [`CheckReport`].
//!
//! # Flow
//!
//! 1. Build the node-agnostic payload once. An unknown kind or a serialization
//!    failure short-circuits into a malformed report; no node is contacted.
//! 2. Start the [`ResultAggregator`] on four fresh category streams.
//! 3. Submit one [`RemoteCallJob`] per node into the shared dispatch pool.
//! 4. Wait on every job's completion signal, then drop the coordinator's sinks
//!    so the category streams close and the aggregator can finalize.

use crate::application::aggregator::{outcome_channels, OutcomeSinks, ResultAggregator};
use crate::application::dispatch_pool::{JobSubmitter, PoolClosed, RemoteCallJob};
use crate::domain::check::{Check, CheckId, OutcomeCategory};
use crate::domain::node_config::AgentNode;
use crate::domain::protocol::CheckPayload;
use crate::domain::remote_call::NodeRequest;
use crate::domain::report::CheckReport;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct CheckFanOut {
    nodes: Arc<Vec<AgentNode>>,
    submitter: JobSubmitter,
}

impl CheckFanOut {
    pub fn new(nodes: Arc<Vec<AgentNode>>, submitter: JobSubmitter) -> Self {
        Self { nodes, submitter }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Evaluate one check across the whole fleet.
    pub async fn run(&self, id: CheckId, check: &Check) -> CheckReport {
        let payload = match CheckPayload::build(check) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Check {} is malformed: {}", id, e);
                metrics::counter!("fleetcheck_checks_total", "malformed" => "true").increment(1);
                return CheckReport::malformed(id, e.report_message());
            }
        };

        debug!(
            "Dispatching check {} ({}) to {} nodes",
            id,
            payload.kind.as_str(),
            self.nodes.len()
        );

        let (sinks, streams) = outcome_channels(self.nodes.len());
        let (_, report) = tokio::join!(
            self.dispatch(&payload, sinks),
            ResultAggregator::collect(id, streams),
        );

        metrics::counter!("fleetcheck_checks_total", "malformed" => "false").increment(1);
        report
    }

    /// Submit one job per node and wait until every one has completed.
    ///
    /// Takes ownership of the coordinator's sinks; they are dropped on return,
    /// which closes the category streams once the jobs' clones are gone too.
    async fn dispatch(&self, payload: &CheckPayload, sinks: OutcomeSinks) {
        let mut pending = Vec::with_capacity(self.nodes.len());

        for node in self.nodes.iter() {
            let url = match node.endpoint_url(payload.kind.endpoint()) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Cannot build request for node {} ({}): {}", node.label, node.address, e);
                    sinks.route(OutcomeCategory::Errored, node.label.clone()).await;
                    continue;
                }
            };

            let request = NodeRequest {
                node_label: node.label.clone(),
                url,
                body: payload.body.clone(),
            };

            let (job, completion) = RemoteCallJob::new(request, sinks.clone());
            match self.submitter.submit(job).await {
                Ok(()) => pending.push(completion),
                Err(PoolClosed(job)) => {
                    warn!(
                        "Dispatch pool closed before node {} could be contacted",
                        job.request().node_label
                    );
                    job.complete(OutcomeCategory::Errored).await;
                }
            }
        }

        // Completion of every submitted job for this check
        for completion in join_all(pending).await {
            if completion.is_err() {
                warn!("Remote call job dropped without signalling completion");
            }
        }
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Result Aggregator
//!
//! Fans the four per-check category streams into one [`CheckReport`].
//!
//! Each category has its own channel and its own drain task, and each drain
//! task owns the only mutable collection for that category. No report state is
//! ever written by two tasks, so no lock is taken. The report is assembled only
//! after all four streams have closed and been emptied.

use crate::domain::check::{CheckId, OutcomeCategory};
use crate::domain::report::CheckReport;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Sending half of the four category streams of one check.
///
/// Cloned into every job of the check. The streams close once the
/// coordinator and every job have dropped their clone.
#[derive(Debug, Clone)]
pub struct OutcomeSinks {
    passed: mpsc::Sender<String>,
    failed: mpsc::Sender<String>,
    errored: mpsc::Sender<String>,
    unreachable: mpsc::Sender<String>,
}

impl OutcomeSinks {
    /// Record a node label under its outcome category.
    pub async fn route(&self, category: OutcomeCategory, node_label: String) {
        let sink = match category {
            OutcomeCategory::Passed => &self.passed,
            OutcomeCategory::Failed => &self.failed,
            OutcomeCategory::Errored => &self.errored,
            OutcomeCategory::Unreachable => &self.unreachable,
        };

        if let Err(e) = sink.send(node_label).await {
            warn!("Outcome for node {} dropped: {} stream closed", e.0, category);
        }
    }
}

/// Receiving half of the four category streams of one check.
#[derive(Debug)]
pub struct OutcomeStreams {
    passed: mpsc::Receiver<String>,
    failed: mpsc::Receiver<String>,
    errored: mpsc::Receiver<String>,
    unreachable: mpsc::Receiver<String>,
}

/// Create the four category streams for one check.
///
/// `node_count` bounds how many labels any single category can receive, so
/// sized that way a send never waits on a slow drain.
pub fn outcome_channels(node_count: usize) -> (OutcomeSinks, OutcomeStreams) {
    let capacity = node_count.max(1);
    let (passed_tx, passed_rx) = mpsc::channel(capacity);
    let (failed_tx, failed_rx) = mpsc::channel(capacity);
    let (errored_tx, errored_rx) = mpsc::channel(capacity);
    let (unreachable_tx, unreachable_rx) = mpsc::channel(capacity);

    (
        OutcomeSinks {
            passed: passed_tx,
            failed: failed_tx,
            errored: errored_tx,
            unreachable: unreachable_tx,
        },
        OutcomeStreams {
            passed: passed_rx,
            failed: failed_rx,
            errored: errored_rx,
            unreachable: unreachable_rx,
        },
    )
}

pub struct ResultAggregator;

impl ResultAggregator {
    /// Drain all four streams concurrently and build the finalized report.
    ///
    /// Returns only once every stream is closed and empty.
    pub async fn collect(id: CheckId, streams: OutcomeStreams) -> CheckReport {
        let OutcomeStreams {
            passed,
            failed,
            errored,
            unreachable,
        } = streams;

        let passed = tokio::spawn(drain(passed));
        let failed = tokio::spawn(drain(failed));
        let errored = tokio::spawn(drain(errored));
        let unreachable = tokio::spawn(drain(unreachable));

        let (passed, failed, errored, unreachable) = tokio::join!(
            settle(&id, OutcomeCategory::Passed, passed),
            settle(&id, OutcomeCategory::Failed, failed),
            settle(&id, OutcomeCategory::Errored, errored),
            settle(&id, OutcomeCategory::Unreachable, unreachable),
        );

        CheckReport::from_categories(id, passed, failed, errored, unreachable)
    }
}

async fn drain(mut stream: mpsc::Receiver<String>) -> Vec<String> {
    let mut labels = Vec::new();
    while let Some(label) = stream.recv().await {
        labels.push(label);
    }
    labels
}

async fn settle(
    id: &CheckId,
    category: OutcomeCategory,
    handle: JoinHandle<Vec<String>>,
) -> Vec<String> {
    handle.await.unwrap_or_else(|e| {
        error!("Drain task for check {} ({}) failed: {}", id, category, e);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_waits_for_all_streams_to_close() {
        let (sinks, streams) = outcome_channels(3);
        let collector = tokio::spawn(ResultAggregator::collect(CheckId::new("c1"), streams));

        let late = sinks.clone();
        sinks.route(OutcomeCategory::Passed, "a".into()).await;
        sinks.route(OutcomeCategory::Unreachable, "b".into()).await;
        drop(sinks);

        // One clone still open: the report must not be final yet
        tokio::task::yield_now().await;
        assert!(!collector.is_finished());

        late.route(OutcomeCategory::Failed, "c".into()).await;
        drop(late);

        let report = collector.await.unwrap();
        assert_eq!(report.passed, vec!["a".to_string()]);
        assert_eq!(report.failed, vec!["c".to_string()]);
        assert_eq!(report.unreachable, vec!["b".to_string()]);
        assert!(report.errored.is_empty());
        assert_eq!(report.total_nodes(), 3);
        assert!(!report.malformed);
    }

    #[tokio::test]
    async fn test_concurrent_writers_lose_nothing() {
        let node_count = 200;
        let (sinks, streams) = outcome_channels(node_count);
        let collector = tokio::spawn(ResultAggregator::collect(CheckId::new("c1"), streams));

        let mut writers = Vec::new();
        for i in 0..node_count {
            let sinks = sinks.clone();
            writers.push(tokio::spawn(async move {
                let category = OutcomeCategory::ALL[i % 4];
                sinks.route(category, format!("node-{}", i)).await;
            }));
        }
        drop(sinks);
        for writer in writers {
            writer.await.unwrap();
        }

        let report = collector.await.unwrap();
        assert_eq!(report.total_nodes(), node_count);
        for category in OutcomeCategory::ALL {
            assert_eq!(report.nodes(category).len(), node_count / 4);
        }
    }
}

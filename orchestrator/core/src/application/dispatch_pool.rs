// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Bounded Dispatch Pool
//!
//! A fixed set of long-lived worker tasks reading from one shared job queue.
//! Each worker runs one remote call at a time, so no more than `workers` calls
//! are ever in flight in the process, however many checks and nodes are
//! batched together. The pool knows nothing about checks: it is purely a
//! capacity limiter.
//!
//! # Lifecycle
//!
//! Every holder of a [`JobSubmitter`] keeps the queue open. The queue closes
//! once the pool's own handle is released by [`DispatchPool::shutdown`] and the
//! last submitter has been dropped; workers then drain what is left and exit.

use crate::application::aggregator::OutcomeSinks;
use crate::domain::check::OutcomeCategory;
use crate::domain::remote_call::{NodeRequest, RemoteCheckClient};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// One (check, node) call ready for a worker.
///
/// Consumed exactly once. The submitting coordinator keeps only the
/// completion receiver returned by [`RemoteCallJob::new`].
#[derive(Debug)]
pub struct RemoteCallJob {
    request: NodeRequest,
    sinks: OutcomeSinks,
    done: oneshot::Sender<()>,
}

impl RemoteCallJob {
    pub fn new(request: NodeRequest, sinks: OutcomeSinks) -> (Self, oneshot::Receiver<()>) {
        let (done, completion) = oneshot::channel();
        (
            Self {
                request,
                sinks,
                done,
            },
            completion,
        )
    }

    pub fn request(&self) -> &NodeRequest {
        &self.request
    }

    /// Route the outcome to its category stream, then signal completion.
    pub async fn complete(self, outcome: OutcomeCategory) {
        metrics::counter!("fleetcheck_node_outcomes_total", "category" => outcome.as_str())
            .increment(1);
        self.sinks.route(outcome, self.request.node_label).await;
        // The coordinator may have stopped waiting; nothing else to notify.
        let _ = self.done.send(());
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Dispatch pool is shut down")]
pub struct PoolClosed(pub RemoteCallJob);

/// Submission point of the pool. Cheap to clone; each clone counts as one
/// outstanding submitter keeping the queue open.
#[derive(Debug, Clone)]
pub struct JobSubmitter {
    sender: mpsc::Sender<RemoteCallJob>,
}

impl JobSubmitter {
    /// Enqueue a job, waiting while the queue is full.
    ///
    /// On a closed pool the job is handed back so the caller can still
    /// account for its node.
    pub async fn submit(&self, job: RemoteCallJob) -> Result<(), PoolClosed> {
        self.sender.send(job).await.map_err(|e| PoolClosed(e.0))
    }

    /// A submitter whose workers are already gone.
    #[cfg(test)]
    pub(crate) fn closed() -> Self {
        let (sender, _) = mpsc::channel(1);
        Self { sender }
    }
}

pub struct DispatchPool {
    sender: mpsc::Sender<RemoteCallJob>,
    workers: Vec<JoinHandle<()>>,
}

impl DispatchPool {
    /// Spawn `workers` worker tasks sharing a queue of `queue_capacity` jobs.
    pub fn start(
        workers: usize,
        queue_capacity: usize,
        client: Arc<dyn RemoteCheckClient>,
    ) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..workers)
            .map(|worker_id| tokio::spawn(run_worker(worker_id, receiver.clone(), client.clone())))
            .collect();

        info!("Dispatch pool started with {} workers", workers);

        Self {
            sender,
            workers: handles,
        }
    }

    pub fn submitter(&self) -> JobSubmitter {
        JobSubmitter {
            sender: self.sender.clone(),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Release the pool's handle and wait for workers to exit.
    ///
    /// Workers keep serving until every outstanding [`JobSubmitter`] is dropped
    /// and the queue is empty.
    pub async fn shutdown(self) {
        let Self { sender, workers } = self;
        drop(sender);

        for worker in workers {
            if let Err(e) = worker.await {
                error!("Dispatch worker terminated abnormally: {}", e);
            }
        }

        info!("Dispatch pool stopped");
    }
}

async fn run_worker(
    worker_id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<RemoteCallJob>>>,
    client: Arc<dyn RemoteCheckClient>,
) {
    debug!("Dispatch worker {} started", worker_id);

    loop {
        let job = {
            let mut rx = jobs.lock().await;
            rx.recv().await
        };

        let Some(job) = job else {
            break;
        };

        debug!(
            "Worker {} contacting node {} for {}",
            worker_id, job.request.node_label, job.request.url
        );

        metrics::gauge!("fleetcheck_calls_in_flight").increment(1.0);
        let outcome = AssertUnwindSafe(client.call(&job.request))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                error!(
                    "Remote call to node {} panicked; recording as errored",
                    job.request.node_label
                );
                OutcomeCategory::Errored
            });
        metrics::gauge!("fleetcheck_calls_in_flight").decrement(1.0);

        job.complete(outcome).await;
    }

    debug!("Dispatch worker {} stopped", worker_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::aggregator::{outcome_channels, ResultAggregator};
    use crate::domain::check::CheckId;
    use async_trait::async_trait;
    use bytes::Bytes;
    use url::Url;

    struct FixedClient(OutcomeCategory);

    #[async_trait]
    impl RemoteCheckClient for FixedClient {
        async fn call(&self, _request: &NodeRequest) -> OutcomeCategory {
            self.0
        }
    }

    struct PanickingClient;

    #[async_trait]
    impl RemoteCheckClient for PanickingClient {
        async fn call(&self, _request: &NodeRequest) -> OutcomeCategory {
            panic!("transport exploded");
        }
    }

    fn request(label: &str) -> NodeRequest {
        NodeRequest {
            node_label: label.to_string(),
            url: Url::parse("http://127.0.0.1:1/does-exist").unwrap(),
            body: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn test_job_outcome_routed_and_completion_signalled() {
        let pool = DispatchPool::start(2, 4, Arc::new(FixedClient(OutcomeCategory::Failed)));
        let (sinks, streams) = outcome_channels(1);
        let collector = tokio::spawn(ResultAggregator::collect(CheckId::new("c1"), streams));

        let (job, completion) = RemoteCallJob::new(request("n1"), sinks);
        pool.submitter().submit(job).await.unwrap();
        completion.await.unwrap();

        let report = collector.await.unwrap();
        assert_eq!(report.failed, vec!["n1".to_string()]);

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_panicking_call_is_errored_and_worker_survives() {
        let pool = DispatchPool::start(1, 4, Arc::new(PanickingClient));
        let (sinks, streams) = outcome_channels(2);
        let collector = tokio::spawn(ResultAggregator::collect(CheckId::new("c1"), streams));

        let submitter = pool.submitter();
        let (first, first_done) = RemoteCallJob::new(request("n1"), sinks.clone());
        let (second, second_done) = RemoteCallJob::new(request("n2"), sinks);
        submitter.submit(first).await.unwrap();
        submitter.submit(second).await.unwrap();
        first_done.await.unwrap();
        second_done.await.unwrap();

        let report = collector.await.unwrap();
        assert_eq!(report.errored.len(), 2);

        drop(submitter);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_outstanding_submitters() {
        let pool = DispatchPool::start(2, 1, Arc::new(FixedClient(OutcomeCategory::Passed)));
        assert_eq!(pool.worker_count(), 2);
        let submitter = pool.submitter();

        let shutdown = tokio::spawn(pool.shutdown());

        // Queue stays open while a submitter is alive
        let (sinks, streams) = outcome_channels(1);
        let collector = tokio::spawn(ResultAggregator::collect(CheckId::new("c1"), streams));
        let (job, completion) = RemoteCallJob::new(request("late"), sinks);
        submitter.submit(job).await.unwrap();
        completion.await.unwrap();
        assert_eq!(collector.await.unwrap().passed, vec!["late".to_string()]);

        assert!(!shutdown.is_finished());
        drop(submitter);
        shutdown.await.unwrap();
    }
}

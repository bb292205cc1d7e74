// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for communicating with a running dispatcher

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use fleetcheck_core::application::CheckBatch;
use fleetcheck_core::domain::report::BatchResponse;

#[derive(Debug, Clone)]
pub struct DispatcherClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthInfo {
    pub status: String,
    pub uptime_seconds: u64,
    pub nodes: usize,
}

impl DispatcherClient {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        Self::with_base_url(format!("http://{}:{}", host, port))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        // Batches wait on every node, so no client-side timeout
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn submit_batch(&self, batch: &CheckBatch) -> Result<BatchResponse> {
        let response = self
            .client
            .post(format!("{}/api/checks", self.base_url))
            .json(batch)
            .send()
            .await
            .context("Failed to submit check batch")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Dispatcher rejected batch: {}", error_text);
        }

        let mut batch_response: BatchResponse = response
            .json()
            .await
            .context("Failed to parse batch response")?;

        for (id, report) in batch_response.iter_mut() {
            report.id = id.clone();
        }

        Ok(batch_response)
    }

    pub async fn health(&self) -> Result<HealthInfo> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .context("Failed to reach dispatcher")?;

        if !response.status().is_success() {
            anyhow::bail!("Dispatcher unhealthy: HTTP {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse health response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetcheck_core::domain::check::{Check, CheckId};
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_submit_batch_parses_keyed_reports() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/checks")
            .match_body(Matcher::Json(json!({
                "c1": {"path": "/etc/hosts", "type": "file_exists", "check": ""}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "c1": {
                        "ErroneousRequest": false,
                        "ErrorMessage": "",
                        "PassedMachines": ["Machine-9000"],
                        "FailedMachines": [],
                        "ErrorMachines": [],
                        "UnReachableMachines": ["Machine-9002"]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = DispatcherClient::with_base_url(server.url()).unwrap();
        let mut batch = CheckBatch::new();
        batch.insert(CheckId::new("c1"), Check::file_exists("/etc/hosts"));

        let response = client.submit_batch(&batch).await.unwrap();
        let report = &response[&CheckId::new("c1")];
        assert_eq!(report.id, CheckId::new("c1"));
        assert_eq!(report.passed, vec!["Machine-9000".to_string()]);
        assert_eq!(report.unreachable, vec!["Machine-9002".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_batch_is_an_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/checks")
            .with_status(400)
            .with_body(r#"{"error":"Invalid Request: expected value"}"#)
            .create_async()
            .await;

        let client = DispatcherClient::with_base_url(server.url()).unwrap();
        let err = client.submit_batch(&CheckBatch::new()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid Request"));
    }

    #[tokio::test]
    async fn test_health() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status":"healthy","uptime_seconds":12,"nodes":4}"#)
            .create_async()
            .await;

        let client = DispatcherClient::with_base_url(format!("{}/", server.url())).unwrap();
        let health = client.health().await.unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.nodes, 4);
    }
}

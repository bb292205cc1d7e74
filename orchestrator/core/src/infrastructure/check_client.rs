// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// HTTP Remote Check Client
//
// Anti-Corruption Layer for agent nodes. Posts the prepared check payload
// to the node endpoint and maps every possible result onto one outcome:
//
//   transport failure          -> unreachable
//   status other than 200 OK   -> errored
//   unreadable/undecodable body -> errored
//   {"Result": true|false}     -> passed|failed

use crate::domain::check::OutcomeCategory;
use crate::domain::protocol::AgentResponse;
use crate::domain::remote_call::{NodeRequest, RemoteCheckClient};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

/// Shared, thread-safe HTTP client for every node call in the process.
#[derive(Debug, Clone)]
pub struct HttpCheckClient {
    client: reqwest::Client,
}

impl HttpCheckClient {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_timeout(None)
    }

    /// Build a client with an optional per-request timeout. A call that times
    /// out fails at the transport level and is classified unreachable.
    pub fn with_timeout(timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteCheckClient for HttpCheckClient {
    async fn call(&self, request: &NodeRequest) -> OutcomeCategory {
        let response = match self
            .client
            .post(request.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(request.body.clone())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("Node {} unreachable at {}: {}", request.node_label, request.url, e);
                return OutcomeCategory::Unreachable;
            }
        };

        if response.status() != StatusCode::OK {
            debug!(
                "Node {} answered HTTP {} for {}",
                request.node_label,
                response.status(),
                request.url
            );
            return OutcomeCategory::Errored;
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read response body from node {}: {}", request.node_label, e);
                return OutcomeCategory::Errored;
            }
        };

        match serde_json::from_slice::<AgentResponse>(&body) {
            Ok(decoded) => OutcomeCategory::from(decoded.result),
            Err(e) => {
                warn!("Failed to decode response from node {}: {}", request.node_label, e);
                OutcomeCategory::Errored
            }
        }
    }
}

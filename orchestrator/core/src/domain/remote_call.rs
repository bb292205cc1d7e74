// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Remote Check Call Port
//!
//! The capability of performing one round trip to one agent node for one check.
//! Transport details live behind [`RemoteCheckClient`]; the dispatch pool only
//! needs a total mapping from a prepared request to an [`OutcomeCategory`].

use crate::domain::check::OutcomeCategory;
use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

/// One (check, node) pairing with its payload ready to send.
#[derive(Debug, Clone)]
pub struct NodeRequest {
    /// Label of the target node, recorded in the report.
    pub node_label: String,

    /// Kind-specific endpoint on the target node.
    pub url: Url,

    /// JSON body shared by every node of the same check.
    pub body: Bytes,
}

/// Performs a single call to a single agent node and classifies the outcome.
///
/// Implementations must be total: every failure path is returned as a
/// category, never as an error or a panic. No retries.
#[async_trait]
pub trait RemoteCheckClient: Send + Sync {
    async fn call(&self, request: &NodeRequest) -> OutcomeCategory;
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Agent Node Wire Protocol
//
// One POST endpoint per check kind. Every endpoint accepts a JSON body and
// answers `{"Result": <bool>}` with 200 OK on a correct evaluation. Field
// names are PascalCase on the wire.

use crate::domain::check::{Check, CheckError, CheckKind};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub const DOES_EXIST_ENDPOINT: &str = "does-exist";
pub const DOES_CONTAIN_ENDPOINT: &str = "does-contain";
pub const IS_RUNNING_ENDPOINT: &str = "is-running";

impl CheckKind {
    /// Endpoint path, relative to the node base address.
    pub fn endpoint(&self) -> &'static str {
        match self {
            CheckKind::FileExists => DOES_EXIST_ENDPOINT,
            CheckKind::FileContains => DOES_CONTAIN_ENDPOINT,
            CheckKind::IsRunning => IS_RUNNING_ENDPOINT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DoesExistRequest {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DoesContainRequest {
    pub path: String,
    pub check: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IsRunningRequest {
    pub process_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentResponse {
    pub result: bool,
}

/// Node-agnostic request body for one check, serialized once and shared by
/// every node the check is dispatched to.
#[derive(Debug, Clone)]
pub struct CheckPayload {
    pub kind: CheckKind,
    pub body: Bytes,
}

impl CheckPayload {
    pub fn build(check: &Check) -> Result<Self, CheckError> {
        let kind = check.parsed_kind()?;
        let body = match kind {
            CheckKind::FileExists => serde_json::to_vec(&DoesExistRequest {
                path: check.path.clone(),
            })?,
            CheckKind::FileContains => serde_json::to_vec(&DoesContainRequest {
                path: check.path.clone(),
                check: check.check.clone(),
            })?,
            CheckKind::IsRunning => serde_json::to_vec(&IsRunningRequest {
                process_name: check.check.clone(),
            })?,
        };

        Ok(Self {
            kind,
            body: Bytes::from(body),
        })
    }
}

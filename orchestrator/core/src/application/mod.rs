// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod aggregator;
pub mod batch;
pub mod dispatch_pool;
pub mod fan_out;

// Re-export use cases for convenience
pub use batch::{BatchOrchestrator, CheckBatch, StandardBatchOrchestrator};
pub use dispatch_pool::{DispatchPool, JobSubmitter};

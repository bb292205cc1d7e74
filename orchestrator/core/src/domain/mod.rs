// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain types shared by the dispatcher and the agent service.

pub mod check;
pub mod node_config;
pub mod protocol;
pub mod remote_call;
pub mod report;

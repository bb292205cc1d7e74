// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! fleetcheck CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Process bootstrap for the dispatcher and agent node roles,
//!   plus the client used by `fleetcheck submit`

pub mod client;
pub mod commands;
pub mod server;

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`fleetcheck-core`)
//!
//! HTTP surface that translates external requests into application service
//! calls. No business logic lives here.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Dispatcher: inbound check batches and health |
//! | [`agent_api`] | HTTP (Axum) | Agent node: per-kind check endpoints |

pub mod agent_api;
pub mod api;

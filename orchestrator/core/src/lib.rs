// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `fleetcheck-core` — Fleet Check Dispatch Engine
//!
//! Evaluates batches of named diagnostic checks against a static fleet of
//! agent nodes and reports, per check, which nodes passed, failed, errored or
//! were unreachable.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `Check`, `OutcomeCategory`, `CheckReport`, fleet config, wire protocol |
//! | [`application`] | Application | dispatch pool, fan-out coordinator, aggregator, batch use case |
//! | [`infrastructure`] | Infrastructure | HTTP check client, local probes |
//! | [`presentation`] | Presentation | dispatcher and agent HTTP routers |

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the fleetcheck CLI

pub mod config;
pub mod submit;

pub use self::config::ConfigCommand;
pub use self::submit::SubmitCommand;

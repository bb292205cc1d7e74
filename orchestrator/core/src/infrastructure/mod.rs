// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod check_client;
pub mod probe;

pub use check_client::HttpCheckClient;
pub use probe::LocalProbe;

// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log intake: remote clients submit `<level>_<reserved>_<client id>_<payload>`
//! lines over TCP; each line is validated, rate limited per client, appended to a
//! durable log file, and the per-client and per-level statistics are recomputed.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod clock;
pub mod codec;
pub mod config;
pub mod constants;
pub mod errors;
pub mod handler;
pub mod intake_service;
pub mod log_store;
pub mod message;
pub mod rate_limiter;
pub mod server;
pub mod stats;

#[cfg(test)]
mod test_support;

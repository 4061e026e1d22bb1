// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-client rate limiting: at most one message per client per wall-clock second.
//!
//! State lives for the lifetime of the process and is created lazily the first
//! time a client id is seen. Each client carries its own "already notified" flag
//! so a streak of denials produces a single notice in the log file, independently
//! of what other clients are doing.
//!
//! Entries are never evicted. Any client id that parses as an integer is tracked,
//! including ids outside the accepted range, so the map grows with every distinct
//! id a client chooses to send and is bounded only by the process lifetime.

use chrono::{DateTime, Local};
use hashbrown::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientRateState {
    pub last_seen: DateTime<Local>,
    pub notified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allow,
    /// `first_in_streak` is set on the first denial since the client was last
    /// allowed through, which is when a notice should be written.
    Deny { first_in_streak: bool },
}

#[derive(Debug, Default)]
pub struct RateLimiter {
    clients: HashMap<i64, ClientRateState>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, client_id: i64, now: DateTime<Local>) -> RateDecision {
        let Some(state) = self.clients.get_mut(&client_id) else {
            debug!(client_id, "First message from client");
            self.clients.insert(
                client_id,
                ClientRateState {
                    last_seen: now,
                    notified: false,
                },
            );
            return RateDecision::Allow;
        };

        let same_second = state.last_seen.timestamp() == now.timestamp();
        state.last_seen = now;
        if same_second {
            let first_in_streak = !state.notified;
            state.notified = true;
            RateDecision::Deny { first_in_streak }
        } else {
            state.notified = false;
            RateDecision::Allow
        }
    }

    #[cfg(test)]
    fn state(&self, client_id: i64) -> Option<&ClientRateState> {
        self.clients.get(&client_id)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.clients.len()
    }
}

// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, TimeZone};

use crate::clock::Clock;

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub(crate) struct ManualClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        let start = Local.with_ymd_and_hms(2022, 2, 15, 9, 5, 7).unwrap();
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }
}

impl ManualClock {
    pub(crate) fn advance_millis(&self, millis: i64) {
        let mut now = self.now.lock().unwrap();
        *now = *now + Duration::milliseconds(millis);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}

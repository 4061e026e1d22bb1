// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-message decision logic of the intake pipeline.
//!
//! [`Intake`] owns every piece of process-lifetime state: the rate limit map, the
//! log store and the statistics writer. A decoded message goes through
//! parse → rate check → validate → persist/reject, and the resulting [`Verdict`]
//! carries the response text. Statistics are refreshed separately, after the
//! response has been handed back, via [`Intake::refresh_stats`].

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::IntakeConfig;
use crate::constants::{RESPONSE_ACCEPTED, RESPONSE_RATE_LIMITED};
use crate::errors::{IntakeError, Violation};
use crate::log_store::LogStore;
use crate::message::{self, describe};
use crate::rate_limiter::{RateDecision, RateLimiter};
use crate::stats::{StatsSnapshot, StatsWriter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(Vec<Violation>),
    RateLimited,
}

impl Verdict {
    pub fn response(&self) -> String {
        match self {
            Verdict::Accepted => RESPONSE_ACCEPTED.to_string(),
            Verdict::Rejected(violations) => describe(violations),
            Verdict::RateLimited => RESPONSE_RATE_LIMITED.to_string(),
        }
    }

    /// Rate limited messages stop before the statistics step.
    pub fn refreshes_stats(&self) -> bool {
        !matches!(self, Verdict::RateLimited)
    }
}

pub struct Intake {
    rate_limiter: RateLimiter,
    log_store: LogStore,
    stats_writer: StatsWriter,
    clock: Arc<dyn Clock>,
    last_snapshot: Option<StatsSnapshot>,
}

impl Intake {
    /// Rotates the log file and prepares the statistics directory.
    pub fn open(config: &IntakeConfig) -> Result<Self, IntakeError> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    pub fn open_with_clock(
        config: &IntakeConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, IntakeError> {
        let log_store = LogStore::new(&config.log_directory, &config.log_file_name);
        log_store.rotate(clock.now())?;
        let stats_writer = StatsWriter::new(&config.stats_directory);
        stats_writer.ensure_directory()?;
        info!("Logging to {}", log_store.path().display());

        Ok(Self {
            rate_limiter: RateLimiter::new(),
            log_store,
            stats_writer,
            clock,
            last_snapshot: None,
        })
    }

    pub fn process(&mut self, raw: &str) -> Result<Verdict, IntakeError> {
        let parsed = message::parse(raw);

        if let Some((_, client_id)) = parsed.identity() {
            let now = self.clock.now();
            if let RateDecision::Deny { first_in_streak } =
                self.rate_limiter.check(client_id, now)
            {
                if first_in_streak {
                    info!(client_id, "Skipping log due to repeat logger");
                    self.log_store.append_rate_limit_notice(client_id, now)?;
                }
                return Ok(Verdict::RateLimited);
            }
        }

        match parsed.validate() {
            Ok(record) => {
                self.log_store.append(record.raw())?;
                debug!(
                    client_id = record.client_id,
                    log_level = record.log_level,
                    payload = %record.payload,
                    "Logged message"
                );
                Ok(Verdict::Accepted)
            }
            Err(violations) => {
                debug!("Rejected message {:?}: {}", raw, describe(&violations));
                Ok(Verdict::Rejected(violations))
            }
        }
    }

    /// Rescans the whole log and overwrites today's snapshot file. The
    /// in-memory snapshot follows the log even when the file write fails.
    pub fn refresh_stats(&mut self) -> Result<PathBuf, IntakeError> {
        let lines = self.log_store.read_all()?;
        let snapshot = self.last_snapshot.insert(StatsSnapshot::recompute(&lines));
        self.stats_writer
            .write_snapshot(self.clock.now().date_naive(), snapshot)
    }

    /// The last computed snapshot, computing one if none exists yet.
    pub fn snapshot(&mut self) -> Result<StatsSnapshot, IntakeError> {
        if let Some(snapshot) = &self.last_snapshot {
            return Ok(snapshot.clone());
        }
        let lines = self.log_store.read_all()?;
        let snapshot = StatsSnapshot::recompute(&lines);
        self.last_snapshot = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Runs [`Intake::refresh_stats`] for a verdict that calls for it, logging
    /// rather than returning failures.
    pub fn refresh_stats_after(&mut self, verdict: &Verdict) {
        if !verdict.refreshes_stats() {
            return;
        }
        if let Err(e) = self.refresh_stats() {
            warn!("Failed to refresh statistics: {}", e);
        }
    }

    #[cfg(test)]
    pub(crate) fn log_store(&self) -> &LogStore {
        &self.log_store
    }

    #[cfg(test)]
    pub(crate) fn stats_writer(&self) -> &StatsWriter {
        &self.stats_writer
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::errors::{FieldParseError, RangeError};
    use crate::test_support::ManualClock;
    use std::fs;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    fn open(dir: &TempDir, clock: &ManualClock) -> Intake {
        let config = IntakeConfig::for_directory(dir.path());
        Intake::open_with_clock(&config, Arc::new(clock.clone())).unwrap()
    }

    fn logged(intake: &Intake) -> Vec<String> {
        intake.log_store().read_all().unwrap()[1..].to_vec()
    }

    #[test]
    #[traced_test]
    fn test_valid_message_is_appended_verbatim() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        let mut intake = open(&dir, &clock);

        let verdict = intake.process("3_x_42_disk full").unwrap();
        assert_eq!(verdict, Verdict::Accepted);
        assert_eq!(verdict.response(), "Info - Logging successful");
        assert_eq!(logged(&intake), vec!["3_x_42_disk full"]);
        assert!(logs_contain("payload=disk full"));
    }

    #[test]
    fn test_invalid_message_is_not_appended() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        let mut intake = open(&dir, &clock);

        let verdict = intake.process("abc_x_42_oops").unwrap();
        assert_eq!(
            verdict,
            Verdict::Rejected(vec![FieldParseError::LogLevel.into()])
        );
        assert_eq!(verdict.response(), "Log Level Not an integer");
        assert!(logged(&intake).is_empty());

        let verdict = intake.process("11_x_42_loud").unwrap();
        assert_eq!(verdict, Verdict::Rejected(vec![RangeError::LogLevel(11).into()]));
        assert!(logged(&intake).is_empty());
    }

    #[test]
    fn test_multi_line_message_is_not_appended() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        let mut intake = open(&dir, &clock);

        let verdict = intake.process("3_x_42_a\n9_y_7_forged").unwrap();
        assert_eq!(verdict, Verdict::Rejected(vec![Violation::LineBreak]));
        assert!(logged(&intake).is_empty());

        intake.refresh_stats().unwrap();
        let snapshot = intake.snapshot().unwrap();
        assert_eq!(snapshot.client_count("7"), 0);
        assert_eq!(snapshot.level_count("9"), 0);
    }

    #[test]
    fn test_snapshot_follows_log_when_stats_write_fails() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        let config = IntakeConfig {
            stats_directory: dir.path().join("stats"),
            ..IntakeConfig::for_directory(dir.path())
        };
        let mut intake = Intake::open_with_clock(&config, Arc::new(clock.clone())).unwrap();

        intake.process("3_x_42_first").unwrap();
        intake.refresh_stats().unwrap();
        fs::remove_dir_all(dir.path().join("stats")).unwrap();

        clock.advance_millis(1_000);
        intake.process("3_x_42_second").unwrap();
        assert!(matches!(
            intake.refresh_stats(),
            Err(IntakeError::Stats { .. })
        ));
        assert_eq!(intake.snapshot().unwrap().client_count("42"), 2);
    }

    #[test]
    #[traced_test]
    fn test_same_second_repeat_is_rate_limited() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        let mut intake = open(&dir, &clock);

        assert_eq!(intake.process("3_x_42_first").unwrap(), Verdict::Accepted);
        clock.advance_millis(200);
        let verdict = intake.process("3_x_42_second").unwrap();
        assert_eq!(verdict, Verdict::RateLimited);
        assert_eq!(verdict.response(), "Error: Rate Limiting");
        assert!(!verdict.refreshes_stats());
        assert!(logs_contain("Skipping log due to repeat logger"));

        let lines = logged(&intake);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "3_x_42_first");
        assert!(lines[1].ends_with("_Rate Limiting Client_42"));

        clock.advance_millis(1_000);
        assert_eq!(intake.process("3_x_42_third").unwrap(), Verdict::Accepted);
        assert_eq!(logged(&intake).last().unwrap(), "3_x_42_third");
    }

    #[test]
    fn test_one_notice_per_client_streak() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        let mut intake = open(&dir, &clock);

        intake.process("3_x_1_a").unwrap();
        intake.process("3_x_2_a").unwrap();
        intake.process("3_x_1_b").unwrap();
        intake.process("3_x_1_c").unwrap();
        intake.process("3_x_2_b").unwrap();

        let notices: Vec<String> = logged(&intake)
            .into_iter()
            .filter(|line| line.contains("_Rate Limiting Client_"))
            .collect();
        assert_eq!(notices.len(), 2);
        assert!(notices[0].ends_with("_1"));
        assert!(notices[1].ends_with("_2"));
    }

    #[test]
    fn test_rate_check_runs_before_range_validation() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        let mut intake = open(&dir, &clock);

        // out of range, but both fields parse so the client is still tracked
        assert!(matches!(
            intake.process("42_x_42_too loud").unwrap(),
            Verdict::Rejected(_)
        ));
        assert_eq!(intake.process("3_x_42_fine").unwrap(), Verdict::RateLimited);
    }

    #[test]
    fn test_unparseable_fields_skip_rate_limiting() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        let mut intake = open(&dir, &clock);

        for _ in 0..3 {
            assert!(matches!(
                intake.process("x_x_42_oops").unwrap(),
                Verdict::Rejected(_)
            ));
        }
        assert_eq!(intake.process("3_x_42_fine").unwrap(), Verdict::Accepted);
    }

    #[test]
    fn test_refresh_stats_writes_dated_snapshot() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        let mut intake = open(&dir, &clock);

        intake.process("3_x_42_disk full").unwrap();
        let path = intake.refresh_stats().unwrap();
        assert_eq!(
            path,
            intake.stats_writer().snapshot_path(clock.now().date_naive())
        );
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("Client ID: 42 , Total Logs: 1"));
        assert!(contents.contains("Log-level ID: 3 , Total Logs: 1"));

        let snapshot = intake.snapshot().unwrap();
        assert_eq!(snapshot.client_count("42"), 1);
    }

    #[test]
    fn test_snapshot_computes_when_never_refreshed() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        let mut intake = open(&dir, &clock);
        intake.process("3_x_42_disk full").unwrap();

        assert_eq!(intake.snapshot().unwrap().level_count("3"), 1);
    }

    #[test]
    fn test_verdict_response_for_rejection_concatenates() {
        let verdict = Verdict::Rejected(vec![
            FieldParseError::LogLevel.into(),
            FieldParseError::ClientId.into(),
        ]);
        assert_eq!(verdict.response(), "Log Level Not an integerID not an Integer");
        assert!(verdict.refreshes_stats());
    }
}

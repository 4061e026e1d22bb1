// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-client and per-level message counts over the whole current log.
//!
//! A snapshot holds no state of its own: it is always recomputed from every line
//! of the log file and then written over the day's statistics file. Rows keep the
//! order in which their key first appears in the log.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use indexmap::IndexMap;
use tracing::debug;

use crate::constants::{FIELD_DELIMITER, MIN_STATS_FIELDS, STATS_DATE_FORMAT};
use crate::errors::IntakeError;

const CLIENT_SECTION_HEADER: &str = "********** Statistics Based on Clients **********";
const LEVEL_SECTION_HEADER: &str = "********* Statistics Based on Log-level *********";
const SECTION_RULE: &str = "-------------------------------------------------";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub per_client: IndexMap<String, u64>,
    pub per_level: IndexMap<String, u64>,
}

impl StatsSnapshot {
    /// Counts every line with at least four fields, keyed by the text of the
    /// client id field and of the log level field. Shorter lines are ignored.
    pub fn recompute<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut snapshot = Self::default();
        for line in lines {
            let fields: Vec<&str> = line.as_ref().split(FIELD_DELIMITER).collect();
            if fields.len() < MIN_STATS_FIELDS {
                continue;
            }
            *snapshot.per_client.entry(fields[2].to_owned()).or_insert(0) += 1;
            *snapshot.per_level.entry(fields[0].to_owned()).or_insert(0) += 1;
        }
        snapshot
    }

    pub fn client_count(&self, client_id: &str) -> u64 {
        self.per_client.get(client_id).copied().unwrap_or(0)
    }

    pub fn level_count(&self, log_level: &str) -> u64 {
        self.per_level.get(log_level).copied().unwrap_or(0)
    }

    /// The text written to the statistics file.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = writeln!(out, "{}", CLIENT_SECTION_HEADER);
        let _ = writeln!(out, "{}", SECTION_RULE);
        for (client, count) in &self.per_client {
            let _ = writeln!(out, "Client ID: {} , Total Logs: {}", client, count);
        }
        out.push_str("\n\n");
        let _ = writeln!(out, "{}", LEVEL_SECTION_HEADER);
        let _ = writeln!(out, "{}", SECTION_RULE);
        for (level, count) in &self.per_level {
            let _ = writeln!(out, "Log-level ID: {} , Total Logs: {}", level, count);
        }
        out
    }
}

/// Writes snapshots into one file per calendar day.
#[derive(Debug)]
pub struct StatsWriter {
    directory: PathBuf,
}

impl StatsWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn snapshot_path(&self, date: NaiveDate) -> PathBuf {
        self.directory
            .join(format!("stats_{}.txt", date.format(STATS_DATE_FORMAT)))
    }

    pub fn ensure_directory(&self) -> Result<(), IntakeError> {
        fs::create_dir_all(&self.directory).map_err(|source| IntakeError::Stats {
            path: self.directory.clone(),
            source,
        })
    }

    /// Overwrites the snapshot file for `date`.
    pub fn write_snapshot(
        &self,
        date: NaiveDate,
        snapshot: &StatsSnapshot,
    ) -> Result<PathBuf, IntakeError> {
        let path = self.snapshot_path(date);
        write_file(&path, &snapshot.render())?;
        debug!(
            "Wrote statistics for {} clients and {} levels to {}",
            snapshot.per_client.len(),
            snapshot.per_level.len(),
            path.display()
        );
        Ok(path)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), IntakeError> {
    fs::write(path, contents).map_err(|source| IntakeError::Stats {
        path: path.to_path_buf(),
        source,
    })
}

// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Append-only text log of accepted messages.
//!
//! One log file is current per run. On startup an existing file is renamed with a
//! timestamp suffix and a fresh file is started with a banner line. Prior files
//! are never deleted or overwritten.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::constants::{NOTICE_TIMESTAMP_FORMAT, ROTATION_TIMESTAMP_FORMAT};
use crate::errors::IntakeError;

#[derive(Debug)]
pub struct LogStore {
    directory: PathBuf,
    path: PathBuf,
}

impl LogStore {
    pub fn new(directory: impl Into<PathBuf>, file_name: &str) -> Self {
        let directory = directory.into();
        let path = directory.join(file_name);
        Self { directory, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves an existing log aside and starts a fresh one with the banner line.
    /// Returns the backup path when there was something to rotate.
    pub fn rotate(&self, now: DateTime<Local>) -> Result<Option<PathBuf>, IntakeError> {
        fs::create_dir_all(&self.directory).map_err(|e| self.io_error(e))?;

        let stamp = now.format(ROTATION_TIMESTAMP_FORMAT).to_string();
        let backup = if self.path.is_file() {
            let backup = self.backup_path(&stamp);
            fs::rename(&self.path, &backup).map_err(|e| self.io_error(e))?;
            info!("Rotated previous log to {}", backup.display());
            Some(backup)
        } else {
            None
        };

        let mut file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        writeln!(file, "***** Server Started at {} and Listening *****", stamp)
            .map_err(|e| self.io_error(e))?;
        Ok(backup)
    }

    /// `log_<stamp>.txt`, with a counter appended if a restart within the same
    /// second already used that name.
    fn backup_path(&self, stamp: &str) -> PathBuf {
        let mut candidate = self.directory.join(format!("log_{}.txt", stamp));
        let mut attempt = 1;
        while candidate.exists() {
            candidate = self
                .directory
                .join(format!("log_{}-{}.txt", stamp, attempt));
            attempt += 1;
        }
        candidate
    }

    pub fn append(&self, raw_message: &str) -> Result<(), IntakeError> {
        self.append_line(raw_message)
    }

    /// Records that `client_id` has started being rate limited.
    pub fn append_rate_limit_notice(
        &self,
        client_id: i64,
        now: DateTime<Local>,
    ) -> Result<(), IntakeError> {
        let line = format!(
            "{}_Rate Limiting Client_{}",
            now.format(NOTICE_TIMESTAMP_FORMAT),
            client_id
        );
        self.append_line(&line)
    }

    fn append_line(&self, line: &str) -> Result<(), IntakeError> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{}", line).map_err(|e| self.io_error(e))?;
        file.flush().map_err(|e| self.io_error(e))?;
        debug!("Appended {} bytes to {}", line.len() + 1, self.path.display());
        Ok(())
    }

    /// Every line of the current log, oldest first.
    pub fn read_all(&self) -> Result<Vec<String>, IntakeError> {
        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        BufReader::new(file)
            .lines()
            .collect::<io::Result<Vec<String>>>()
            .map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: io::Error) -> IntakeError {
        IntakeError::LogStore {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn started_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2022, 2, 15, 9, 5, 7).unwrap()
    }

    #[test]
    fn test_rotate_without_previous_log_writes_banner() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path(), "log.txt");

        assert_eq!(store.rotate(started_at()).unwrap(), None);
        assert_eq!(
            store.read_all().unwrap(),
            vec!["***** Server Started at Feb-15-2022-09-05-07 and Listening *****"]
        );
    }

    #[test]
    fn test_rotate_renames_previous_log() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("log.txt"), "1_x_1_old\n").unwrap();
        let store = LogStore::new(dir.path(), "log.txt");

        let backup = store.rotate(started_at()).unwrap().unwrap();
        assert_eq!(backup, dir.path().join("log_Feb-15-2022-09-05-07.txt"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "1_x_1_old\n");
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_rotate_never_overwrites_a_backup() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path(), "log.txt");
        store.rotate(started_at()).unwrap();
        store.append("1_x_1_first run").unwrap();
        let first = store.rotate(started_at()).unwrap().unwrap();
        store.append("1_x_1_second run").unwrap();
        let second = store.rotate(started_at()).unwrap().unwrap();

        assert_ne!(first, second);
        assert_eq!(second, dir.path().join("log_Feb-15-2022-09-05-07-1.txt"));
        assert!(fs::read_to_string(&first).unwrap().contains("first run"));
        assert!(fs::read_to_string(&second).unwrap().contains("second run"));
    }

    #[test]
    fn test_rotate_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path().join("nested/logs"), "log.txt");
        store.rotate(started_at()).unwrap();
        assert!(store.path().is_file());
    }

    #[test]
    fn test_append_is_verbatim_and_ordered() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path(), "log.txt");
        store.rotate(started_at()).unwrap();
        store.append("3_x_42_disk full").unwrap();
        store.append("1_r_7_a_b__c").unwrap();

        let lines = store.read_all().unwrap();
        assert_eq!(&lines[1..], &["3_x_42_disk full", "1_r_7_a_b__c"]);
    }

    #[test]
    fn test_rate_limit_notice_line() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path(), "log.txt");
        store.rotate(started_at()).unwrap();
        store.append_rate_limit_notice(42, started_at()).unwrap();

        let lines = store.read_all().unwrap();
        assert_eq!(
            lines[1],
            "2022-02-15 09:05:07.000000_Rate Limiting Client_42"
        );
    }

    #[test]
    fn test_read_all_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path(), "log.txt");
        let error = store.read_all().unwrap_err();
        assert!(matches!(error, IntakeError::LogStore { .. }));
    }
}

// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Parsing and validation of inbound log messages.
//!
//! A message has the shape `<level>_<reserved>_<client id>_<payload>`. Parsing is
//! split in two steps so the rate limiter can run between them: [`parse`] only
//! extracts the two integer fields, [`ParsedMessage::validate`] then checks their
//! ranges and collects every problem found, not just the first.

use std::num::IntErrorKind;

use crate::constants::{
    FIELD_DELIMITER, MAX_CLIENT_ID, MAX_LOG_LEVEL, MIN_CLIENT_ID, MIN_LOG_LEVEL,
    SENTINEL_CLIENT_ID, SENTINEL_LOG_LEVEL,
};
use crate::errors::{FieldParseError, RangeError, Violation};

/// A message that passed every check. The raw text is what gets persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub log_level: i64,
    pub client_id: i64,
    pub payload: String,
    raw: String,
}

impl LogRecord {
    /// The message exactly as it arrived on the wire.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Outcome of splitting a message and parsing its integer fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage<'a> {
    raw: &'a str,
    log_level: Result<i64, FieldParseError>,
    client_id: Result<i64, FieldParseError>,
    payload: String,
}

pub fn parse(raw: &str) -> ParsedMessage<'_> {
    let fields: Vec<&str> = raw.split(FIELD_DELIMITER).collect();

    let log_level = fields
        .first()
        .and_then(|field| parse_int(field))
        .ok_or(FieldParseError::LogLevel);
    let client_id = fields
        .get(2)
        .and_then(|field| parse_int(field))
        .ok_or(FieldParseError::ClientId);
    let payload = raw
        .splitn(4, FIELD_DELIMITER)
        .nth(3)
        .unwrap_or_default()
        .to_owned();

    ParsedMessage {
        raw,
        log_level,
        client_id,
        payload,
    }
}

/// Parses an integer field. Surrounding whitespace and a sign are allowed, and
/// values beyond 64 bits saturate so they fail the range check rather than the
/// integer check.
fn parse_int(field: &str) -> Option<i64> {
    match field.trim().parse::<i64>() {
        Ok(value) => Some(value),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

impl<'a> ParsedMessage<'a> {
    /// `(log_level, client_id)` when both integer fields parsed. Only such
    /// messages are subject to rate limiting.
    pub fn identity(&self) -> Option<(i64, i64)> {
        match (self.log_level, self.client_id) {
            (Ok(level), Ok(client)) => Some((level, client)),
            _ => None,
        }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Runs the range checks and refuses messages containing a line break.
    /// Fields that failed to parse are replaced by sentinels, which are always
    /// in range, so each problem is reported once.
    pub fn validate(self) -> Result<LogRecord, Vec<Violation>> {
        let mut violations = Vec::new();

        let log_level = self.log_level.unwrap_or_else(|e| {
            violations.push(Violation::from(e));
            SENTINEL_LOG_LEVEL
        });
        let client_id = self.client_id.unwrap_or_else(|e| {
            violations.push(Violation::from(e));
            SENTINEL_CLIENT_ID
        });

        if !(MIN_LOG_LEVEL..=MAX_LOG_LEVEL).contains(&log_level) {
            violations.push(RangeError::LogLevel(log_level).into());
        }
        if !(MIN_CLIENT_ID..=MAX_CLIENT_ID).contains(&client_id) {
            violations.push(RangeError::ClientId(client_id).into());
        }
        // one accepted message is exactly one log line
        if self.raw.contains(|c: char| c == '\n' || c == '\r') {
            violations.push(Violation::LineBreak);
        }

        if !violations.is_empty() {
            return Err(violations);
        }
        Ok(LogRecord {
            log_level,
            client_id,
            payload: self.payload,
            raw: self.raw.to_owned(),
        })
    }
}

/// Joins violation fragments into the response text, without separators.
pub fn describe(violations: &[Violation]) -> String {
    violations.iter().map(ToString::to_string).collect()
}

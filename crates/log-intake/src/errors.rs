// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for the intake pipeline.
//!
//! Validation failures carry the exact text fragments that are sent back to the
//! client, so `to_string()` on a [`Violation`] is its wire representation.

use std::io;
use std::path::PathBuf;

/// Inbound bytes could not be turned into text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("frame of {0} bytes is shorter than the 2 byte length prefix")]
    Truncated(usize),
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Outbound text could not be framed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("response of {0} bytes does not fit the 2 byte length prefix")]
    TooLong(usize),
}

/// An integer field of the message did not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldParseError {
    #[error("Log Level Not an integer")]
    LogLevel,
    #[error("ID not an Integer")]
    ClientId,
}

/// An integer field parsed but lies outside its accepted bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("Error - Log Level not in range")]
    LogLevel(i64),
    #[error("Error - ClientID not in range")]
    ClientId(i64),
}

/// Any reason a decoded message is refused by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error(transparent)]
    FieldParse(#[from] FieldParseError),
    #[error(transparent)]
    Range(#[from] RangeError),
    /// The message would occupy more than one line of the log file.
    #[error("Error - Message contains a line break")]
    LineBreak,
}

/// Failures of the stateful side of the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("log store I/O failed on {}: {source}", .path.display())]
    LogStore { path: PathBuf, source: io::Error },
    #[error("statistics I/O failed on {}: {source}", .path.display())]
    Stats { path: PathBuf, source: io::Error },
    #[error("intake service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },
    #[error("connection I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Intake(#[from] IntakeError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

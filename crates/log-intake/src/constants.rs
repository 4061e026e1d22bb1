// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Field separator of a log message: `<level>_<reserved>_<client id>_<payload>`.
pub const FIELD_DELIMITER: char = '_';

/// Lowest and highest accepted log level.
pub const MIN_LOG_LEVEL: i64 = 1;
pub const MAX_LOG_LEVEL: i64 = 10;

/// Lowest and highest accepted client id.
pub const MIN_CLIENT_ID: i64 = 1;
pub const MAX_CLIENT_ID: i64 = 10_000;

/// Stand-in values used once a field failed to parse, so the range checks still run.
pub const SENTINEL_LOG_LEVEL: i64 = 10;
pub const SENTINEL_CLIENT_ID: i64 = 1;

/// A line needs at least this many fields to be counted in the statistics.
/// Rate limit notices and the startup banner have fewer and are skipped.
pub const MIN_STATS_FIELDS: usize = 4;

/// Decoded payload that stops the server loop once it has been answered.
pub const SHUTDOWN_SENTINEL: &str = "quit";

/// Bytes read from a connection. One read is one message.
pub const READ_BUFFER_SIZE: usize = 1024;

pub const RESPONSE_ACCEPTED: &str = "Info - Logging successful";
pub const RESPONSE_RATE_LIMITED: &str = "Error: Rate Limiting";
pub const RESPONSE_UNDECODABLE: &str = "Error - Message could not be decoded";

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_BIND_PORT: u16 = 30000;
pub const DEFAULT_LOG_FILE_NAME: &str = "log.txt";

/// Timestamp used in the startup banner and in rotated log file names.
pub const ROTATION_TIMESTAMP_FORMAT: &str = "%b-%d-%Y-%H-%M-%S";
/// Date used in the statistics file name.
pub const STATS_DATE_FORMAT: &str = "%b-%d-%Y";
/// Timestamp written in front of a rate limit notice.
pub const NOTICE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

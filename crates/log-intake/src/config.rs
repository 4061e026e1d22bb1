// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::{Path, PathBuf};

use crate::codec::WireFormat;
use crate::constants::{DEFAULT_BIND_ADDRESS, DEFAULT_BIND_PORT, DEFAULT_LOG_FILE_NAME};
use crate::errors::ConfigError;

/// Read-only settings consumed by the intake service and the server loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeConfig {
    /// Address to bind the listening socket to (e.g., "127.0.0.1")
    pub bind_address: String,
    /// Port to listen on. 0 picks an ephemeral port.
    pub bind_port: u16,
    /// Directory holding the current log and its rotated predecessors
    pub log_directory: PathBuf,
    /// File name of the current log inside `log_directory`
    pub log_file_name: String,
    /// Directory receiving the daily statistics snapshots
    pub stats_directory: PathBuf,
    /// Transcoding agreed with clients
    pub wire_format: WireFormat,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            bind_port: DEFAULT_BIND_PORT,
            log_directory: PathBuf::from("."),
            log_file_name: DEFAULT_LOG_FILE_NAME.to_string(),
            stats_directory: PathBuf::from("."),
            wire_format: WireFormat::default(),
        }
    }
}

impl IntakeConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_address =
            env::var("LOG_INTAKE_HOST").unwrap_or_else(|_| defaults.bind_address.clone());
        let bind_port = match env::var("LOG_INTAKE_PORT") {
            Ok(port) => port.trim().parse::<u16>().map_err(|_| {
                ConfigError::Invalid(format!("LOG_INTAKE_PORT '{}' is not a valid port", port))
            })?,
            Err(_) => defaults.bind_port,
        };
        let log_directory = env::var("LOG_INTAKE_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.log_directory);
        let log_file_name =
            env::var("LOG_INTAKE_LOG_FILE").unwrap_or(defaults.log_file_name);
        let stats_directory = env::var("LOG_INTAKE_STATS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.stats_directory);
        let wire_format = match env::var("LOG_INTAKE_WIRE_FORMAT") {
            Ok(format) => format.parse::<WireFormat>()?,
            Err(_) => defaults.wire_format,
        };

        let config = Self {
            bind_address,
            bind_port,
            log_directory,
            log_file_name,
            stats_directory,
            wire_format,
        };

        config.validate()?;
        Ok(config)
    }

    /// Settings for a server on an ephemeral loopback port that keeps its log and
    /// statistics under `directory`.
    pub fn for_directory(directory: &Path) -> Self {
        Self {
            bind_port: 0,
            log_directory: directory.to_path_buf(),
            stats_directory: directory.to_path_buf(),
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_port == 0 {
            return Err(ConfigError::Invalid(
                "Port must be greater than 0".to_string(),
            ));
        }

        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "LOG_INTAKE_HOST cannot be empty".to_string(),
            ));
        }

        let file_name = self.log_file_name.trim();
        if file_name.is_empty() {
            return Err(ConfigError::Invalid(
                "LOG_INTAKE_LOG_FILE cannot be empty".to_string(),
            ));
        }
        if Path::new(file_name).components().count() != 1 {
            return Err(ConfigError::Invalid(format!(
                "LOG_INTAKE_LOG_FILE '{}' must be a bare file name",
                file_name
            )));
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

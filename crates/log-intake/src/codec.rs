// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Text transcoding for one request/response exchange.
//!
//! One socket read is one message and one write is one response; nothing here
//! buffers or splits across reads. The default [`WireFormat::Java`] matches what
//! Java clients produce with `DataOutputStream::writeUTF`: a big-endian `u16`
//! byte count followed by the UTF-8 text.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::errors::{ConfigError, DecodeError, EncodeError};

const LENGTH_PREFIX_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// `u16` big-endian length prefix followed by UTF-8.
    #[default]
    Java,
    /// Bare UTF-8.
    Plain,
}

impl WireFormat {
    pub fn encode(self, text: &str) -> Result<Vec<u8>, EncodeError> {
        match self {
            WireFormat::Java => {
                let len =
                    u16::try_from(text.len()).map_err(|_| EncodeError::TooLong(text.len()))?;
                let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + text.len());
                buf.extend_from_slice(&len.to_be_bytes());
                buf.extend_from_slice(text.as_bytes());
                Ok(buf)
            }
            WireFormat::Plain => Ok(text.as_bytes().to_vec()),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String, DecodeError> {
        let body = match self {
            WireFormat::Java => {
                if bytes.len() < LENGTH_PREFIX_SIZE {
                    return Err(DecodeError::Truncated(bytes.len()));
                }
                let (prefix, body) = bytes.split_at(LENGTH_PREFIX_SIZE);
                let declared = usize::from(u16::from_be_bytes([prefix[0], prefix[1]]));
                if declared != body.len() {
                    // no framing: whatever arrived in this read is the message
                    debug!(
                        "Length prefix declares {} bytes but {} arrived",
                        declared,
                        body.len()
                    );
                }
                body
            }
            WireFormat::Plain => bytes,
        };
        Ok(std::str::from_utf8(body)?.to_owned())
    }
}

impl FromStr for WireFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "java" => Ok(WireFormat::Java),
            "plain" => Ok(WireFormat::Plain),
            other => Err(ConfigError::Invalid(format!(
                "Unknown wire format '{}'. Must be one of: java, plain",
                other
            ))),
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireFormat::Java => write!(f, "java"),
            WireFormat::Plain => write!(f, "plain"),
        }
    }
}

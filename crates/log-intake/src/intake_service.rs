// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Single owner of the intake state.
//!
//! The rate limit map, the log file and the statistics read-then-write cycle are
//! only ever touched from the task running [`IntakeService::run`]. Connections talk
//! to it through a cloneable [`IntakeHandle`], so a statistics scan can never
//! observe a half-written append no matter how many connections are in flight.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::clock::Clock;
use crate::config::IntakeConfig;
use crate::errors::IntakeError;
use crate::handler::{Intake, Verdict};
use crate::stats::StatsSnapshot;

#[derive(Debug)]
pub enum IntakeCommand {
    Submit {
        message: String,
        response_tx: oneshot::Sender<Result<Verdict, IntakeError>>,
    },
    Snapshot(oneshot::Sender<Result<StatsSnapshot, IntakeError>>),
    Shutdown,
}

#[derive(Clone)]
pub struct IntakeHandle {
    tx: mpsc::UnboundedSender<IntakeCommand>,
}

impl IntakeHandle {
    /// Runs one decoded message through the pipeline. Resolves once the verdict
    /// is known; statistics are refreshed by the service afterwards.
    pub async fn submit(&self, message: String) -> Result<Verdict, IntakeError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(IntakeCommand::Submit {
                message,
                response_tx,
            })
            .map_err(|e| {
                IntakeError::ServiceUnavailable(format!("Failed to send submit command: {}", e))
            })?;

        response_rx.await.map_err(|e| {
            IntakeError::ServiceUnavailable(format!("Failed to receive verdict: {}", e))
        })?
    }

    pub async fn snapshot(&self) -> Result<StatsSnapshot, IntakeError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(IntakeCommand::Snapshot(response_tx))
            .map_err(|e| {
                IntakeError::ServiceUnavailable(format!("Failed to send snapshot command: {}", e))
            })?;

        response_rx.await.map_err(|e| {
            IntakeError::ServiceUnavailable(format!("Failed to receive snapshot: {}", e))
        })?
    }

    pub fn shutdown(&self) -> Result<(), mpsc::error::SendError<IntakeCommand>> {
        self.tx.send(IntakeCommand::Shutdown)
    }
}

pub struct IntakeService {
    intake: Intake,
    rx: mpsc::UnboundedReceiver<IntakeCommand>,
}

impl IntakeService {
    /// Opens the intake, which rotates the log file. Fails if the log or
    /// statistics locations cannot be prepared.
    pub fn new(config: &IntakeConfig) -> Result<(Self, IntakeHandle), IntakeError> {
        Ok(Self::from_intake(Intake::open(config)?))
    }

    pub fn with_clock(
        config: &IntakeConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, IntakeHandle), IntakeError> {
        Ok(Self::from_intake(Intake::open_with_clock(config, clock)?))
    }

    fn from_intake(intake: Intake) -> (Self, IntakeHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { intake, rx }, IntakeHandle { tx })
    }

    pub async fn run(mut self) {
        debug!("Intake service started");

        while let Some(command) = self.rx.recv().await {
            match command {
                IntakeCommand::Submit {
                    message,
                    response_tx,
                } => {
                    let result = self.intake.process(&message);
                    let verdict = result.as_ref().ok().cloned();
                    if response_tx.send(result).is_err() {
                        error!("Failed to send verdict - receiver dropped");
                    }
                    // after the response so the client is not kept waiting on the rescan
                    if let Some(verdict) = verdict {
                        self.intake.refresh_stats_after(&verdict);
                    }
                }

                IntakeCommand::Snapshot(response_tx) => {
                    if response_tx.send(self.intake.snapshot()).is_err() {
                        error!("Failed to send snapshot - receiver dropped");
                    }
                }

                IntakeCommand::Shutdown => {
                    debug!("Intake service shutting down");
                    break;
                }
            }
        }

        debug!("Intake service stopped");
    }
}

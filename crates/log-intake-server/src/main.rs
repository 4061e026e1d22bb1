// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, process};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use log_intake::{config::IntakeConfig, server::LogServer};
use tokio_util::sync::CancellationToken;

const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[tokio::main]
pub async fn main() {
    let requested_level = env::var("LOG_INTAKE_LOG_LEVEL")
        .map(|val| val.trim().to_lowercase())
        .unwrap_or(DEFAULT_LOG_LEVEL.to_string());
    let log_level = if LOG_LEVELS.contains(&requested_level.as_str()) {
        requested_level.clone()
    } else {
        DEFAULT_LOG_LEVEL.to_string()
    };

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(&log_level).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");
    if requested_level != log_level {
        warn!(
            "Unknown LOG_INTAKE_LOG_LEVEL '{}', falling back to {}",
            requested_level, DEFAULT_LOG_LEVEL
        );
    }

    let config = match IntakeConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Error creating config on log intake startup: {e}");
            process::exit(1);
        }
    };

    let cancel_token = CancellationToken::new();
    let (server, service, handle) = match LogServer::start(&config, cancel_token.clone()).await {
        Ok(started) => started,
        Err(e) => {
            error!("Unable to start log intake server: {e}");
            process::exit(1);
        }
    };
    let service_task = tokio::spawn(service.run());

    let signal_token = cancel_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, shutting down");
                signal_token.cancel();
            }
            Err(e) => error!("Unable to listen for interrupt signal: {e}"),
        }
    });

    server.spin().await;

    if handle.shutdown().is_err() {
        debug!("Intake service already stopped");
    }
    if let Err(e) = service_task.await {
        error!("Intake service task failed: {e}");
    }
    info!("Log intake server stopped");
}

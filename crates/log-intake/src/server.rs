// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! TCP server loop.
//!
//! Connections are served strictly one after another: accept, read one message,
//! submit it, answer, and only then accept the next connection. A client that
//! connects and never sends blocks everyone behind it, which caps throughput at
//! one message per round trip. That is adequate for low-volume structured
//! logging; the intake service would tolerate concurrent connections if this
//! loop ever spawned them.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::codec::WireFormat;
use crate::config::IntakeConfig;
use crate::constants::{READ_BUFFER_SIZE, RESPONSE_UNDECODABLE, SHUTDOWN_SENTINEL};
use crate::errors::ServerError;
use crate::intake_service::{IntakeHandle, IntakeService};

/// What the loop does after a connection has been served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Server accepting one log message per connection.
pub struct LogServer {
    cancel_token: CancellationToken,
    intake_handle: IntakeHandle,
    listener: TcpListener,
    wire_format: WireFormat,
}

impl LogServer {
    /// Binds the listening socket. Messages are forwarded to `intake_handle`.
    pub async fn new(
        config: &IntakeConfig,
        intake_handle: IntakeHandle,
        cancel_token: CancellationToken,
    ) -> Result<LogServer, ServerError> {
        let listener = bind(config).await?;
        Ok(Self::with_listener(listener, config, intake_handle, cancel_token))
    }

    /// Binds the socket first and only then opens the intake, so a failed bind
    /// leaves the previous log file untouched. The returned service must be
    /// spawned before the server starts spinning.
    pub async fn start(
        config: &IntakeConfig,
        cancel_token: CancellationToken,
    ) -> Result<(LogServer, IntakeService, IntakeHandle), ServerError> {
        let listener = bind(config).await?;
        let (service, handle) = IntakeService::new(config)?;
        let server = Self::with_listener(listener, config, handle.clone(), cancel_token);
        Ok((server, service, handle))
    }

    fn with_listener(
        listener: TcpListener,
        config: &IntakeConfig,
        intake_handle: IntakeHandle,
        cancel_token: CancellationToken,
    ) -> LogServer {
        LogServer {
            cancel_token,
            intake_handle,
            listener,
            wire_format: config.wire_format,
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Main loop. Returns once the shutdown message has been answered or the
    /// cancellation token fires.
    pub async fn spin(self) {
        match self.local_addr() {
            Ok(addr) => info!("Server is started and listening on {}", addr),
            Err(_) => info!("Server is started and listening"),
        }

        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                _ = self.cancel_token.cancelled() => {
                    info!("Server cancelled, no longer accepting connections");
                    break;
                }
            };

            let (stream, peer) = match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };
            debug!(%peer, "Accepted connection");

            match self.serve_connection(stream, peer).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => {
                    info!(%peer, "Received shutdown message, closing listener");
                    break;
                }
                Err(e) => error!(%peer, "Failed to serve connection: {}", e),
            }
        }
    }

    async fn serve_connection(
        &self,
        mut stream: TcpStream,
        peer: SocketAddr,
    ) -> Result<Flow, ServerError> {
        let mut buf = [0; READ_BUFFER_SIZE];
        let amt = stream.read(&mut buf).await?;
        if amt == 0 {
            debug!(%peer, "Connection closed before sending a message");
            return Ok(Flow::Continue);
        }

        let message = match self.wire_format.decode(&buf[..amt]) {
            Ok(message) => message,
            Err(e) => {
                warn!(%peer, "Failed to decode message: {}", e);
                self.respond(&mut stream, RESPONSE_UNDECODABLE).await?;
                return Ok(Flow::Continue);
            }
        };
        trace!("Received message: {:?} from {}", message, peer);

        let is_shutdown = message == SHUTDOWN_SENTINEL;
        let verdict = self.intake_handle.submit(message).await?;
        let response = verdict.response();
        self.respond(&mut stream, &response).await?;
        debug!(%peer, "Sent response: {}", response);

        Ok(if is_shutdown { Flow::Stop } else { Flow::Continue })
    }

    async fn respond(&self, stream: &mut TcpStream, response: &str) -> Result<(), ServerError> {
        let encoded = self.wire_format.encode(response)?;
        stream.write_all(&encoded).await?;
        stream.flush().await?;
        Ok(())
    }
}

async fn bind(config: &IntakeConfig) -> Result<TcpListener, ServerError> {
    let addr = config.bind_addr();
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

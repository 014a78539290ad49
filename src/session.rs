// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Per-device connection session owning one WebSocket's full lifecycle.

use std::{fmt::Debug, sync::Arc};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::AUTHORIZATION},
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};
use tokio_util::sync::CancellationToken;

use crate::{
    auth::TokenRefresher,
    common::urls::telemetry_ws_url,
    config::FleetConfig,
    error::{SessionError, SessionResult},
    events::{CameraEvent, parse_telemetry_frame},
    registry::Device,
    sink::EventSink,
    supervisor::ActiveSessions,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One device's connection session.
///
/// Spawned by the supervisor with its entry already present in the active set
/// (state `Connecting`); the session is the exclusive owner of its socket while
/// open and removes its own entry on any exit path, unblocking the next
/// supervisor attempt for this device.
pub struct ConnectionSession {
    device: Device,
    config: FleetConfig,
    sink: Arc<dyn EventSink>,
    refresher: Arc<TokenRefresher>,
    active: Arc<ActiveSessions>,
    cancellation_token: CancellationToken,
}

impl Debug for ConnectionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(ConnectionSession))
            .field("device_id", &self.device.id)
            .field("url", &self.device.url)
            .finish_non_exhaustive()
    }
}

impl ConnectionSession {
    /// Creates a new [`ConnectionSession`] instance.
    #[must_use]
    pub fn new(
        device: Device,
        config: FleetConfig,
        sink: Arc<dyn EventSink>,
        refresher: Arc<TokenRefresher>,
        active: Arc<ActiveSessions>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            device,
            config,
            sink,
            refresher,
            active,
            cancellation_token,
        }
    }

    /// Runs the session to completion.
    ///
    /// On handshake success the receive loop runs until a close frame, a
    /// transport error, or cancellation. On handshake failure the token
    /// refresher is invoked exactly once and the session terminates; the
    /// supervisor's next tick retries the whole connect path.
    pub async fn run(self) {
        let device_id = self.device.id;

        let connected = tokio::select! {
            () = self.cancellation_token.cancelled() => None,
            result = self.connect() => Some(result),
        };

        match connected {
            Some(Ok(stream)) => {
                self.active.mark_open(device_id);
                tracing::info!(device_id = %device_id, "WebSocket open");
                self.receive_loop(stream).await;
            }
            Some(Err(e)) => {
                tracing::error!(
                    device_id = %device_id,
                    error = %e,
                    "Failed to open WebSocket, attempting token refresh",
                );
                match self.refresher.refresh(&self.device).await {
                    Ok(_) => tracing::info!(device_id = %device_id, "Token updated"),
                    Err(e) => {
                        tracing::warn!(device_id = %device_id, error = %e, "Token refresh failed");
                    }
                }
            }
            None => {
                tracing::debug!(device_id = %device_id, "Cancelled before handshake completed");
            }
        }

        self.active.finish(device_id);
        tracing::info!(device_id = %device_id, "Session terminated");
    }

    /// Performs the WebSocket handshake with the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or token cannot form a valid request, or
    /// the handshake fails or exceeds the configured timeout.
    async fn connect(&self) -> SessionResult<WsStream> {
        let url = telemetry_ws_url(&self.device.url);
        tracing::debug!(device_id = %self.device.id, url = %url, "Connecting");

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| SessionError::Handshake(e.to_string()))?;
        let bearer: HeaderValue = format!("Bearer {}", self.device.token)
            .parse()
            .map_err(|_| {
                SessionError::Handshake("Token not representable as a header value".to_string())
            })?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let timeout = self.config.connect_timeout();
        let (stream, _response) = tokio::time::timeout(timeout, connect_async(request))
            .await
            .map_err(|_| {
                SessionError::Timeout(format!("Handshake exceeded {}s", timeout.as_secs()))
            })?
            .map_err(|e| SessionError::Handshake(e.to_string()))?;

        Ok(stream)
    }

    /// Reads frames until a close frame, a transport error, or cancellation.
    ///
    /// A malformed frame is never fatal to the connection.
    async fn receive_loop(&self, mut stream: WsStream) {
        let device_id = self.device.id;

        loop {
            tokio::select! {
                () = self.cancellation_token.cancelled() => {
                    self.close_stream(&mut stream).await;
                    break;
                }
                msg = stream.next() => match msg {
                    Some(Ok(Message::Text(text))) => self.handle_frame(text.as_str()).await,
                    Some(Ok(Message::Ping(payload))) => {
                        if let Err(e) = stream.send(Message::Pong(payload)).await {
                            tracing::warn!(device_id = %device_id, error = %e, "Failed to send pong");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(device_id = %device_id, frame = ?frame, "Received close frame");
                        break;
                    }
                    // Binary and pong frames carry no telemetry
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(device_id = %device_id, error = %e, "Transport error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    /// Decodes one text frame and hands the event to the sink.
    async fn handle_frame(&self, text: &str) {
        let device_id = self.device.id;

        let frame = match parse_telemetry_frame(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(device_id = %device_id, error = %e, "Bad telemetry frame");
                return;
            }
        };

        let event = CameraEvent::from_frame(device_id, frame);
        if let Err(e) = self.sink.append(event).await {
            tracing::warn!(device_id = %device_id, error = %e, "Event sink append failed, event dropped");
        }
    }

    /// Best-effort normal closure, bounded by the configured close timeout.
    async fn close_stream(&self, stream: &mut WsStream) {
        let device_id = self.device.id;
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "shutdown".into(),
        };

        match tokio::time::timeout(self.config.close_timeout(), stream.close(Some(frame))).await {
            Ok(Ok(())) => tracing::debug!(device_id = %device_id, "Close frame sent"),
            Ok(Err(e)) => tracing::debug!(device_id = %device_id, error = %e, "Error closing socket"),
            Err(_) => tracing::warn!(device_id = %device_id, "Socket close timed out"),
        }
    }
}

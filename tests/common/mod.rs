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

//! Mock camera device server backing the integration tests.
//!
//! Serves the two device endpoints the fleet talks to: the telemetry
//! WebSocket (bearer-token gated) and the login endpoint.

#![allow(dead_code)] // Not every test binary exercises every helper

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::sync::Notify;
use visionhub_fleet::{Device, DeviceId, common::Credential};

/// Sample valid telemetry frame matching the device wire format.
pub const VALID_FRAME: &str =
    r#"{"motionDetected":true,"timestamp":"2024-01-01T00:00:00+00:00","object":"person"}"#;

/// Sample frame the telemetry decoder must reject.
pub const MALFORMED_FRAME: &str = r#"{"motion": "lots", "when": "yesterday"}"#;

/// Shared state of one mock camera device.
#[derive(Default)]
pub struct MockDeviceState {
    /// Bearer token accepted on the telemetry WebSocket.
    pub valid_token: Mutex<String>,
    /// Token handed out by the login endpoint.
    pub fresh_token: Mutex<String>,
    /// Whether the login endpoint answers successfully.
    pub login_ok: AtomicBool,
    /// Number of login calls received.
    pub login_calls: AtomicUsize,
    /// Last credentials presented to the login endpoint.
    pub last_login: Mutex<Option<(String, String)>>,
    /// Currently open WebSocket connections.
    pub connections: AtomicUsize,
    /// Total WebSocket connections accepted since start.
    pub total_connections: AtomicUsize,
    /// Frames sent to each accepted connection.
    pub frames: Mutex<Vec<String>>,
    /// When set, the frame script repeats indefinitely.
    pub repeat_frames: AtomicBool,
    /// Signalled to make the device close its side of every open socket.
    pub close_trigger: Notify,
}

impl MockDeviceState {
    /// Creates state for a device accepting `token`, answering logins with
    /// `fresh`.
    pub fn new(token: &str, fresh: &str) -> Arc<Self> {
        let state = Self::default();
        *state.valid_token.lock().unwrap() = token.to_string();
        *state.fresh_token.lock().unwrap() = fresh.to_string();
        state.login_ok.store(true, Ordering::SeqCst);
        Arc::new(state)
    }

    /// Scripts the frames each accepted connection receives.
    pub fn set_frames(&self, frames: &[&str]) {
        *self.frames.lock().unwrap() = frames.iter().map(|f| (*f).to_string()).collect();
    }
}

async fn handle_ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<MockDeviceState>>,
    headers: HeaderMap,
) -> Response {
    let expected = format!("Bearer {}", state.valid_token.lock().unwrap());
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);

    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<MockDeviceState>) {
    state.connections.fetch_add(1, Ordering::SeqCst);
    state.total_connections.fetch_add(1, Ordering::SeqCst);

    let frames: Vec<String> = state.frames.lock().unwrap().clone();

    if state.repeat_frames.load(Ordering::SeqCst) && !frames.is_empty() {
        let mut idx = 0;
        loop {
            tokio::select! {
                msg = socket.recv() => match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                },
                () = state.close_trigger.notified() => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                () = tokio::time::sleep(Duration::from_millis(10)) => {
                    let frame = frames[idx % frames.len()].clone();
                    idx += 1;
                    if socket.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    } else {
        for frame in frames {
            if socket.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }

        // Hold the connection open until the peer closes or we are told to
        loop {
            tokio::select! {
                msg = socket.recv() => match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                },
                () = state.close_trigger.notified() => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }

    state.connections.fetch_sub(1, Ordering::SeqCst);
}

async fn handle_login(
    State(state): State<Arc<MockDeviceState>>,
    Json(body): Json<Value>,
) -> Response {
    state.login_calls.fetch_add(1, Ordering::SeqCst);

    let username = body.get("username").and_then(|v| v.as_str());
    let password = body.get("password").and_then(|v| v.as_str());
    if let (Some(username), Some(password)) = (username, password) {
        *state.last_login.lock().unwrap() = Some((username.to_string(), password.to_string()));
    }

    if !state.login_ok.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let token = state.fresh_token.lock().unwrap().clone();
    Json(json!({"token": token})).into_response()
}

/// Starts a mock device server, returning its bound address.
pub async fn start_mock_device(state: Arc<MockDeviceState>) -> SocketAddr {
    let router = Router::new()
        .route("/camera/ws", get(handle_ws_upgrade))
        .route("/login", post(handle_login))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock device listener");
    let addr = listener.local_addr().expect("missing local addr");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("mock device server failed");
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

/// Builds a registered [`Device`] pointing at a mock device server.
pub fn device_for(addr: SocketAddr, id: u32, token: &str) -> Device {
    Device {
        id: DeviceId(id),
        name: format!("cam-{id}"),
        url: format!("http://{addr}"),
        credential: Credential::new("operator", "secret"),
        token: token.to_string(),
        owner_id: Some(1),
    }
}

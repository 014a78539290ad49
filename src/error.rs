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

//! Error types for connection sessions and token refresh.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Error types for a device connection session.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// WebSocket handshake was refused or failed to complete.
    #[error("Handshake error: {0}")]
    Handshake(String),
    /// Transport-level error on an established connection.
    #[error("Transport error: {0}")]
    Transport(String),
    /// A bounded operation exceeded its timeout.
    #[error("Timeout: {0}")]
    Timeout(String),
    /// Telemetry frame could not be decoded.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<tungstenite::Error> for SessionError {
    fn from(error: tungstenite::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Error types for the token refresher.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Transport-level error issuing the login call.
    #[error("HTTP error: {0}")]
    Http(String),
    /// Device answered the login call with a non-success status.
    #[error("Login rejected with status {status}")]
    Status {
        /// HTTP status code returned by the device.
        status: u16,
    },
    /// Login response body could not be decoded.
    #[error("Malformed login response: {0}")]
    MalformedResponse(String),
    /// The refreshed token could not be persisted to the registry.
    #[error("Registry error: {0}")]
    Registry(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.to_string())
    }
}

/// Result type alias for token refresh operations.
pub type AuthResult<T> = Result<T, AuthError>;

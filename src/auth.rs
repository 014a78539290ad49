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

//! Token refresh against a device's login endpoint.

use std::{fmt::Debug, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    common::{consts::VISIONHUB_USER_AGENT, urls::login_url},
    error::{AuthError, AuthResult},
    registry::{Device, DeviceRegistry},
};

/// Login request body sent to the device.
#[derive(Debug, Clone, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Successful login response body.
#[derive(Debug, Clone, Deserialize)]
struct LoginResponse {
    token: String,
}

/// Obtains and persists a fresh bearer token for a device.
///
/// Invoked at most once per failed connect attempt and never retried
/// internally; an unreachable device simply stays offline until the next
/// supervisor tick retries the whole connect path.
pub struct TokenRefresher {
    client: reqwest::Client,
    registry: Arc<dyn DeviceRegistry>,
}

impl Debug for TokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(TokenRefresher))
            .finish_non_exhaustive()
    }
}

impl TokenRefresher {
    /// Creates a new [`TokenRefresher`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(registry: Arc<dyn DeviceRegistry>, login_timeout: Duration) -> AuthResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(VISIONHUB_USER_AGENT)
            .timeout(login_timeout)
            .build()
            .map_err(|e| AuthError::Http(e.to_string()))?;

        Ok(Self { client, registry })
    }

    /// Logs in to the device and persists the returned token to the registry.
    ///
    /// On any failure the old token is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the login call fails at the transport level, the
    /// device answers with a non-success status, the response body is
    /// malformed, or the registry rejects the token write.
    pub async fn refresh(&self, device: &Device) -> AuthResult<String> {
        let url = login_url(&device.url);
        tracing::debug!(device_id = %device.id, url = %url, "Requesting fresh token");

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                username: device.credential.username(),
                password: device.credential.password(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Status {
                status: status.as_u16(),
            });
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        self.registry
            .update_token(device.id, body.token.clone())
            .await
            .map_err(|e| AuthError::Registry(e.to_string()))?;

        Ok(body.token)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_login_request_wire_format() {
        let request = LoginRequest {
            username: "operator",
            password: "secret",
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"username": "operator", "password": "secret"})
        );
    }

    #[rstest]
    fn test_login_response_decode() {
        let body: LoginResponse = serde_json::from_str(r#"{"token": "abc123"}"#).unwrap();
        assert_eq!(body.token, "abc123");
    }

    #[rstest]
    fn test_login_response_rejects_missing_token() {
        assert!(serde_json::from_str::<LoginResponse>(r#"{"jwt": "abc123"}"#).is_err());
    }
}

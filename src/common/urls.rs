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

//! Derivation of device endpoint URLs from the registered HTTP(S) base URL.

use super::consts::{DEVICE_LOGIN_PATH, DEVICE_WS_PATH};

/// Derives the telemetry WebSocket URL for a device.
///
/// Rewrites the scheme of the device's HTTP(S) base URL to ws(s) and appends
/// the well-known telemetry path. A base URL already carrying a ws(s) scheme
/// is used as-is.
#[must_use]
pub fn telemetry_ws_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let rewritten = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{rewritten}{DEVICE_WS_PATH}")
}

/// Derives the login URL for a device.
#[must_use]
pub fn login_url(base_url: &str) -> String {
    format!("{}{DEVICE_LOGIN_PATH}", base_url.trim_end_matches('/'))
}

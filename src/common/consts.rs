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

//! Core constants for the camera device API.

/// Well-known telemetry WebSocket path exposed by every camera device.
pub const DEVICE_WS_PATH: &str = "/camera/ws";

/// Well-known login path exposed by every camera device.
pub const DEVICE_LOGIN_PATH: &str = "/login";

/// User agent sent with HTTP requests to devices.
pub const VISIONHUB_USER_AGENT: &str = concat!("VisionHubFleet/", env!("CARGO_PKG_VERSION"));

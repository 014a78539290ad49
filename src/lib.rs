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

//! Camera fleet manager for the VisionHub telemetry plane.
//!
//! Maintains one persistent WebSocket session per registered camera device,
//! decodes inbound motion-detection frames and appends them to an event sink.
//! Connections authenticate with a per-device bearer token; a failed handshake
//! triggers a single out-of-band token refresh against the device's login
//! endpoint before the device is retried on the next supervisor tick.
//!
//! The crate is organised around three actors:
//!
//! - [`supervisor::FleetSupervisor`] — periodic reconciliation of the device
//!   registry against the set of live sessions, plus graceful shutdown.
//! - [`session::ConnectionSession`] — owns the full lifecycle of one device's
//!   socket: handshake, receive loop, termination.
//! - [`auth::TokenRefresher`] — obtains and persists a fresh bearer token for
//!   a device whose connection attempt failed.
//!
//! Device storage and event persistence are external collaborators reached
//! through the [`registry::DeviceRegistry`] and [`sink::EventSink`] traits.

pub mod auth;
pub mod common;
pub mod config;
pub mod error;
pub mod events;
pub mod registry;
pub mod session;
pub mod sink;
pub mod supervisor;
pub mod testing;

pub use auth::TokenRefresher;
pub use common::Credential;
pub use config::FleetConfig;
pub use error::{AuthError, SessionError};
pub use events::{CameraEvent, TelemetryFrame};
pub use registry::{Device, DeviceId, DeviceRegistry, InMemoryDeviceRegistry};
pub use session::ConnectionSession;
pub use sink::{EventSink, LogEventSink, MemoryEventSink};
pub use supervisor::{ActiveSessions, ConnectionState, FleetSupervisor};

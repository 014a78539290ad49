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

//! Runs the camera fleet supervisor against a JSON-defined device fleet.
//!
//! Decoded events are written to the log stream. Stop with ctrl-c; the
//! supervisor closes every open session before exiting.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin fleet -- devices.json
//! ```
//!
//! The fleet file is an array of devices:
//!
//! ```json
//! [
//!   {
//!     "id": 1,
//!     "name": "lobby",
//!     "url": "http://10.0.0.5:8080",
//!     "credential": {"username": "operator", "password": "secret"},
//!     "token": ""
//!   }
//! ]
//! ```

use std::{env, sync::Arc};

use tokio::signal;
use tracing_subscriber::EnvFilter;
use visionhub_fleet::{
    Device, FleetConfig, FleetSupervisor, InMemoryDeviceRegistry, LogEventSink,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Usage: fleet <devices.json>"))?;

    let contents = std::fs::read_to_string(&path)?;
    let devices: Vec<Device> = serde_json::from_str(&contents)?;
    tracing::info!(count = devices.len(), path = %path, "Loaded device fleet");

    let registry = Arc::new(InMemoryDeviceRegistry::with_devices(devices));
    let sink = Arc::new(LogEventSink::new());

    let mut supervisor = FleetSupervisor::new(FleetConfig::default(), registry, sink)?;
    let stop = supervisor.cancellation_token();

    let handle = tokio::spawn(async move { supervisor.run().await });

    signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    stop.cancel();

    handle.await?;
    Ok(())
}

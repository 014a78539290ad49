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

//! Device model and the registry collaborator surface.

use std::fmt::Display;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::common::credential::Credential;

/// Unique identifier for a camera device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DeviceId(pub u32);

impl Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered camera device.
///
/// The bearer `token` is the only field mutated by this crate (overwritten on
/// every successful refresh); all other fields are owner-managed elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Device identity.
    pub id: DeviceId,
    /// Display name.
    pub name: String,
    /// HTTP(S) base URL of the device.
    pub url: String,
    /// Login credentials for the device's `/login` endpoint.
    pub credential: Credential,
    /// Current bearer token for the telemetry WebSocket.
    pub token: String,
    /// Owning user, managed by the registration surface.
    #[serde(default)]
    pub owner_id: Option<u32>,
}

/// Collaborator surface supplying the current device fleet.
///
/// Implementations are expected to be cheap to call once per supervisor tick.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Returns the current set of known devices.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    async fn list_devices(&self) -> anyhow::Result<Vec<Device>>;

    /// Persists a freshly obtained bearer token for a device.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is unknown or the store rejects the write.
    async fn update_token(&self, device_id: DeviceId, token: String) -> anyhow::Result<()>;
}

/// In-memory [`DeviceRegistry`] backed by a concurrent map.
///
/// Used by the demo binary and tests; production deployments adapt their own
/// store to the trait.
#[derive(Debug, Default)]
pub struct InMemoryDeviceRegistry {
    devices: DashMap<DeviceId, Device>,
}

impl InMemoryDeviceRegistry {
    /// Creates a new empty [`InMemoryDeviceRegistry`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the given devices.
    #[must_use]
    pub fn with_devices(devices: impl IntoIterator<Item = Device>) -> Self {
        let registry = Self::new();
        for device in devices {
            registry.insert(device);
        }
        registry
    }

    /// Adds or replaces a device.
    pub fn insert(&self, device: Device) {
        self.devices.insert(device.id, device);
    }

    /// Removes a device; returns it if present.
    pub fn remove(&self, device_id: DeviceId) -> Option<Device> {
        self.devices.remove(&device_id).map(|(_, device)| device)
    }

    /// Returns a snapshot of a device.
    #[must_use]
    pub fn get(&self, device_id: DeviceId) -> Option<Device> {
        self.devices.get(&device_id).map(|d| d.clone())
    }

    /// Returns the number of registered devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[async_trait]
impl DeviceRegistry for InMemoryDeviceRegistry {
    async fn list_devices(&self) -> anyhow::Result<Vec<Device>> {
        Ok(self.devices.iter().map(|d| d.clone()).collect())
    }

    async fn update_token(&self, device_id: DeviceId, token: String) -> anyhow::Result<()> {
        let mut device = self
            .devices
            .get_mut(&device_id)
            .ok_or_else(|| anyhow::anyhow!("Unknown device: {device_id}"))?;
        device.token = token;
        Ok(())
    }
}

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

//! Event sink collaborator surface and in-crate implementations.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::events::CameraEvent;

/// Collaborator surface appending decoded events to durable storage.
///
/// Appends are awaited inline by the owning session, so a blocking sink stalls
/// only that device's ingestion.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Appends one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event could not be stored; the caller logs and
    /// drops the event (at-least-once best-effort contract).
    async fn append(&self, event: CameraEvent) -> anyhow::Result<()>;
}

/// In-memory [`EventSink`] retaining every appended event.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: RwLock<Vec<CameraEvent>>,
}

impl MemoryEventSink {
    /// Creates a new empty [`MemoryEventSink`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all appended events.
    pub async fn events(&self) -> Vec<CameraEvent> {
        self.events.read().await.clone()
    }

    /// Returns the number of appended events.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Returns whether no events have been appended.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn append(&self, event: CameraEvent) -> anyhow::Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}

/// [`EventSink`] that emits each event to the log stream.
///
/// Useful for demos and smoke tests where no storage backend is wired up.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    /// Creates a new [`LogEventSink`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSink for LogEventSink {
    async fn append(&self, event: CameraEvent) -> anyhow::Result<()> {
        tracing::info!(
            device_id = %event.device_id,
            motion = event.motion_detected,
            object = %event.object,
            timestamp = %event.timestamp.to_rfc3339(),
            "Camera event",
        );
        Ok(())
    }
}

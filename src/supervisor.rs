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

//! Fleet supervisor: periodic reconciliation of the device registry against
//! the set of live connection sessions.

use std::{fmt::Debug, sync::Arc};

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::{
    task::JoinSet,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;

use crate::{
    auth::TokenRefresher,
    config::FleetConfig,
    registry::{DeviceId, DeviceRegistry},
    session::ConnectionSession,
    sink::EventSink,
};

/// Connection state of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session exists for the device.
    Absent,
    /// A session was spawned and is attempting its handshake.
    Connecting,
    /// The handshake succeeded and the receive loop is running.
    Open,
    /// The session is tearing down; its entry is removed momentarily.
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Absent => "ABSENT",
            Self::Connecting => "CONNECTING",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        };
        write!(f, "{s}")
    }
}

/// The set of devices with a live (connecting or open) session.
///
/// Single source of truth for "is a session currently owned for device X".
/// Membership changes through exactly two paths: insert-on-spawn by the
/// supervisor ([`Self::try_begin`]) and remove-on-terminate by the owning
/// session ([`Self::finish`]); the owning session may additionally advance
/// its own entry's state ([`Self::mark_open`]).
#[derive(Debug, Default)]
pub struct ActiveSessions {
    inner: DashMap<DeviceId, ConnectionState>,
}

impl ActiveSessions {
    /// Creates a new empty [`ActiveSessions`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claims a device slot, inserting state `Connecting`.
    ///
    /// Returns `false` if the device already has a live session; the claim is
    /// made before the session task starts so the single-active-session
    /// invariant holds even while the handshake is in flight.
    #[must_use]
    pub fn try_begin(&self, device_id: DeviceId) -> bool {
        match self.inner.entry(device_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(ConnectionState::Connecting);
                true
            }
        }
    }

    /// Marks a device's session as open after a successful handshake.
    pub fn mark_open(&self, device_id: DeviceId) {
        if let Some(mut state) = self.inner.get_mut(&device_id) {
            *state = ConnectionState::Open;
        }
    }

    /// Removes a device's entry as its session terminates.
    pub fn finish(&self, device_id: DeviceId) {
        if let Some(mut state) = self.inner.get_mut(&device_id) {
            *state = ConnectionState::Closed;
        }
        self.inner.remove(&device_id);
    }

    /// Returns the connection state for a device.
    #[must_use]
    pub fn state(&self, device_id: DeviceId) -> ConnectionState {
        self.inner
            .get(&device_id)
            .map_or(ConnectionState::Absent, |state| *state)
    }

    /// Returns the number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns whether no sessions are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Periodic supervisor keeping one live session per registered device.
///
/// Each tick diffs the registry against the active-session set and spawns a
/// [`ConnectionSession`] for every device lacking one. Session tasks are
/// retained in a [`JoinSet`] so shutdown can await their termination instead
/// of leaking them.
pub struct FleetSupervisor {
    config: FleetConfig,
    registry: Arc<dyn DeviceRegistry>,
    sink: Arc<dyn EventSink>,
    refresher: Arc<TokenRefresher>,
    active: Arc<ActiveSessions>,
    tasks: JoinSet<()>,
    cancellation_token: CancellationToken,
}

impl Debug for FleetSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(FleetSupervisor))
            .field("config", &self.config)
            .field("live_sessions", &self.active.len())
            .finish_non_exhaustive()
    }
}

impl FleetSupervisor {
    /// Creates a new [`FleetSupervisor`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the token refresher's HTTP client cannot be built.
    pub fn new(
        config: FleetConfig,
        registry: Arc<dyn DeviceRegistry>,
        sink: Arc<dyn EventSink>,
    ) -> anyhow::Result<Self> {
        let refresher = Arc::new(TokenRefresher::new(
            registry.clone(),
            config.login_timeout(),
        )?);

        Ok(Self {
            config,
            registry,
            sink,
            refresher,
            active: Arc::new(ActiveSessions::new()),
            tasks: JoinSet::new(),
            cancellation_token: CancellationToken::new(),
        })
    }

    /// Returns the active-session set.
    #[must_use]
    pub fn active_sessions(&self) -> Arc<ActiveSessions> {
        self.active.clone()
    }

    /// Returns a handle to the fleet-wide stop signal.
    ///
    /// Cancelling it stops the tick loop and unblocks every session's receive
    /// wait; [`Self::run`] then drains the shutdown path before returning.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Runs the tick loop until the stop signal fires, then shuts down.
    ///
    /// The first tick happens immediately; later ticks follow the configured
    /// interval. Returns only after every session has terminated or timed out.
    pub async fn run(&mut self) {
        tracing::info!(
            tick_interval_secs = self.config.tick_interval_secs,
            "Fleet supervisor started",
        );

        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancellation_token.cancelled() => break,
                _ = interval.tick() => self.tick().await,
            }
        }

        self.shutdown().await;
    }

    /// Performs one reconciliation pass.
    ///
    /// Spawning is fire-and-forget: the per-attempt handshake timeout lives
    /// inside the session, so a tick completes in bounded time regardless of
    /// individual connect latency. A failure for one device never aborts the
    /// tick or other devices' attempts.
    pub async fn tick(&mut self) {
        self.reap_finished();

        let devices = match self.registry.list_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list devices, skipping tick");
                return;
            }
        };

        for device in devices {
            let device_id = device.id;
            if !self.active.try_begin(device_id) {
                continue;
            }

            tracing::debug!(device_id = %device_id, "Spawning session");
            let session = ConnectionSession::new(
                device,
                self.config.clone(),
                self.sink.clone(),
                self.refresher.clone(),
                self.active.clone(),
                self.cancellation_token.child_token(),
            );
            self.tasks.spawn(session.run());
        }
    }

    /// Reaps finished session tasks, logging any that panicked.
    fn reap_finished(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(e) = result {
                tracing::error!(error = %e, "Session task failed");
            }
        }
    }

    /// Drains all session tasks, bounding each join by the close timeout.
    ///
    /// Sessions observe the cancelled token, close their sockets with a
    /// normal-closure frame and terminate; stragglers past the bound are
    /// aborted.
    pub async fn shutdown(&mut self) {
        self.cancellation_token.cancel();
        tracing::info!(live_sessions = self.active.len(), "Fleet supervisor stopping");

        let bound = self.config.close_timeout();
        loop {
            match tokio::time::timeout(bound, self.tasks.join_next()).await {
                Ok(Some(Ok(()))) => {}
                Ok(Some(Err(e))) => {
                    tracing::error!(error = %e, "Session task failed during shutdown");
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        remaining = self.tasks.len(),
                        "Timed out waiting for sessions to close, aborting",
                    );
                    self.tasks.abort_all();
                    while self.tasks.join_next().await.is_some() {}
                    break;
                }
            }
        }

        tracing::info!("Fleet supervisor stopped");
    }
}

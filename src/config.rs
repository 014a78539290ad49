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

//! Configuration for the fleet supervisor and its sessions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a [`FleetSupervisor`](crate::supervisor::FleetSupervisor).
///
/// All bounds are expressed in whole seconds; the steady-state receive loop
/// itself carries no timeout (it blocks until the next frame or cancellation).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Interval between supervisor reconciliation ticks.
    pub tick_interval_secs: u64,
    /// Bound on each WebSocket handshake attempt.
    pub connect_timeout_secs: u64,
    /// Bound on each session's normal-closure close during shutdown.
    pub close_timeout_secs: u64,
    /// Bound on each login call made by the token refresher.
    pub login_timeout_secs: u64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 30,
            connect_timeout_secs: 10,
            close_timeout_secs: 5,
            login_timeout_secs: 10,
        }
    }
}

impl FleetConfig {
    /// Returns the supervisor tick interval.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Returns the per-attempt handshake timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the per-session shutdown close timeout.
    #[must_use]
    pub fn close_timeout(&self) -> Duration {
        Duration::from_secs(self.close_timeout_secs)
    }

    /// Returns the login call timeout.
    #[must_use]
    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }
}

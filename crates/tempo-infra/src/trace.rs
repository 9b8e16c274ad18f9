// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Recorded sessions that can be replayed into a [`SimulatedHost`].
//!
//! A trace is a JSON document:
//!
//! ```json
//! { "name": "landing", "steps": [
//!     { "advance": 90.0 },
//!     { "emit": [ { "entryType": "paint", "name": "first-paint", "startTime": 90.0 } ] },
//!     { "navigate": { "before_navigate": { "from": "/", "to": "/about", "kind": "link" } } },
//!     "tick"
//! ] }
//! ```

use crate::host::SimulatedHost;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tempo_core::event::NavigationSender;
use tempo_core::navigation::NavigationSignal;
use tempo_core::timing::PerformanceEntry;

/// One step of a recorded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStep {
    /// Move the host clock forward, in milliseconds.
    Advance(f64),
    /// Emit entries as one batch.
    Emit(Vec<PerformanceEntry>),
    /// Send a router signal.
    Navigate(NavigationSignal),
    /// Let the consumer process what is pending.
    Tick,
}

/// A named, ordered list of [`TraceStep`]s.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionTrace {
    /// Human-readable name of the session.
    #[serde(default)]
    pub name: String,
    /// Steps in replay order.
    pub steps: Vec<TraceStep>,
}

impl SessionTrace {
    /// Parses a trace from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse session trace")
    }

    /// Reads and parses a trace file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session trace {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("in {}", path.display()))
    }

    /// Replays every step into `host`.
    ///
    /// Router signals go to `router`, stamped with the host clock at that
    /// step; `tick` runs for each [`TraceStep::Tick`] and once more at the end.
    /// Returns the number of steps replayed.
    pub fn replay(
        &self,
        host: &SimulatedHost,
        router: &NavigationSender,
        mut tick: impl FnMut(),
    ) -> Result<usize> {
        log::info!("Replaying session `{}` ({} steps)", self.name, self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            match step {
                TraceStep::Advance(ms) => host.advance(*ms),
                TraceStep::Emit(entries) => host.emit_batch(entries.clone()),
                TraceStep::Navigate(signal) => {
                    router
                        .send(signal.clone())
                        .with_context(|| format!("step {index}: navigation receiver is gone"))?;
                }
                TraceStep::Tick => tick(),
            }
        }
        tick();
        Ok(self.steps.len())
    }
}

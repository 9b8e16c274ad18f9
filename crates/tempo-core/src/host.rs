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

//! The contract a host runtime must fulfil to be observed.
//!
//! A host is whatever environment produces performance entries: a browser
//! binding, a headless renderer, or the simulated host in `tempo-infra`. It
//! delivers entries in batches through the tracker's input queue, handed over
//! at registration time, which lets the tracker drain them on its own
//! execution context.

use crate::error::{ObservationError, ObservationResult};
use crate::event::Delivery;
use crate::timing::{EntryType, PerformanceEntry, TimingPhase};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::Debug;

/// A batch of entries, in the order the host reported them.
pub type EntryBatch = Vec<PerformanceEntry>;

/// One observation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObserveOptions {
    /// The entry type to observe.
    pub entry_type: EntryType,
    /// Also deliver entries the host buffered before the registration.
    pub buffered: bool,
}

impl ObserveOptions {
    /// Observe future entries of `entry_type` only.
    pub fn new(entry_type: EntryType) -> Self {
        Self {
            entry_type,
            buffered: false,
        }
    }

    /// Observe buffered and future entries of `entry_type`.
    pub fn buffered(entry_type: EntryType) -> Self {
        Self {
            entry_type,
            buffered: true,
        }
    }
}

/// A live registration returned by [`PerformanceHost::observe`].
pub trait Registration: Send + Debug {
    /// The entry type this registration delivers.
    fn entry_type(&self) -> EntryType;

    /// Stops delivery. Must be idempotent.
    fn disconnect(&mut self);

    /// Returns `true` until [`Registration::disconnect`] is called.
    fn is_connected(&self) -> bool;
}

/// The core trait for a host runtime.
pub trait PerformanceHost: Send + Sync + Debug + 'static {
    /// Returns a human-readable identifier for this host.
    fn host_id(&self) -> Cow<'static, str>;

    /// Returns `true` if this is a client context where entries are produced.
    fn is_client(&self) -> bool;

    /// The entry types this host can deliver.
    fn supported_entry_types(&self) -> Vec<EntryType>;

    /// The host clock, in milliseconds since the time origin.
    fn now(&self) -> f64;

    /// Registers interest in one entry type.
    ///
    /// Batches are sent to `sink` as [`Delivery::Entries`] until the returned
    /// registration is disconnected or the receiver is dropped.
    fn observe(
        &self,
        options: ObserveOptions,
        sink: flume::Sender<Delivery>,
    ) -> ObservationResult<Box<dyn Registration>>;

    /// Inserts a named mark at the current time and returns its timestamp.
    fn mark(&self, name: &str) -> ObservationResult<f64> {
        let _ = name;
        Err(ObservationError::Unsupported(EntryType::Mark))
    }

    /// Inserts a measure spanning two existing marks.
    ///
    /// Observers of [`EntryType::Measure`] receive the resulting entry.
    fn measure(&self, name: &str, start_mark: &str, end_mark: &str) -> ObservationResult<TimingPhase> {
        let _ = (name, start_mark, end_mark);
        Err(ObservationError::Unsupported(EntryType::Measure))
    }
}

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

//! The timing data model.
//!
//! Raw [`PerformanceEntry`] values are what a host runtime reports; a
//! [`TimingPhase`] is what the tracker derives from them, keyed by [`PhaseId`].
//! Resource loads are folded into a [`ResourceAggregate`].

mod entry;
mod phase;
mod resource;

pub use self::entry::{
    DeliveryType, EntryDetails, EntryType, EventTiming, LayoutShiftTiming, NavigationTiming,
    PerformanceEntry, RenderBlockingStatus, ResourceTiming, UnknownEntryType,
};
pub use self::phase::{PhaseId, PhaseSet, PhaseTable, TimingPhase};
pub use self::resource::{ResourceAggregate, ResourceRecord};

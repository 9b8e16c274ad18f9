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

//! # Tempo Core
//!
//! Foundational crate containing the timing data model, the contracts a host
//! runtime and a router must fulfil, and the error types shared by the rest of
//! the workspace.
//!
//! This crate defines the "what" of page performance tracking: `tempo-telemetry`
//! turns raw entries into live metrics, and `tempo-infra` provides the concrete
//! hosts that produce those entries.

#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod host;
pub mod navigation;
pub mod timing;

pub use error::{MalformedEntry, ObservationError, ObservationResult};
pub use event::{Delivery, EventBus, NavigationSender, TimedSignal};
pub use host::{EntryBatch, ObserveOptions, PerformanceHost, Registration};
pub use navigation::{NavigationInfo, NavigationKind, NavigationSignal, ResetScope};
pub use timing::{
    DeliveryType, EntryDetails, EntryType, EventTiming, LayoutShiftTiming, NavigationTiming,
    PerformanceEntry, PhaseId, PhaseSet, PhaseTable, RenderBlockingStatus, ResourceAggregate,
    ResourceRecord, ResourceTiming, TimingPhase,
};

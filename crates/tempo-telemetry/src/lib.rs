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

//! # Tempo Telemetry
//!
//! The live performance tracker. Entries delivered by a
//! [`PerformanceHost`](tempo_core::PerformanceHost) flow through the
//! [`ObservationSubscription`], are turned into [`PhaseUpdate`]s by the
//! [`EventClassifier`] and folded into the [`MetricsAggregator`]. Router signals
//! go to the [`NavigationResetController`]. A [`MetricsPanel`] reads the result.
//!
//! [`PerformanceTracker`] wires all of it together and is meant to be
//! constructed once at application-root scope and passed down explicitly.

#![warn(missing_docs)]

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod format;
pub mod history;
pub mod navigation;
pub mod presentation;
pub mod server;
pub mod service;
pub mod subscription;
pub mod utils;

pub use aggregator::{AggregatorConfig, LcpPolicy, MetricsAggregator, MetricsSnapshot};
pub use classifier::{EventClassifier, NavigationPhases, PhaseUpdate};
pub use config::{ConfigError, TrackerConfig};
pub use history::{History, NavigationHistory, PageLoadHistory, PageLoadRecord};
pub use navigation::{CompletedNavigation, NavigationResetController, NavigationState};
pub use presentation::MetricsPanel;
pub use server::{ExternalRequest, ServerRenderMetrics};
pub use service::PerformanceTracker;
pub use subscription::{DeliveryObserver, ObservationSubscription, PumpStats};

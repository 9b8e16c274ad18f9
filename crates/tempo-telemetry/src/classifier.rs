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

//! Maps raw performance entries to phase updates.
//!
//! Classification is a pure function of the entry's kind and payload. It never
//! fails: a missing field only means the corresponding assignment is skipped.

use tempo_core::timing::{
    EntryType, NavigationTiming, PerformanceEntry, PhaseId, RenderBlockingStatus, ResourceRecord,
    TimingPhase,
};
use tempo_core::MalformedEntry;

/// Resources shorter than this (ms) are pings or no-ops and are ignored.
pub const DEFAULT_NOISE_FLOOR_MS: f64 = 0.1;

/// Name of the paint entry recorded as [`PhaseId::FirstPaint`].
pub const FIRST_PAINT: &str = "first-paint";

/// Name of the paint entry recorded as [`PhaseId::FirstContentfulPaint`].
pub const FIRST_CONTENTFUL_PAINT: &str = "first-contentful-paint";

/// Name of the measure recorded as [`PhaseId::Hydration`].
pub const HYDRATE_MEASURE: &str = "hydrate";

/// A state-update instruction for the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseUpdate {
    /// Every phase derived from one navigation timing record.
    Navigation(NavigationPhases),
    /// A first-paint or first-contentful-paint mark.
    Paint {
        /// Which paint phase.
        phase: PhaseId,
        /// The observed timing.
        timing: TimingPhase,
    },
    /// A largest-contentful-paint candidate.
    LargestContentfulPaint(TimingPhase),
    /// An accepted resource load.
    Resource(ResourceRecord),
    /// The `hydrate` measure.
    Hydration(TimingPhase),
    /// Delay between the first input and the start of its handler.
    FirstInputDelay(TimingPhase),
    /// Score of one layout shift not caused by recent input.
    LayoutShift(f64),
}

/// The phases of one navigation, relative to the navigation origin.
///
/// A phase whose raw bounds were missing (or, for the worker and TLS phases,
/// whose timer was never started) is [`TimingPhase::ABSENT`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavigationPhases {
    /// `(phase, timing)` pairs in [`PhaseId::NAVIGATION`] order.
    pub phases: Vec<(PhaseId, TimingPhase)>,
    /// Absolute `domInteractive` timestamp.
    pub dom_interactive_mark: Option<f64>,
    /// Absolute `domComplete` timestamp.
    pub dom_complete_mark: Option<f64>,
}

impl NavigationPhases {
    /// Returns the timing derived for `id`, or absent.
    pub fn get(&self, id: PhaseId) -> TimingPhase {
        self.phases
            .iter()
            .find(|(phase, _)| *phase == id)
            .map(|(_, timing)| *timing)
            .unwrap_or(TimingPhase::ABSENT)
    }

    fn from_timing(timing: &NavigationTiming, origin: f64) -> Self {
        let span = |start: Option<f64>, end: Option<f64>| match (start, end) {
            (Some(start), Some(end)) => TimingPhase::between(start - origin, end - origin),
            _ => TimingPhase::ABSENT,
        };
        // A zero timer means the feature was not used, not a zero-length phase.
        let optional = |marker: Option<f64>, end: Option<f64>| match marker {
            Some(start) if start > 0.0 => span(Some(start), end),
            _ => TimingPhase::ABSENT,
        };

        let t = timing;
        let phases = vec![
            (PhaseId::Redirect, span(t.redirect_start, t.redirect_end)),
            (PhaseId::Worker, optional(t.worker_start, t.fetch_start)),
            (PhaseId::Fetch, span(t.fetch_start, t.domain_lookup_start)),
            (PhaseId::Dns, span(t.domain_lookup_start, t.domain_lookup_end)),
            (PhaseId::Tcp, span(t.connect_start, t.connect_end)),
            (PhaseId::Tls, optional(t.secure_connection_start, t.connect_end)),
            (PhaseId::Request, span(t.request_start, t.response_start)),
            (PhaseId::Response, span(t.response_start, t.response_end)),
            (PhaseId::TimeToFirstByte, span(t.fetch_start, t.response_start)),
            (
                PhaseId::DomContentLoaded,
                span(t.dom_content_loaded_event_start, t.dom_content_loaded_event_end),
            ),
            (PhaseId::DomInteractive, span(t.dom_interactive, t.dom_complete)),
            (PhaseId::DomComplete, span(t.dom_complete, t.dom_complete)),
            (PhaseId::UnloadEvent, span(t.unload_event_start, t.unload_event_end)),
            (PhaseId::LoadEvent, span(t.load_event_start, t.load_event_end)),
        ];

        Self {
            phases,
            dom_interactive_mark: t.dom_interactive,
            dom_complete_mark: t.dom_complete,
        }
    }
}

/// Turns raw entries into [`PhaseUpdate`]s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventClassifier {
    noise_floor: f64,
}

impl EventClassifier {
    /// Creates a classifier dropping resources shorter than `noise_floor` ms.
    pub fn new(noise_floor: f64) -> Self {
        Self { noise_floor }
    }

    /// The resource noise floor in milliseconds.
    pub fn noise_floor(&self) -> f64 {
        self.noise_floor
    }

    /// Produces zero or one update for `entry`.
    pub fn classify(&self, entry: &PerformanceEntry) -> Option<PhaseUpdate> {
        log::trace!("Classifying {} entry `{}`", entry.entry_type, entry.name);

        match entry.entry_type {
            EntryType::Navigation => classify_navigation(entry),
            EntryType::Paint => classify_paint(entry),
            EntryType::LargestContentfulPaint => {
                entry_phase(entry).map(PhaseUpdate::LargestContentfulPaint)
            }
            EntryType::Resource => self.classify_resource(entry),
            EntryType::Measure if entry.name == HYDRATE_MEASURE => {
                let start = required(entry, entry.start_time, "startTime")?;
                let duration = required(entry, entry.duration, "duration")?;
                Some(PhaseUpdate::Hydration(TimingPhase::from_entry(start, duration)))
            }
            EntryType::FirstInput => classify_first_input(entry),
            EntryType::LayoutShift => classify_layout_shift(entry),
            other => {
                log::debug!("Observed {other} entry `{}`; no phase to update", entry.name);
                None
            }
        }
    }

    fn classify_resource(&self, entry: &PerformanceEntry) -> Option<PhaseUpdate> {
        let duration = required(entry, entry.duration, "duration")?;
        if duration.is_nan() || duration < self.noise_floor {
            log::trace!(
                "Resource `{}` below the {}ms noise floor; ignored",
                entry.name,
                self.noise_floor
            );
            return None;
        }

        let timing = entry.resource_timing();
        Some(PhaseUpdate::Resource(ResourceRecord {
            name: entry.name.clone(),
            start_time: entry.start_time,
            duration,
            delivery: timing.and_then(|t| t.delivery_type),
            render_blocking: timing.is_some_and(|t| {
                t.render_blocking_status == Some(RenderBlockingStatus::Blocking)
            }),
            initiator_type: timing.and_then(|t| t.initiator_type.clone()),
            transfer_size: timing.and_then(|t| t.transfer_size),
        }))
    }
}

impl Default for EventClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_FLOOR_MS)
    }
}

fn classify_navigation(entry: &PerformanceEntry) -> Option<PhaseUpdate> {
    let Some(timing) = entry.navigation_timing() else {
        report_malformed(entry, "details");
        return None;
    };

    let origin = entry.start_time.unwrap_or(0.0);
    let phases = NavigationPhases::from_timing(timing, origin);

    let missing = phases
        .phases
        .iter()
        .filter(|(id, phase)| phase.is_absent() && !matches!(id, PhaseId::Worker | PhaseId::Tls))
        .count();
    if missing > 0 {
        log::debug!("Navigation entry `{}` is missing bounds for {missing} phases", entry.name);
    }

    Some(PhaseUpdate::Navigation(phases))
}

fn classify_paint(entry: &PerformanceEntry) -> Option<PhaseUpdate> {
    let phase = match entry.name.as_str() {
        FIRST_PAINT => PhaseId::FirstPaint,
        FIRST_CONTENTFUL_PAINT => PhaseId::FirstContentfulPaint,
        other => {
            log::debug!("Unknown paint entry `{other}`; ignored");
            return None;
        }
    };
    entry_phase(entry).map(|timing| PhaseUpdate::Paint { phase, timing })
}

fn classify_first_input(entry: &PerformanceEntry) -> Option<PhaseUpdate> {
    let start = required(entry, entry.start_time, "startTime")?;
    let processing_start = entry.event_timing().and_then(|t| t.processing_start);
    let processing_start = required(entry, processing_start, "processingStart")?;
    Some(PhaseUpdate::FirstInputDelay(TimingPhase::between(start, processing_start)))
}

fn classify_layout_shift(entry: &PerformanceEntry) -> Option<PhaseUpdate> {
    let Some(shift) = entry.layout_shift_timing() else {
        report_malformed(entry, "value");
        return None;
    };
    if shift.had_recent_input {
        log::trace!("Layout shift of {} follows user input; ignored", shift.value);
        return None;
    }
    Some(PhaseUpdate::LayoutShift(shift.value))
}

/// `startTime` .. `startTime + duration`; a missing duration counts as zero.
fn entry_phase(entry: &PerformanceEntry) -> Option<TimingPhase> {
    let start = required(entry, entry.start_time, "startTime")?;
    Some(TimingPhase::from_entry(start, entry.duration.unwrap_or(0.0)))
}

fn required(entry: &PerformanceEntry, value: Option<f64>, field: &'static str) -> Option<f64> {
    if value.is_none() {
        report_malformed(entry, field);
    }
    value
}

fn report_malformed(entry: &PerformanceEntry, field: &'static str) {
    let malformed = MalformedEntry {
        entry_type: entry.entry_type,
        name: entry.name.clone(),
        field,
    };
    log::debug!("{malformed}; skipped");
}

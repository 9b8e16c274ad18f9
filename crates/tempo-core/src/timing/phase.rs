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

//! Timing phases and the canonical phase schema.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{self, Display};

/// A start/end/duration triple, the atomic unit of measurement.
///
/// All values are milliseconds. `duration == end - start` whenever both bounds
/// are present; a phase with no start is "not yet measured".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimingPhase {
    /// When the phase started, if known.
    pub start: Option<f64>,
    /// When the phase ended, if known.
    pub end: Option<f64>,
    /// `end - start`, if both are known.
    pub duration: Option<f64>,
}

impl TimingPhase {
    /// The "not yet measured" state.
    pub const ABSENT: Self = Self {
        start: None,
        end: None,
        duration: None,
    };

    /// A complete phase spanning `start..end`.
    pub fn between(start: f64, end: f64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            duration: Some(end - start),
        }
    }

    /// A phase that has started but not finished yet.
    pub fn starting_at(start: f64) -> Self {
        Self {
            start: Some(start),
            end: None,
            duration: None,
        }
    }

    /// A phase built from an entry's `startTime` and `duration`.
    pub fn from_entry(start: f64, duration: f64) -> Self {
        Self {
            start: Some(start),
            end: Some(start + duration),
            duration: Some(duration),
        }
    }

    /// Returns `true` once a start value has been recorded.
    pub fn is_measured(&self) -> bool {
        self.start.is_some()
    }

    /// Returns `true` when start, end and duration are all present.
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some() && self.duration.is_some()
    }

    /// Returns `true` in the "not yet measured" state.
    pub fn is_absent(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.duration.is_none()
    }
}

/// Identifies one phase of the canonical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseId {
    /// Time spent following HTTP redirects.
    Redirect,
    /// Service worker startup, only when a worker handled the request.
    Worker,
    /// From fetch start to the DNS lookup (cache checks).
    Fetch,
    /// DNS lookup.
    Dns,
    /// TCP connection.
    Tcp,
    /// TLS negotiation, only on secure connections.
    Tls,
    /// From the request being sent to the first response byte.
    Request,
    /// Response download.
    Response,
    /// From fetch start to the first response byte.
    TimeToFirstByte,
    /// `DOMContentLoaded` handlers.
    DomContentLoaded,
    /// From DOM interactive to DOM complete.
    DomInteractive,
    /// The DOM complete instant (zero length).
    DomComplete,
    /// `unload` handlers of the previous document.
    UnloadEvent,
    /// `load` handlers.
    LoadEvent,
    /// The first paint.
    FirstPaint,
    /// The first contentful paint.
    FirstContentfulPaint,
    /// The largest contentful paint.
    LargestContentfulPaint,
    /// From the first user input to the start of its processing.
    FirstInputDelay,
    /// Client-side hydration, sourced from the `hydrate` measure.
    Hydration,
    /// A client-side route transition.
    SpaNavigation,
}

impl PhaseId {
    /// Number of phases in the schema.
    pub const COUNT: usize = 20;

    /// Every phase, in schema order.
    pub const ALL: [PhaseId; Self::COUNT] = [
        PhaseId::Redirect,
        PhaseId::Worker,
        PhaseId::Fetch,
        PhaseId::Dns,
        PhaseId::Tcp,
        PhaseId::Tls,
        PhaseId::Request,
        PhaseId::Response,
        PhaseId::TimeToFirstByte,
        PhaseId::DomContentLoaded,
        PhaseId::DomInteractive,
        PhaseId::DomComplete,
        PhaseId::UnloadEvent,
        PhaseId::LoadEvent,
        PhaseId::FirstPaint,
        PhaseId::FirstContentfulPaint,
        PhaseId::LargestContentfulPaint,
        PhaseId::FirstInputDelay,
        PhaseId::Hydration,
        PhaseId::SpaNavigation,
    ];

    /// The phases derived from a navigation timing record, in order.
    pub const NAVIGATION: [PhaseId; 14] = [
        PhaseId::Redirect,
        PhaseId::Worker,
        PhaseId::Fetch,
        PhaseId::Dns,
        PhaseId::Tcp,
        PhaseId::Tls,
        PhaseId::Request,
        PhaseId::Response,
        PhaseId::TimeToFirstByte,
        PhaseId::DomContentLoaded,
        PhaseId::DomInteractive,
        PhaseId::DomComplete,
        PhaseId::UnloadEvent,
        PhaseId::LoadEvent,
    ];

    /// Position of this phase in [`PhaseId::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable machine-readable key.
    pub fn key(self) -> &'static str {
        match self {
            PhaseId::Redirect => "redirect",
            PhaseId::Worker => "worker",
            PhaseId::Fetch => "fetch",
            PhaseId::Dns => "dns",
            PhaseId::Tcp => "tcp",
            PhaseId::Tls => "tls",
            PhaseId::Request => "request",
            PhaseId::Response => "response",
            PhaseId::TimeToFirstByte => "time-to-first-byte",
            PhaseId::DomContentLoaded => "dom-content-loaded",
            PhaseId::DomInteractive => "dom-interactive",
            PhaseId::DomComplete => "dom-complete",
            PhaseId::UnloadEvent => "unload-event",
            PhaseId::LoadEvent => "load-event",
            PhaseId::FirstPaint => "first-paint",
            PhaseId::FirstContentfulPaint => "first-contentful-paint",
            PhaseId::LargestContentfulPaint => "largest-contentful-paint",
            PhaseId::FirstInputDelay => "first-input-delay",
            PhaseId::Hydration => "hydration",
            PhaseId::SpaNavigation => "spa-navigation",
        }
    }

    /// Human-readable label for diagnostics panels.
    pub fn label(self) -> &'static str {
        match self {
            PhaseId::Redirect => "Redirect",
            PhaseId::Worker => "Service worker",
            PhaseId::Fetch => "Fetch",
            PhaseId::Dns => "DNS lookup",
            PhaseId::Tcp => "TCP connect",
            PhaseId::Tls => "TLS handshake",
            PhaseId::Request => "Request",
            PhaseId::Response => "Response",
            PhaseId::TimeToFirstByte => "Time to first byte",
            PhaseId::DomContentLoaded => "DOMContentLoaded",
            PhaseId::DomInteractive => "DOM interactive",
            PhaseId::DomComplete => "DOM complete",
            PhaseId::UnloadEvent => "Unload event",
            PhaseId::LoadEvent => "Load event",
            PhaseId::FirstPaint => "First paint",
            PhaseId::FirstContentfulPaint => "First contentful paint",
            PhaseId::LargestContentfulPaint => "Largest contentful paint",
            PhaseId::FirstInputDelay => "First input delay",
            PhaseId::Hydration => "Hydration",
            PhaseId::SpaNavigation => "SPA navigation",
        }
    }
}

impl Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A compact set of [`PhaseId`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhaseSet(u32);

impl PhaseSet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every phase of the schema.
    pub const fn all() -> Self {
        Self((1 << PhaseId::COUNT) - 1)
    }

    /// Returns a copy of the set with `phase` added.
    pub fn with(self, phase: PhaseId) -> Self {
        Self(self.0 | (1 << phase.index()))
    }

    /// Returns a copy of the set with `phase` removed.
    pub fn without(self, phase: PhaseId) -> Self {
        Self(self.0 & !(1 << phase.index()))
    }

    /// Returns `true` if `phase` is in the set.
    pub fn contains(self, phase: PhaseId) -> bool {
        self.0 & (1 << phase.index()) != 0
    }

    /// Number of phases in the set.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` if the set holds no phase.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the members in schema order.
    pub fn iter(self) -> impl Iterator<Item = PhaseId> {
        PhaseId::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl Default for PhaseSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<PhaseId> for PhaseSet {
    fn from_iter<I: IntoIterator<Item = PhaseId>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), PhaseSet::with)
    }
}

/// One [`TimingPhase`] per [`PhaseId`].
///
/// Serializes as a map keyed by [`PhaseId::key`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseTable {
    phases: [TimingPhase; PhaseId::COUNT],
}

impl PhaseTable {
    /// A table where every phase is absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current value of `id`.
    pub fn get(&self, id: PhaseId) -> TimingPhase {
        self.phases[id.index()]
    }

    /// Overwrites the value of `id`.
    pub fn set(&mut self, id: PhaseId, phase: TimingPhase) {
        self.phases[id.index()] = phase;
    }

    /// Returns every phase in `scope` to the absent state.
    pub fn clear(&mut self, scope: PhaseSet) {
        for id in scope.iter() {
            self.phases[id.index()] = TimingPhase::ABSENT;
        }
    }

    /// Iterates `(id, phase)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (PhaseId, TimingPhase)> + '_ {
        PhaseId::ALL.iter().map(move |id| (*id, self.phases[id.index()]))
    }

    /// Returns `true` if no phase has been measured.
    pub fn is_empty(&self) -> bool {
        self.phases.iter().all(TimingPhase::is_absent)
    }
}

impl Serialize for PhaseTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(PhaseId::COUNT))?;
        for (id, phase) in self.iter() {
            map.serialize_entry(id.key(), &phase)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn between_derives_duration() {
        let phase = TimingPhase::between(100.0, 180.0);
        assert_eq!(phase.start, Some(100.0));
        assert_eq!(phase.end, Some(180.0));
        assert_eq!(phase.duration, Some(80.0));
        assert!(phase.is_complete());
    }

    #[test]
    fn absent_and_in_flight_states() {
        assert!(TimingPhase::ABSENT.is_absent());
        assert!(!TimingPhase::ABSENT.is_measured());
        assert_eq!(TimingPhase::default(), TimingPhase::ABSENT);

        let in_flight = TimingPhase::starting_at(500.0);
        assert!(in_flight.is_measured());
        assert!(!in_flight.is_complete());
    }

    #[test]
    fn from_entry_adds_duration_to_start() {
        let phase = TimingPhase::from_entry(40.0, 12.5);
        assert_eq!(phase.end, Some(52.5));
        assert_eq!(phase.duration, Some(12.5));
    }

    #[test]
    fn phase_ids_are_indexed_in_schema_order() {
        for (i, id) in PhaseId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
        assert_eq!(PhaseId::SpaNavigation.key(), "spa-navigation");
    }

    #[test]
    fn phase_set_membership() {
        let set: PhaseSet = [PhaseId::Request, PhaseId::Response].into_iter().collect();
        assert!(set.contains(PhaseId::Request));
        assert!(!set.contains(PhaseId::Dns));
        assert_eq!(set.len(), 2);

        let all = PhaseSet::all();
        assert_eq!(all.len(), PhaseId::COUNT);
        assert!(!all.without(PhaseId::Tls).contains(PhaseId::Tls));
        assert!(PhaseSet::empty().is_empty());
    }

    #[test]
    fn table_clear_only_touches_scope() {
        let mut table = PhaseTable::new();
        table.set(PhaseId::Dns, TimingPhase::between(1.0, 2.0));
        table.set(PhaseId::SpaNavigation, TimingPhase::between(5.0, 9.0));

        table.clear(PhaseSet::all().without(PhaseId::SpaNavigation));

        assert!(table.get(PhaseId::Dns).is_absent());
        assert_eq!(table.get(PhaseId::SpaNavigation).duration, Some(4.0));
        assert!(!table.is_empty());
    }

    #[test]
    fn table_serializes_as_keyed_map() {
        let mut table = PhaseTable::new();
        table.set(PhaseId::Request, TimingPhase::between(100.0, 180.0));

        let json = serde_json::to_value(table).unwrap();
        assert_eq!(json["request"]["duration"], 80.0);
        assert!(json["dns"]["start"].is_null());
    }
}

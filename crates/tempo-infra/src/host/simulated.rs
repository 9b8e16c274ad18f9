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

//! An in-process client context driven entirely by its caller.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tempo_core::error::{ObservationError, ObservationResult};
use tempo_core::event::Delivery;
use tempo_core::host::{EntryBatch, ObserveOptions, PerformanceHost, Registration};
use tempo_core::timing::{EntryType, PerformanceEntry, TimingPhase};

#[derive(Debug)]
struct Observer {
    id: u64,
    entry_type: EntryType,
    sink: flume::Sender<Delivery>,
}

#[derive(Debug)]
struct HostState {
    now: f64,
    supported: Vec<EntryType>,
    timeline: Vec<PerformanceEntry>,
    observers: Vec<Observer>,
    marks: HashMap<String, f64>,
    next_id: u64,
    observe_calls: usize,
}

impl HostState {
    /// Appends `entries` to the timeline and delivers them, one batch per observer.
    fn dispatch(&mut self, entries: Vec<PerformanceEntry>) {
        if entries.is_empty() {
            return;
        }
        self.observers.retain(|observer| {
            let batch: EntryBatch = entries
                .iter()
                .filter(|e| e.entry_type == observer.entry_type)
                .cloned()
                .collect();
            if batch.is_empty() {
                return true;
            }
            let delivered = observer.sink.send(Delivery::Entries(batch)).is_ok();
            if !delivered {
                log::debug!("Dropping observer {} with a closed sink", observer.id);
            }
            delivered
        });
        self.timeline.extend(entries);
    }
}

/// A client host whose clock and entries are set by the caller.
///
/// Cloning yields another handle on the same host.
#[derive(Debug, Clone)]
pub struct SimulatedHost {
    state: Arc<Mutex<HostState>>,
}

impl SimulatedHost {
    /// Creates a host supporting every entry type, with its clock at zero.
    pub fn new() -> Self {
        Self::with_supported(EntryType::ALL.to_vec())
    }

    /// Creates a host that only accepts `supported` entry types.
    pub fn with_supported(supported: Vec<EntryType>) -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState {
                now: 0.0,
                supported,
                timeline: Vec::new(),
                observers: Vec::new(),
                marks: HashMap::new(),
                next_id: 0,
                observe_calls: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves the clock forward by `ms`.
    pub fn advance(&self, ms: f64) {
        self.lock().now += ms;
    }

    /// Sets the clock.
    pub fn set_now(&self, now: f64) {
        self.lock().now = now;
    }

    /// Records one entry and delivers it to matching observers.
    pub fn emit(&self, entry: PerformanceEntry) {
        self.emit_batch(vec![entry]);
    }

    /// Records entries and delivers them to matching observers, in order.
    pub fn emit_batch(&self, entries: Vec<PerformanceEntry>) {
        log::trace!("Simulated host emitting {} entries", entries.len());
        self.lock().dispatch(entries);
    }

    /// Every entry emitted so far.
    pub fn timeline(&self) -> Vec<PerformanceEntry> {
        self.lock().timeline.clone()
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    /// Number of times [`PerformanceHost::observe`] was called, successful or not.
    pub fn observe_calls(&self) -> usize {
        self.lock().observe_calls
    }
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceHost for SimulatedHost {
    fn host_id(&self) -> Cow<'static, str> {
        Cow::Borrowed("simulated")
    }

    fn is_client(&self) -> bool {
        true
    }

    fn supported_entry_types(&self) -> Vec<EntryType> {
        self.lock().supported.clone()
    }

    fn now(&self) -> f64 {
        self.lock().now
    }

    fn observe(
        &self,
        options: ObserveOptions,
        sink: flume::Sender<Delivery>,
    ) -> ObservationResult<Box<dyn Registration>> {
        let mut state = self.lock();
        state.observe_calls += 1;
        if !state.supported.contains(&options.entry_type) {
            return Err(ObservationError::Unsupported(options.entry_type));
        }

        if options.buffered {
            let buffered: EntryBatch = state
                .timeline
                .iter()
                .filter(|e| e.entry_type == options.entry_type)
                .cloned()
                .collect();
            if !buffered.is_empty() && sink.send(Delivery::Entries(buffered)).is_err() {
                return Err(ObservationError::Disconnected);
            }
        }

        let id = state.next_id;
        state.next_id += 1;
        state.observers.push(Observer {
            id,
            entry_type: options.entry_type,
            sink,
        });

        Ok(Box::new(SimulatedRegistration {
            id,
            entry_type: options.entry_type,
            host: Arc::downgrade(&self.state),
        }))
    }

    fn mark(&self, name: &str) -> ObservationResult<f64> {
        let mut state = self.lock();
        if !state.supported.contains(&EntryType::Mark) {
            return Err(ObservationError::Unsupported(EntryType::Mark));
        }
        let now = state.now;
        state.marks.insert(name.to_owned(), now);
        state.dispatch(vec![PerformanceEntry::mark(name, now)]);
        Ok(now)
    }

    fn measure(&self, name: &str, start_mark: &str, end_mark: &str) -> ObservationResult<TimingPhase> {
        let mut state = self.lock();
        if !state.supported.contains(&EntryType::Measure) {
            return Err(ObservationError::Unsupported(EntryType::Measure));
        }
        let lookup = |mark: &str| {
            state
                .marks
                .get(mark)
                .copied()
                .ok_or_else(|| ObservationError::UnknownMark(mark.to_owned()))
        };
        let timing = TimingPhase::between(lookup(start_mark)?, lookup(end_mark)?);

        let duration = timing.duration.unwrap_or_default();
        let start = timing.start.unwrap_or_default();
        state.dispatch(vec![PerformanceEntry::measure(name, start, duration)]);
        Ok(timing)
    }
}

/// A registration on a [`SimulatedHost`].
///
/// It only holds a weak handle, so it never keeps the host alive.
#[derive(Debug)]
pub struct SimulatedRegistration {
    id: u64,
    entry_type: EntryType,
    host: Weak<Mutex<HostState>>,
}

impl Registration for SimulatedRegistration {
    fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    fn disconnect(&mut self) {
        if let Some(host) = self.host.upgrade() {
            let mut state = host.lock().unwrap_or_else(PoisonError::into_inner);
            state.observers.retain(|observer| observer.id != self.id);
        }
        self.host = Weak::new();
    }

    fn is_connected(&self) -> bool {
        self.host.upgrade().is_some_and(|host| {
            host.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .observers
                .iter()
                .any(|observer| observer.id == self.id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_batch(deliveries: &flume::Receiver<Delivery>) -> Option<EntryBatch> {
        deliveries.try_recv().ok()?.entries().cloned()
    }

    #[test]
    fn delivers_only_matching_entries() {
        let host = SimulatedHost::new();
        let (sink, deliveries) = flume::unbounded();
        let _registration = host.observe(ObserveOptions::new(EntryType::Paint), sink).unwrap();

        host.emit_batch(vec![
            PerformanceEntry::paint("first-paint", 90.0),
            PerformanceEntry::mark("m", 95.0),
        ]);

        let batch = next_batch(&deliveries).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].name, "first-paint");
        assert!(deliveries.try_recv().is_err());
    }

    #[test]
    fn buffered_observers_replay_the_timeline() {
        let host = SimulatedHost::new();
        host.emit(PerformanceEntry::paint("first-paint", 90.0));
        let (sink, deliveries) = flume::unbounded();

        let _registration = host.observe(ObserveOptions::buffered(EntryType::Paint), sink).unwrap();

        assert_eq!(next_batch(&deliveries).map(|b| b.len()), Some(1));
    }

    #[test]
    fn unsupported_types_are_rejected() {
        let host = SimulatedHost::with_supported(vec![EntryType::Paint]);
        let (sink, _deliveries) = flume::unbounded();

        let err = host.observe(ObserveOptions::new(EntryType::LongAnimationFrame), sink).unwrap_err();

        assert_eq!(err, ObservationError::Unsupported(EntryType::LongAnimationFrame));
        assert_eq!(host.observe_calls(), 1);
        assert_eq!(host.observer_count(), 0);
    }

    #[test]
    fn disconnect_stops_delivery() {
        let host = SimulatedHost::new();
        let (sink, deliveries) = flume::unbounded();
        let mut registration = host.observe(ObserveOptions::new(EntryType::Mark), sink).unwrap();
        assert!(registration.is_connected());

        registration.disconnect();
        registration.disconnect();
        host.emit(PerformanceEntry::mark("late", 1.0));

        assert!(!registration.is_connected());
        assert!(deliveries.try_recv().is_err());
    }

    #[test]
    fn measure_spans_two_marks() {
        let host = SimulatedHost::new();
        let (sink, deliveries) = flume::unbounded();
        let _registration = host.observe(ObserveOptions::new(EntryType::Measure), sink).unwrap();

        host.set_now(100.0);
        host.mark("hydrateStart").unwrap();
        host.advance(40.0);
        host.mark("hydrateEnd").unwrap();
        let timing = host.measure("hydrate", "hydrateStart", "hydrateEnd").unwrap();

        assert_eq!(timing.duration, Some(40.0));
        let batch = next_batch(&deliveries).unwrap();
        assert_eq!(batch[0].start_time, Some(100.0));
        assert_eq!(
            host.measure("x", "missing", "hydrateEnd"),
            Err(ObservationError::UnknownMark("missing".into()))
        );
    }
}

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

//! Registers interest in entry types with the host and feeds the aggregator.

use crate::aggregator::MetricsAggregator;
use crate::classifier::EventClassifier;
use std::sync::Arc;
use tempo_core::error::ObservationError;
use tempo_core::event::{Delivery, EventBus, NavigationSender, TimedSignal};
use tempo_core::host::{ObserveOptions, PerformanceHost, Registration};
use tempo_core::timing::{EntryType, PerformanceEntry};

/// Entry types observed unless configured otherwise. Layout shifts are left out.
pub const DEFAULT_ENTRY_TYPES: [EntryType; 11] = [
    EntryType::Navigation,
    EntryType::Paint,
    EntryType::Resource,
    EntryType::LargestContentfulPaint,
    EntryType::Measure,
    EntryType::Mark,
    EntryType::LongTask,
    EntryType::LongAnimationFrame,
    EntryType::Event,
    EntryType::Element,
    EntryType::FirstInput,
];

/// Counters for one [`ObservationSubscription::pump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PumpStats {
    /// Batches drained from the host.
    pub batches: usize,
    /// Entries those batches held.
    pub entries: usize,
    /// Entries that changed the aggregator.
    pub applied: usize,
    /// Router signals drained.
    pub signals: usize,
}

/// Sees everything [`ObservationSubscription::pump`] drains, in arrival order.
pub trait DeliveryObserver {
    /// Called for every entry, after it was applied to the aggregator.
    fn on_entry(&mut self, _entry: &PerformanceEntry, _aggregator: &MetricsAggregator) {}

    /// Called for every router signal. Nothing is applied for it otherwise.
    fn on_signal(&mut self, _signal: TimedSignal, _aggregator: &mut MetricsAggregator) {}
}

impl DeliveryObserver for () {}

/// The set of host registrations feeding one aggregator.
///
/// Every entry type is registered independently: a host that rejects one
/// type still delivers the others. Host batches and router signals share one
/// queue and are drained in the order they were sent.
#[derive(Debug)]
pub struct ObservationSubscription {
    host: Arc<dyn PerformanceHost>,
    entry_types: Vec<EntryType>,
    buffered: bool,
    registrations: Vec<Box<dyn Registration>>,
    failures: Vec<(EntryType, ObservationError)>,
    deliveries: Option<EventBus<Delivery>>,
    started: bool,
}

impl ObservationSubscription {
    /// Creates an inactive subscription for `entry_types`.
    pub fn new(host: Arc<dyn PerformanceHost>, entry_types: Vec<EntryType>, buffered: bool) -> Self {
        Self {
            host,
            entry_types,
            buffered,
            registrations: Vec::new(),
            failures: Vec::new(),
            deliveries: Some(EventBus::new()),
            started: false,
        }
    }

    /// Registers every configured entry type. Returns how many succeeded.
    ///
    /// Failures are logged and kept in [`failed_registrations`](Self::failed_registrations).
    /// Calling this again, or after [`stop`](Self::stop), does nothing.
    pub fn start(&mut self) -> usize {
        if self.started {
            log::debug!("Observation subscription already started");
            return self.registrations.len();
        }
        self.started = true;
        let Some(deliveries) = &self.deliveries else {
            return 0;
        };

        for &entry_type in &self.entry_types {
            let options = ObserveOptions {
                entry_type,
                buffered: self.buffered,
            };
            match self.host.observe(options, deliveries.sender()) {
                Ok(registration) => {
                    log::trace!("Observing {entry_type} entries on {}", self.host.host_id());
                    self.registrations.push(registration);
                }
                Err(e) => {
                    log::warn!("Could not observe {entry_type} entries: {e}");
                    self.failures.push((entry_type, e));
                }
            }
        }

        log::info!(
            "Observing {}/{} entry types on {}",
            self.registrations.len(),
            self.entry_types.len(),
            self.host.host_id()
        );
        self.registrations.len()
    }

    /// Disconnects every registration and discards undelivered batches and
    /// signals. Navigation senders fail from then on.
    ///
    /// Idempotent, and safe to call before [`start`](Self::start).
    pub fn stop(&mut self) {
        self.started = true;
        if self.deliveries.is_none() {
            return;
        }
        for registration in &mut self.registrations {
            registration.disconnect();
        }
        self.registrations.clear();
        self.deliveries = None;
        log::debug!("Observation subscription on {} stopped", self.host.host_id());
    }

    /// Returns `true` while at least one registration delivers entries.
    pub fn is_active(&self) -> bool {
        self.deliveries.is_some() && self.registrations.iter().any(|r| r.is_connected())
    }

    /// Entry types registered successfully.
    pub fn registered_entry_types(&self) -> Vec<EntryType> {
        self.registrations.iter().map(|r| r.entry_type()).collect()
    }

    /// Entry types the host refused, with the reason.
    pub fn failed_registrations(&self) -> &[(EntryType, ObservationError)] {
        &self.failures
    }

    /// A handle the router uses to queue signals behind the host's batches.
    ///
    /// Returns `None` once the subscription is stopped.
    pub fn navigation_sender(&self) -> Option<NavigationSender> {
        let deliveries = self.deliveries.as_ref()?;
        Some(NavigationSender::new(Arc::clone(&self.host), deliveries.sender()))
    }

    /// Drains the queue into `aggregator`, in arrival order.
    ///
    /// Entries are classified and applied; signals are handed to `observer`
    /// when they come up, so entries sent after a signal land after it.
    pub fn pump(
        &self,
        classifier: &EventClassifier,
        aggregator: &mut MetricsAggregator,
        observer: &mut impl DeliveryObserver,
    ) -> PumpStats {
        let mut stats = PumpStats::default();
        let Some(deliveries) = &self.deliveries else {
            return stats;
        };

        for delivery in deliveries.drain() {
            match delivery {
                Delivery::Entries(batch) => {
                    stats.batches += 1;
                    stats.entries += batch.len();
                    for entry in &batch {
                        if let Some(update) = classifier.classify(entry) {
                            if aggregator.apply_update(update) {
                                stats.applied += 1;
                            }
                        }
                        observer.on_entry(entry, aggregator);
                    }
                }
                Delivery::Navigation(signal) => {
                    stats.signals += 1;
                    observer.on_signal(signal, aggregator);
                }
            }
        }

        if stats.batches > 0 || stats.signals > 0 {
            log::trace!(
                "Pumped {} entries in {} batches and {} signals",
                stats.entries,
                stats.batches,
                stats.signals
            );
        }
        stats
    }
}

impl Drop for ObservationSubscription {
    fn drop(&mut self) {
        self.stop();
    }
}

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

//! The tracker service: the composition root of the crate.

use crate::aggregator::{MetricsAggregator, MetricsSnapshot};
use crate::classifier::{
    EventClassifier, PhaseUpdate, FIRST_CONTENTFUL_PAINT, FIRST_PAINT, HYDRATE_MEASURE,
};
use crate::config::TrackerConfig;
use crate::history::{NavigationHistory, PageLoadHistory, PageLoadRecord};
use crate::navigation::{CompletedNavigation, NavigationResetController, NavigationState};
use crate::presentation::MetricsPanel;
use crate::subscription::{DeliveryObserver, ObservationSubscription, PumpStats};
use std::sync::Arc;
use tempo_core::error::ObservationError;
use tempo_core::event::{NavigationSender, TimedSignal};
use tempo_core::host::PerformanceHost;
use tempo_core::navigation::{NavigationInfo, NavigationSignal};
use tempo_core::timing::{EntryType, PerformanceEntry, PhaseId};

/// Mark inserted when hydration starts.
pub const HYDRATE_START_MARK: &str = "hydrateStart";

/// Mark inserted when hydration ends.
pub const HYDRATE_END_MARK: &str = "hydrateEnd";

/// Live page performance tracking for one session.
///
/// Construct it once at application-root scope and pass it down by reference.
/// Everything happens on the caller's execution context: host deliveries and
/// router signals share one queue and are applied by [`tick`](Self::tick) in
/// the order they were sent.
#[derive(Debug)]
pub struct PerformanceTracker {
    host: Arc<dyn PerformanceHost>,
    config: TrackerConfig,
    client: bool,
    classifier: EventClassifier,
    aggregator: MetricsAggregator,
    subscription: ObservationSubscription,
    navigation: NavigationResetController,
    history: NavigationHistory,
    page_loads: PageLoadHistory,
}

impl PerformanceTracker {
    /// Creates an inactive tracker for `host`.
    pub fn new(host: Arc<dyn PerformanceHost>, config: TrackerConfig) -> Self {
        let client = host.is_client();
        if !client {
            log::info!(
                "{} is not a client context; performance tracking disabled",
                host.host_id()
            );
        }
        Self {
            subscription: ObservationSubscription::new(
                Arc::clone(&host),
                config.entry_types.clone(),
                config.buffered,
            ),
            classifier: EventClassifier::new(config.noise_floor_ms),
            aggregator: MetricsAggregator::new(config.aggregator_config()),
            navigation: NavigationResetController::new(config.reset_scope),
            history: NavigationHistory::new(config.history_capacity),
            page_loads: PageLoadHistory::new(config.history_capacity),
            host,
            config,
            client,
        }
    }

    /// Creates an inactive tracker with the default configuration.
    pub fn with_defaults(host: Arc<dyn PerformanceHost>) -> Self {
        Self::new(host, TrackerConfig::default())
    }

    /// Starts observing the host. Returns `false` outside a client context.
    pub fn start(&mut self) -> bool {
        if !self.client {
            log::debug!("Not starting performance tracking outside a client context");
            return false;
        }
        let registered = self.subscription.start();
        if registered == 0 {
            log::warn!("{} accepted no entry type; no metrics will be collected", self.host.host_id());
        }
        true
    }

    /// Stops observing. Idempotent, safe before [`start`](Self::start).
    pub fn stop(&mut self) {
        self.subscription.stop();
    }

    /// Returns `true` while the host delivers entries.
    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Returns `true` if the host is a client context.
    pub fn is_client(&self) -> bool {
        self.client
    }

    /// Applies everything queued since the last tick, in arrival order, and
    /// notifies observers.
    ///
    /// Signals take effect at the host time they were sent.
    pub fn tick(&mut self) -> PumpStats {
        let stats = self.apply_pending();
        self.aggregator.flush();
        stats
    }

    /// A sender the router can own to queue navigation signals.
    ///
    /// Returns `None` once the tracker is stopped.
    pub fn navigation_sender(&self) -> Option<NavigationSender> {
        self.subscription.navigation_sender()
    }

    /// Routes one router signal immediately, at the current host time.
    ///
    /// Whatever is already queued is applied first.
    pub fn handle_signal(&mut self, signal: NavigationSignal) -> Option<CompletedNavigation> {
        if !self.client {
            return None;
        }
        self.apply_pending();
        let now = self.host.now();
        let completed = self.navigation.handle(signal, now, &mut self.aggregator)?;
        self.history.push(completed.clone());
        Some(completed)
    }

    /// Called by the router before a client-side navigation.
    pub fn before_navigate(&mut self, info: NavigationInfo) {
        self.handle_signal(NavigationSignal::BeforeNavigate(info));
    }

    /// Called by the router once a client-side navigation completed.
    pub fn after_navigate(&mut self, info: NavigationInfo) -> Option<CompletedNavigation> {
        self.handle_signal(NavigationSignal::AfterNavigate(info))
    }

    /// Marks the start of hydration on the host.
    pub fn mark_hydration_start(&mut self) {
        if !self.client {
            return;
        }
        if let Err(e) = self.host.mark(HYDRATE_START_MARK) {
            log::warn!("Could not mark hydration start: {e}");
        }
    }

    /// Marks the end of hydration and measures it.
    ///
    /// The measure is applied directly too, so the hydration phase is known
    /// even when measures are not observed.
    pub fn mark_hydration_end(&mut self) {
        if !self.client {
            return;
        }
        let measured = self
            .host
            .mark(HYDRATE_END_MARK)
            .and_then(|_| self.host.measure(HYDRATE_MEASURE, HYDRATE_START_MARK, HYDRATE_END_MARK));
        match measured {
            Ok(timing) => {
                self.aggregator.apply_update(PhaseUpdate::Hydration(timing));
            }
            Err(ObservationError::Unsupported(EntryType::Mark | EntryType::Measure)) => {
                log::debug!("{} does not support marks; hydration not measured", self.host.host_id());
            }
            Err(e) => log::warn!("Could not measure hydration: {e}"),
        }
    }

    /// A new display handle, up to date with the current state.
    pub fn panel(&mut self) -> MetricsPanel {
        MetricsPanel::new(self.aggregator.subscribe())
    }

    /// A copy of the current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.aggregator.snapshot()
    }

    /// The underlying aggregator.
    pub fn aggregator(&self) -> &MetricsAggregator {
        &self.aggregator
    }

    /// Where the navigation measurement stands.
    pub fn navigation_state(&self) -> &NavigationState {
        self.navigation.state()
    }

    /// Completed client-side navigations, newest first.
    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    /// Forgets every completed navigation.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Page loads reported by the host, newest first.
    pub fn page_loads(&self) -> &PageLoadHistory {
        &self.page_loads
    }

    /// Forgets every page load record.
    pub fn clear_page_loads(&mut self) {
        self.page_loads.clear();
    }

    /// The configuration the tracker was built with.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Entry types the host refused at start.
    pub fn failed_registrations(&self) -> &[(EntryType, ObservationError)] {
        self.subscription.failed_registrations()
    }

    fn apply_pending(&mut self) -> PumpStats {
        let mut inbox = Inbox {
            client: self.client,
            now: self.host.now(),
            navigation: &mut self.navigation,
            history: &mut self.history,
            page_loads: &mut self.page_loads,
        };
        self.subscription
            .pump(&self.classifier, &mut self.aggregator, &mut inbox)
    }
}

/// The tracker state a pump writes to besides the aggregator.
struct Inbox<'a> {
    client: bool,
    now: f64,
    navigation: &'a mut NavigationResetController,
    history: &'a mut NavigationHistory,
    page_loads: &'a mut PageLoadHistory,
}

impl DeliveryObserver for Inbox<'_> {
    fn on_entry(&mut self, entry: &PerformanceEntry, aggregator: &MetricsAggregator) {
        match entry.entry_type {
            EntryType::Navigation => {
                let Some(timing) = entry.navigation_timing() else {
                    return;
                };
                let mut record = PageLoadRecord::new(self.now, entry.name.clone(), *timing);
                for (id, name) in [
                    (PhaseId::FirstPaint, FIRST_PAINT),
                    (PhaseId::FirstContentfulPaint, FIRST_CONTENTFUL_PAINT),
                ] {
                    if let Some(start) = aggregator.phase(id).start {
                        record.add_paint(name, start);
                    }
                }
                log::debug!("Page load of `{}` recorded", record.url);
                self.page_loads.push(record);
            }
            EntryType::Paint => {
                if let (Some(latest), Some(start)) = (self.page_loads.latest_mut(), entry.start_time) {
                    latest.add_paint(&entry.name, start);
                }
            }
            _ => {}
        }
    }

    fn on_signal(&mut self, timed: TimedSignal, aggregator: &mut MetricsAggregator) {
        if !self.client {
            return;
        }
        if let Some(completed) = self.navigation.handle(timed.signal, timed.at, aggregator) {
            self.history.push(completed);
        }
    }
}

impl Drop for PerformanceTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

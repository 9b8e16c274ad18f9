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

//! Owns every timing phase and the resource statistics of the current cycle.

use crate::classifier::{NavigationPhases, PhaseUpdate};
use serde::{Deserialize, Serialize};
use tempo_core::navigation::ResetScope;
use tempo_core::timing::{PhaseId, PhaseSet, PhaseTable, ResourceAggregate, TimingPhase};

/// Which largest-contentful-paint candidate is kept.
///
/// The host may report several candidates as the page evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LcpPolicy {
    /// Keep the first candidate delivered in a cycle: a stable snapshot.
    #[default]
    FirstCandidate,
    /// Replace the value with every new candidate, as browsers report LCP.
    LatestCandidate,
}

/// Parameters of a [`MetricsAggregator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorConfig {
    /// Phases that may be written; updates for other phases are dropped.
    pub tracked_phases: PhaseSet,
    /// LCP candidate policy.
    pub lcp_policy: LcpPolicy,
    /// Bound on `recent_resources`, `None` for unbounded.
    pub recent_resource_limit: Option<usize>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            tracked_phases: PhaseSet::all(),
            lcp_policy: LcpPolicy::default(),
            recent_resource_limit: None,
        }
    }
}

/// A read-only copy of the aggregator state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Navigation cycle the snapshot belongs to.
    pub generation: u64,
    /// Every phase of the schema.
    pub phases: PhaseTable,
    /// Absolute `domInteractive` timestamp of the last navigation record.
    pub dom_interactive_mark: Option<f64>,
    /// Absolute `domComplete` timestamp of the last navigation record.
    pub dom_complete_mark: Option<f64>,
    /// Resource statistics.
    pub resources: ResourceAggregate,
    /// Sum of the layout shifts not caused by input, `None` until one is seen.
    pub cumulative_layout_shift: Option<f64>,
}

impl MetricsSnapshot {
    /// Shorthand for `self.phases.get(id)`.
    pub fn phase(&self, id: PhaseId) -> TimingPhase {
        self.phases.get(id)
    }
}

/// Applies [`PhaseUpdate`]s and publishes snapshots to subscribers.
///
/// All mutation goes through `&mut self`, so a reset can never interleave with
/// a partially applied update, and readers only ever see whole snapshots.
#[derive(Debug)]
pub struct MetricsAggregator {
    config: AggregatorConfig,
    phases: PhaseTable,
    dom_interactive_mark: Option<f64>,
    dom_complete_mark: Option<f64>,
    resources: ResourceAggregate,
    cumulative_layout_shift: Option<f64>,
    generation: u64,
    dirty: bool,
    subscribers: Vec<flume::Sender<MetricsSnapshot>>,
}

impl MetricsAggregator {
    /// Creates an aggregator with every phase absent.
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            config,
            phases: PhaseTable::new(),
            dom_interactive_mark: None,
            dom_complete_mark: None,
            resources: ResourceAggregate::new(),
            cumulative_layout_shift: None,
            generation: 0,
            dirty: false,
            subscribers: Vec::new(),
        }
    }

    /// The aggregator's parameters.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Applies one classified update. Returns `true` if state changed.
    pub fn apply_update(&mut self, update: PhaseUpdate) -> bool {
        let changed = match update {
            PhaseUpdate::Navigation(phases) => self.apply_navigation(phases),
            PhaseUpdate::Paint { phase, timing } => self.assign_first(phase, timing),
            PhaseUpdate::LargestContentfulPaint(timing) => match self.config.lcp_policy {
                LcpPolicy::FirstCandidate => self.assign_first(PhaseId::LargestContentfulPaint, timing),
                LcpPolicy::LatestCandidate => self.assign(PhaseId::LargestContentfulPaint, timing),
            },
            PhaseUpdate::Resource(record) => {
                log::trace!("Recording resource `{}` ({}ms)", record.name, record.duration);
                self.resources
                    .record(record, self.config.recent_resource_limit);
                true
            }
            PhaseUpdate::Hydration(timing) => self.assign_first(PhaseId::Hydration, timing),
            PhaseUpdate::FirstInputDelay(timing) => self.assign_first(PhaseId::FirstInputDelay, timing),
            PhaseUpdate::LayoutShift(value) => {
                if value.is_finite() {
                    *self.cumulative_layout_shift.get_or_insert(0.0) += value;
                }
                value.is_finite()
            }
        };
        self.dirty |= changed;
        changed
    }

    /// Publishes the SPA navigation phase, in-flight or completed.
    pub fn set_spa_navigation(&mut self, timing: TimingPhase) {
        if self.config.tracked_phases.contains(PhaseId::SpaNavigation) {
            self.phases.set(PhaseId::SpaNavigation, timing);
            self.dirty = true;
        }
    }

    /// Starts a new cycle: every phase, mark and resource statistic is cleared.
    pub fn reset_cycle(&mut self) {
        self.reset_scope(ResetScope::Full);
    }

    /// Starts a new cycle, clearing only what `scope` covers.
    pub fn reset_scope(&mut self, scope: ResetScope) {
        match scope {
            ResetScope::Full => {
                self.phases.clear(PhaseSet::all());
                self.dom_interactive_mark = None;
                self.dom_complete_mark = None;
                self.resources.reset();
                self.cumulative_layout_shift = None;
            }
            ResetScope::SpaOnly => {
                self.phases.clear(PhaseSet::empty().with(PhaseId::SpaNavigation));
            }
        }
        self.generation += 1;
        self.dirty = true;
        log::debug!("Metrics reset ({scope:?}); cycle {}", self.generation);
    }

    /// Current navigation cycle.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current value of one phase.
    pub fn phase(&self, id: PhaseId) -> TimingPhase {
        self.phases.get(id)
    }

    /// Layout shift score accumulated this cycle.
    pub fn cumulative_layout_shift(&self) -> Option<f64> {
        self.cumulative_layout_shift
    }

    /// Current resource statistics.
    pub fn resources(&self) -> &ResourceAggregate {
        &self.resources
    }

    /// Returns a read-only copy of the current state.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            generation: self.generation,
            phases: self.phases,
            dom_interactive_mark: self.dom_interactive_mark,
            dom_complete_mark: self.dom_complete_mark,
            resources: self.resources.clone(),
            cumulative_layout_shift: self.cumulative_layout_shift,
        }
    }

    /// Registers a change listener.
    ///
    /// The receiver gets the current snapshot immediately, then one snapshot
    /// per [`MetricsAggregator::flush`] that follows a change.
    pub fn subscribe(&mut self) -> flume::Receiver<MetricsSnapshot> {
        let (sender, receiver) = flume::unbounded();
        // The receiver is alive, the send cannot fail.
        let _ = sender.send(self.snapshot());
        self.subscribers.push(sender);
        receiver
    }

    /// Number of live subscribers as of the last flush.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Publishes pending changes to every subscriber.
    ///
    /// Returns the number of subscribers notified; dropped receivers are pruned.
    pub fn flush(&mut self) -> usize {
        if !self.dirty {
            return 0;
        }
        self.dirty = false;

        let snapshot = self.snapshot();
        self.subscribers
            .retain(|subscriber| subscriber.send(snapshot.clone()).is_ok());
        self.subscribers.len()
    }

    fn apply_navigation(&mut self, update: NavigationPhases) -> bool {
        let mut changed = false;
        for (id, timing) in update.phases {
            changed |= self.assign(id, timing);
        }
        if update.dom_interactive_mark.is_some() {
            self.dom_interactive_mark = update.dom_interactive_mark;
            changed = true;
        }
        if update.dom_complete_mark.is_some() {
            self.dom_complete_mark = update.dom_complete_mark;
            changed = true;
        }
        changed
    }

    fn assign(&mut self, id: PhaseId, timing: TimingPhase) -> bool {
        if !self.config.tracked_phases.contains(id) || !timing.is_measured() {
            return false;
        }
        self.phases.set(id, timing);
        true
    }

    fn assign_first(&mut self, id: PhaseId, timing: TimingPhase) -> bool {
        if self.phases.get(id).is_measured() {
            log::trace!("{id} already recorded this cycle; keeping the first value");
            return false;
        }
        self.assign(id, timing)
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new(AggregatorConfig::default())
    }
}

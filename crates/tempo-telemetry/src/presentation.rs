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

//! Read-only view of the metrics for a display component.

use crate::aggregator::MetricsSnapshot;
use crate::format::{format_bytes, format_ms};
use tempo_core::timing::{PhaseId, ResourceAggregate, TimingPhase};

/// A display-side handle on the live metrics.
///
/// The panel only ever reads snapshots; its single piece of writable state is
/// whether it is expanded.
#[derive(Debug)]
pub struct MetricsPanel {
    updates: flume::Receiver<MetricsSnapshot>,
    current: MetricsSnapshot,
    open: bool,
}

impl MetricsPanel {
    /// Wraps a receiver obtained from [`MetricsAggregator::subscribe`](crate::MetricsAggregator::subscribe).
    pub fn new(updates: flume::Receiver<MetricsSnapshot>) -> Self {
        let mut panel = Self {
            updates,
            current: MetricsSnapshot::default(),
            open: false,
        };
        panel.refresh();
        panel
    }

    /// Catches up with published snapshots, keeping only the newest.
    ///
    /// Returns `true` if the displayed snapshot changed.
    pub fn refresh(&mut self) -> bool {
        match self.updates.try_iter().last() {
            Some(snapshot) => {
                self.current = snapshot;
                true
            }
            None => false,
        }
    }

    /// The snapshot currently displayed.
    pub fn snapshot(&self) -> &MetricsSnapshot {
        &self.current
    }

    /// One phase of the displayed snapshot.
    pub fn phase(&self, id: PhaseId) -> TimingPhase {
        self.current.phase(id)
    }

    /// Resource statistics of the displayed snapshot.
    pub fn resources(&self) -> &ResourceAggregate {
        &self.current.resources
    }

    /// Returns `true` while the tracker behind the panel still publishes.
    pub fn is_connected(&self) -> bool {
        !self.updates.is_disconnected()
    }

    /// Returns `true` while the panel is expanded.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Expands or collapses the panel.
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// Expands the panel if `open`, collapses it otherwise.
    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    /// Labelled, formatted values in display order.
    ///
    /// Only phases with a duration are listed, then the layout shift score and
    /// resource totals.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let mut rows: Vec<_> = self
            .current
            .phases
            .iter()
            .filter(|(_, timing)| timing.duration.is_some())
            .map(|(id, timing)| (id.label(), format_ms(timing.duration)))
            .collect();

        if let Some(cls) = self.current.cumulative_layout_shift {
            rows.push(("Cumulative layout shift", format!("{cls:.3}")));
        }

        let resources = &self.current.resources;
        if !resources.is_empty() {
            rows.push(("Resources", resources.total_count().to_string()));
            rows.push((
                "Cached resources",
                format!("{}/{}", resources.from_cache_count(), resources.total_count()),
            ));
            rows.push(("Download time", format_ms(Some(resources.total_download_time()))));
            let transferred: u64 = resources
                .recent_resources()
                .iter()
                .filter_map(|r| r.transfer_size)
                .sum();
            rows.push((
                "Transferred (recent)",
                format_bytes(i64::try_from(transferred).ok()),
            ));
            rows.push((
                "Render blocking",
                if resources.has_blocking_resource() { "yes" } else { "no" }.to_owned(),
            ));
        }
        rows
    }
}

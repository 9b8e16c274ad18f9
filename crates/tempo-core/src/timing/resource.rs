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

//! Resource records and the per-cycle resource aggregate.

use super::entry::DeliveryType;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A single observed resource load. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    /// URL of the resource.
    pub name: String,
    /// Start time relative to the time origin, if reported.
    pub start_time: Option<f64>,
    /// How long the load took.
    pub duration: f64,
    /// Delivery origin, if reported.
    pub delivery: Option<DeliveryType>,
    /// Whether the resource blocked rendering.
    pub render_blocking: bool,
    /// What initiated the load, if reported.
    pub initiator_type: Option<String>,
    /// Bytes transferred, if reported.
    pub transfer_size: Option<u64>,
}

impl ResourceRecord {
    /// Creates a network-delivered, non-blocking record.
    pub fn new(name: impl Into<String>, duration: f64) -> Self {
        Self {
            name: name.into(),
            start_time: None,
            duration,
            delivery: None,
            render_blocking: false,
            initiator_type: None,
            transfer_size: None,
        }
    }

    /// Returns `true` if the resource was served from the cache.
    pub fn from_cache(&self) -> bool {
        self.delivery == Some(DeliveryType::Cache)
    }
}

/// Resource-loading statistics for one navigation cycle.
///
/// `from_cache_count <= total_count` always holds, `has_blocking_resource`
/// never goes back to `false` until [`ResourceAggregate::reset`], and
/// `recent_resources` is ordered newest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAggregate {
    total_count: u64,
    from_cache_count: u64,
    total_download_time: f64,
    has_blocking_resource: bool,
    recent_resources: VecDeque<ResourceRecord>,
}

impl ResourceAggregate {
    /// An empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one accepted resource into the aggregate.
    ///
    /// `limit` bounds `recent_resources`; the oldest records are dropped first.
    /// Counters keep counting past the bound.
    pub fn record(&mut self, record: ResourceRecord, limit: Option<usize>) {
        self.total_count += 1;
        if record.from_cache() {
            self.from_cache_count += 1;
        }
        self.total_download_time += record.duration;
        self.has_blocking_resource |= record.render_blocking;

        self.recent_resources.push_front(record);
        if let Some(limit) = limit {
            self.recent_resources.truncate(limit);
        }
    }

    /// Returns the aggregate to zero/empty.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Number of accepted resources.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Number of accepted resources served from the cache.
    pub fn from_cache_count(&self) -> u64 {
        self.from_cache_count
    }

    /// Sum of accepted resource durations.
    pub fn total_download_time(&self) -> f64 {
        self.total_download_time
    }

    /// Whether any accepted resource blocked rendering this cycle.
    pub fn has_blocking_resource(&self) -> bool {
        self.has_blocking_resource
    }

    /// Recorded resources, newest first.
    pub fn recent_resources(&self) -> &VecDeque<ResourceRecord> {
        &self.recent_resources
    }

    /// Fraction of resources served from the cache, once any were recorded.
    pub fn cache_hit_ratio(&self) -> Option<f64> {
        (self.total_count > 0).then(|| self.from_cache_count as f64 / self.total_count as f64)
    }

    /// Returns `true` if nothing was recorded this cycle.
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(name: &str, duration: f64) -> ResourceRecord {
        ResourceRecord {
            delivery: Some(DeliveryType::Cache),
            ..ResourceRecord::new(name, duration)
        }
    }

    #[test]
    fn record_updates_counters() {
        let mut aggregate = ResourceAggregate::new();
        aggregate.record(ResourceRecord::new("a.js", 10.0), None);
        aggregate.record(cached("b.css", 2.5), None);

        assert_eq!(aggregate.total_count(), 2);
        assert_eq!(aggregate.from_cache_count(), 1);
        assert_eq!(aggregate.total_download_time(), 12.5);
        assert_eq!(aggregate.cache_hit_ratio(), Some(0.5));
        assert!(!aggregate.has_blocking_resource());
    }

    #[test]
    fn recent_resources_are_newest_first() {
        let mut aggregate = ResourceAggregate::new();
        aggregate.record(ResourceRecord::new("first", 1.0), None);
        aggregate.record(ResourceRecord::new("second", 1.0), None);

        let names: Vec<_> = aggregate
            .recent_resources()
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, ["second", "first"]);
    }

    #[test]
    fn limit_drops_oldest_but_keeps_counting() {
        let mut aggregate = ResourceAggregate::new();
        for i in 0..5 {
            aggregate.record(ResourceRecord::new(format!("r{i}"), 1.0), Some(2));
        }

        assert_eq!(aggregate.total_count(), 5);
        assert_eq!(aggregate.recent_resources().len(), 2);
        assert_eq!(aggregate.recent_resources()[0].name, "r4");
        assert_eq!(aggregate.recent_resources()[1].name, "r3");
    }

    #[test]
    fn blocking_flag_is_sticky_until_reset() {
        let mut aggregate = ResourceAggregate::new();
        let blocking = ResourceRecord {
            render_blocking: true,
            ..ResourceRecord::new("style.css", 4.0)
        };
        aggregate.record(blocking, None);
        aggregate.record(ResourceRecord::new("img.png", 4.0), None);
        assert!(aggregate.has_blocking_resource());

        aggregate.reset();
        assert!(!aggregate.has_blocking_resource());
        assert!(aggregate.is_empty());
        assert_eq!(aggregate.cache_hit_ratio(), None);
    }
}

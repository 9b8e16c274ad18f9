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

//! Bounded, newest-first records of page loads and client-side navigations.

use crate::navigation::CompletedNavigation;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tempo_core::timing::NavigationTiming;

/// Default number of records kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Completed client-side navigations, newest first.
pub type NavigationHistory = History<CompletedNavigation>;

/// Page loads, newest first.
pub type PageLoadHistory = History<PageLoadRecord>;

/// One document load, as reported by the host's navigation entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLoadRecord {
    /// Host clock when the record was taken.
    pub recorded_at: f64,
    /// Document URL, as named by the navigation entry.
    pub url: String,
    /// The raw navigation timestamps.
    pub timing: NavigationTiming,
    /// Paint start times by paint name.
    pub paints: BTreeMap<String, f64>,
}

impl PageLoadRecord {
    /// A record without paints.
    pub fn new(recorded_at: f64, url: impl Into<String>, timing: NavigationTiming) -> Self {
        Self {
            recorded_at,
            url: url.into(),
            timing,
            paints: BTreeMap::new(),
        }
    }

    /// Records a paint. The first start time per name wins.
    pub fn add_paint(&mut self, name: &str, start_time: f64) -> bool {
        if self.paints.contains_key(name) {
            return false;
        }
        self.paints.insert(name.to_owned(), start_time);
        true
    }

    /// `responseStart - fetchStart`, when both are known.
    pub fn time_to_first_byte(&self) -> Option<f64> {
        Some(self.timing.response_start? - self.timing.fetch_start?)
    }

    /// `loadEventEnd - fetchStart`, when both are known.
    pub fn full_load(&self) -> Option<f64> {
        Some(self.timing.load_event_end? - self.timing.fetch_start?)
    }
}

/// A bounded list of records, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct History<T> {
    #[serde(skip)]
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T> History<T> {
    /// Creates an empty history holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// Records an item, evicting the oldest one when full.
    pub fn push(&mut self, item: T) {
        self.entries.push_front(item);
        self.entries.truncate(self.capacity);
    }

    /// Iterates newest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// The most recent record.
    pub fn latest(&self) -> Option<&T> {
        self.entries.front()
    }

    /// The most recent record, mutably.
    pub fn latest_mut(&mut self) -> Option<&mut T> {
        self.entries.front_mut()
    }

    /// Number of records kept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was recorded since the last clear.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of records kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forgets every record.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_core::navigation::NavigationKind;
    use tempo_core::timing::TimingPhase;

    fn navigation(to: &str, start: f64) -> CompletedNavigation {
        CompletedNavigation {
            from: None,
            to: Some(to.to_owned()),
            kind: NavigationKind::Link,
            timing: TimingPhase::between(start, start + 10.0),
        }
    }

    #[test]
    fn keeps_newest_first_within_capacity() {
        let mut history = NavigationHistory::new(2);
        history.push(navigation("/a", 0.0));
        history.push(navigation("/b", 20.0));
        history.push(navigation("/c", 40.0));

        let routes: Vec<_> = history.iter().filter_map(|n| n.to.as_deref()).collect();
        assert_eq!(routes, ["/c", "/b"]);
        assert_eq!(history.latest().and_then(|n| n.to.as_deref()), Some("/c"));
    }

    #[test]
    fn clear_empties_the_history() {
        let mut history = NavigationHistory::default();
        history.push(navigation("/a", 0.0));
        history.clear();

        assert!(history.is_empty());
        assert_eq!(history.capacity(), DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn page_load_derives_ttfb_and_keeps_first_paints() {
        let timing = NavigationTiming {
            fetch_start: Some(5.0),
            response_start: Some(180.0),
            load_event_end: Some(405.0),
            ..NavigationTiming::default()
        };
        let mut history = PageLoadHistory::default();
        history.push(PageLoadRecord::new(410.0, "https://example.com/", timing));

        let record = history.latest_mut().unwrap();
        assert!(record.add_paint("first-paint", 90.0));
        assert!(!record.add_paint("first-paint", 120.0));

        let record = history.latest().unwrap();
        assert_eq!(record.time_to_first_byte(), Some(175.0));
        assert_eq!(record.full_load(), Some(400.0));
        assert_eq!(record.paints.get("first-paint"), Some(&90.0));
    }

    #[test]
    fn page_load_without_fetch_start_has_no_ttfb() {
        let record = PageLoadRecord::new(0.0, "/", NavigationTiming::default());
        assert_eq!(record.time_to_first_byte(), None);
        assert_eq!(record.full_load(), None);
    }
}

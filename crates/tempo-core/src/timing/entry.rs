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

//! Raw performance entries as reported by a host runtime.
//!
//! Field names follow the host's camelCase wire names when serialized. Every
//! timestamp is optional: hosts routinely omit fields they do not support, and
//! the classifier has to cope with partially populated entries.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// The kind of a performance entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Document navigation timing.
    #[serde(rename = "navigation")]
    Navigation,
    /// First paint / first contentful paint.
    #[serde(rename = "paint")]
    Paint,
    /// A subresource load.
    #[serde(rename = "resource")]
    Resource,
    /// A largest-contentful-paint candidate.
    #[serde(rename = "largest-contentful-paint")]
    LargestContentfulPaint,
    /// An application measure.
    #[serde(rename = "measure")]
    Measure,
    /// An application mark.
    #[serde(rename = "mark")]
    Mark,
    /// A main-thread task over 50ms.
    #[serde(rename = "longtask")]
    LongTask,
    /// A slow animation frame.
    #[serde(rename = "long-animation-frame")]
    LongAnimationFrame,
    /// Input event timing.
    #[serde(rename = "event")]
    Event,
    /// Element timing.
    #[serde(rename = "element")]
    Element,
    /// A layout shift.
    #[serde(rename = "layout-shift")]
    LayoutShift,
    /// The first input delay.
    #[serde(rename = "first-input")]
    FirstInput,
}

impl EntryType {
    /// Every entry type this crate knows about.
    pub const ALL: [EntryType; 12] = [
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
        EntryType::LayoutShift,
        EntryType::FirstInput,
    ];

    /// The host's name for this entry type.
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Navigation => "navigation",
            EntryType::Paint => "paint",
            EntryType::Resource => "resource",
            EntryType::LargestContentfulPaint => "largest-contentful-paint",
            EntryType::Measure => "measure",
            EntryType::Mark => "mark",
            EntryType::LongTask => "longtask",
            EntryType::LongAnimationFrame => "long-animation-frame",
            EntryType::Event => "event",
            EntryType::Element => "element",
            EntryType::LayoutShift => "layout-shift",
            EntryType::FirstInput => "first-input",
        }
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an entry type name the crate does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown performance entry type: {0}")]
pub struct UnknownEntryType(pub String);

impl FromStr for EntryType {
    type Err = UnknownEntryType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEntryType(s.to_string()))
    }
}

/// How a resource was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryType {
    /// Served from the HTTP cache.
    Cache,
    /// Fetched over the network.
    Network,
    /// Served from a navigational prefetch.
    NavigationalPrefetch,
}

/// Whether a resource blocked rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderBlockingStatus {
    /// The resource blocked the first render.
    Blocking,
    /// The resource did not block rendering.
    NonBlocking,
}

/// The timestamps of a navigation timing record, in host milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigationTiming {
    /// Start of the first HTTP redirect.
    pub redirect_start: Option<f64>,
    /// End of the last HTTP redirect.
    pub redirect_end: Option<f64>,
    /// Service worker startup; zero when no worker ran.
    pub worker_start: Option<f64>,
    /// The browser is ready to fetch the document.
    pub fetch_start: Option<f64>,
    /// Start of the DNS lookup.
    pub domain_lookup_start: Option<f64>,
    /// End of the DNS lookup.
    pub domain_lookup_end: Option<f64>,
    /// Start of the TCP connection.
    pub connect_start: Option<f64>,
    /// Connection established, TLS included.
    pub connect_end: Option<f64>,
    /// Start of the TLS handshake; zero on plain connections.
    pub secure_connection_start: Option<f64>,
    /// The request was sent.
    pub request_start: Option<f64>,
    /// First byte of the response.
    pub response_start: Option<f64>,
    /// Last byte of the response.
    pub response_end: Option<f64>,
    /// The document finished parsing.
    pub dom_interactive: Option<f64>,
    /// `DOMContentLoaded` handlers started.
    pub dom_content_loaded_event_start: Option<f64>,
    /// `DOMContentLoaded` handlers finished.
    pub dom_content_loaded_event_end: Option<f64>,
    /// The document and its subresources finished loading.
    pub dom_complete: Option<f64>,
    /// Unload handlers of the previous document started.
    pub unload_event_start: Option<f64>,
    /// Unload handlers of the previous document finished.
    pub unload_event_end: Option<f64>,
    /// `load` handlers started.
    pub load_event_start: Option<f64>,
    /// `load` handlers finished.
    pub load_event_end: Option<f64>,
}

/// Resource-specific fields of a resource timing record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceTiming {
    /// How the resource was delivered, when the host reports it.
    pub delivery_type: Option<DeliveryType>,
    /// Whether the resource blocked rendering, when the host reports it.
    pub render_blocking_status: Option<RenderBlockingStatus>,
    /// What initiated the load (`script`, `img`, `fetch`, ...).
    pub initiator_type: Option<String>,
    /// Bytes transferred over the wire.
    pub transfer_size: Option<u64>,
}

/// Fields of a layout shift record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutShiftTiming {
    /// Layout shift score of this shift.
    pub value: f64,
    /// Whether user input happened just before the shift.
    pub had_recent_input: bool,
}

/// Fields of an input event timing record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventTiming {
    /// When the event handlers started running.
    pub processing_start: Option<f64>,
    /// When the event handlers finished.
    pub processing_end: Option<f64>,
}

/// Kind-specific payload of an entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryDetails {
    /// No extra fields.
    #[default]
    None,
    /// A navigation timing record.
    Navigation(NavigationTiming),
    /// A resource timing record.
    Resource(ResourceTiming),
    /// A layout shift record.
    LayoutShift(LayoutShiftTiming),
    /// An input event record (`first-input`, `event`).
    Event(EventTiming),
}

/// One raw observed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceEntry {
    /// Entry name (URL for resources, mark/measure name, paint name).
    #[serde(default)]
    pub name: String,
    /// Entry kind.
    pub entry_type: EntryType,
    /// Start time relative to the time origin.
    #[serde(default)]
    pub start_time: Option<f64>,
    /// Duration of the entry.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Kind-specific payload.
    #[serde(default)]
    pub details: EntryDetails,
}

impl PerformanceEntry {
    /// Creates an entry with no timestamps and no payload.
    pub fn new(entry_type: EntryType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_type,
            start_time: None,
            duration: None,
            details: EntryDetails::None,
        }
    }

    /// Sets the start time.
    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Sets the duration.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Sets the kind-specific payload.
    pub fn with_details(mut self, details: EntryDetails) -> Self {
        self.details = details;
        self
    }

    /// A navigation entry for the current document, starting at the time origin.
    pub fn navigation(timing: NavigationTiming) -> Self {
        let duration = timing.load_event_end.unwrap_or(0.0);
        Self::new(EntryType::Navigation, "document")
            .with_start_time(0.0)
            .with_duration(duration)
            .with_details(EntryDetails::Navigation(timing))
    }

    /// A paint entry (`first-paint` or `first-contentful-paint`).
    pub fn paint(name: impl Into<String>, start_time: f64) -> Self {
        Self::new(EntryType::Paint, name)
            .with_start_time(start_time)
            .with_duration(0.0)
    }

    /// A largest-contentful-paint candidate.
    pub fn largest_contentful_paint(start_time: f64) -> Self {
        Self::new(EntryType::LargestContentfulPaint, "")
            .with_start_time(start_time)
            .with_duration(0.0)
    }

    /// A resource load.
    pub fn resource(
        name: impl Into<String>,
        start_time: f64,
        duration: f64,
        timing: ResourceTiming,
    ) -> Self {
        Self::new(EntryType::Resource, name)
            .with_start_time(start_time)
            .with_duration(duration)
            .with_details(EntryDetails::Resource(timing))
    }

    /// An application mark.
    pub fn mark(name: impl Into<String>, start_time: f64) -> Self {
        Self::new(EntryType::Mark, name)
            .with_start_time(start_time)
            .with_duration(0.0)
    }

    /// An application measure.
    pub fn measure(name: impl Into<String>, start_time: f64, duration: f64) -> Self {
        Self::new(EntryType::Measure, name)
            .with_start_time(start_time)
            .with_duration(duration)
    }

    /// A layout shift of score `value` at `start_time`.
    pub fn layout_shift(start_time: f64, value: f64, had_recent_input: bool) -> Self {
        Self::new(EntryType::LayoutShift, "")
            .with_start_time(start_time)
            .with_duration(0.0)
            .with_details(EntryDetails::LayoutShift(LayoutShiftTiming {
                value,
                had_recent_input,
            }))
    }

    /// The first input, received at `start_time` and handled from `processing_start`.
    pub fn first_input(name: impl Into<String>, start_time: f64, processing_start: f64) -> Self {
        Self::new(EntryType::FirstInput, name)
            .with_start_time(start_time)
            .with_details(EntryDetails::Event(EventTiming {
                processing_start: Some(processing_start),
                processing_end: None,
            }))
    }

    /// The navigation payload, if this entry carries one.
    pub fn navigation_timing(&self) -> Option<&NavigationTiming> {
        match &self.details {
            EntryDetails::Navigation(timing) => Some(timing),
            _ => None,
        }
    }

    /// The resource payload, if this entry carries one.
    pub fn resource_timing(&self) -> Option<&ResourceTiming> {
        match &self.details {
            EntryDetails::Resource(timing) => Some(timing),
            _ => None,
        }
    }

    /// The layout shift payload, if this entry carries one.
    pub fn layout_shift_timing(&self) -> Option<&LayoutShiftTiming> {
        match &self.details {
            EntryDetails::LayoutShift(timing) => Some(timing),
            _ => None,
        }
    }

    /// The input event payload, if this entry carries one.
    pub fn event_timing(&self) -> Option<&EventTiming> {
        match &self.details {
            EntryDetails::Event(timing) => Some(timing),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_type_names_match_host_names() {
        for kind in EntryType::ALL {
            assert_eq!(kind.as_str().parse::<EntryType>(), Ok(kind));
        }
        assert_eq!(EntryType::LongTask.to_string(), "longtask");
        assert!("layout".parse::<EntryType>().is_err());
    }

    #[test]
    fn deserializes_partial_resource_entry() {
        let json = r#"{
            "name": "https://cdn.example.com/app.js",
            "entryType": "resource",
            "startTime": 12.0,
            "duration": 30.5,
            "details": { "resource": { "deliveryType": "cache" } }
        }"#;
        let entry: PerformanceEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.entry_type, EntryType::Resource);
        let timing = entry.resource_timing().unwrap();
        assert_eq!(timing.delivery_type, Some(DeliveryType::Cache));
        assert_eq!(timing.render_blocking_status, None);
    }

    #[test]
    fn deserializes_entry_without_timestamps() {
        let json = r#"{ "entryType": "paint", "name": "first-paint" }"#;
        let entry: PerformanceEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.start_time, None);
        assert_eq!(entry.details, EntryDetails::None);
    }

    #[test]
    fn navigation_builder_spans_to_load_end() {
        let timing = NavigationTiming {
            load_event_end: Some(420.0),
            ..Default::default()
        };
        let entry = PerformanceEntry::navigation(timing);

        assert_eq!(entry.start_time, Some(0.0));
        assert_eq!(entry.duration, Some(420.0));
        assert!(entry.navigation_timing().is_some());
        assert!(entry.resource_timing().is_none());
    }

    #[test]
    fn deserializes_layout_shift_and_first_input_payloads() {
        let shift: PerformanceEntry = serde_json::from_str(
            r#"{ "entryType": "layout-shift", "startTime": 800.0,
                 "details": { "layoutShift": { "value": 0.12, "hadRecentInput": true } } }"#,
        )
        .unwrap();
        let input: PerformanceEntry = serde_json::from_str(
            r#"{ "entryType": "first-input", "name": "pointerdown", "startTime": 900.0,
                 "details": { "event": { "processingStart": 912.5 } } }"#,
        )
        .unwrap();

        let shift = shift.layout_shift_timing().unwrap();
        assert_eq!(shift.value, 0.12);
        assert!(shift.had_recent_input);
        assert_eq!(input.event_timing().unwrap().processing_start, Some(912.5));
        assert_eq!(input.event_timing().unwrap().processing_end, None);
    }
}

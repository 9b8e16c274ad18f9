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

//! Tracker configuration, loadable from JSON.

use crate::aggregator::{AggregatorConfig, LcpPolicy};
use crate::classifier::DEFAULT_NOISE_FLOOR_MS;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::subscription::DEFAULT_ENTRY_TYPES;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempo_core::navigation::ResetScope;
use tempo_core::timing::{EntryType, PhaseId, PhaseSet};

/// An error raised while loading a [`TrackerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configuration parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Every tunable of a [`PerformanceTracker`](crate::PerformanceTracker).
///
/// Missing fields take their default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TrackerConfig {
    /// Entry types to observe.
    pub entry_types: Vec<EntryType>,
    /// Ask the host for entries buffered before registration.
    pub buffered: bool,
    /// Resources faster than this, in milliseconds, are ignored.
    pub noise_floor_ms: f64,
    /// Bound on the recent resources list; `None` keeps all of them.
    pub recent_resource_limit: Option<usize>,
    /// Which LCP candidate is kept.
    pub lcp_policy: LcpPolicy,
    /// What a client-side navigation clears.
    pub reset_scope: ResetScope,
    /// Phases to track; `None` tracks all of them.
    pub tracked_phases: Option<Vec<PhaseId>>,
    /// Completed navigations kept in the history.
    pub history_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            entry_types: DEFAULT_ENTRY_TYPES.to_vec(),
            buffered: true,
            noise_floor_ms: DEFAULT_NOISE_FLOOR_MS,
            recent_resource_limit: None,
            lcp_policy: LcpPolicy::default(),
            reset_scope: ResetScope::default(),
            tracked_phases: None,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl TrackerConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded tracker config from {}", path.display());
        Self::from_json_str(&json)
    }

    /// Checks the values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.noise_floor_ms.is_finite() || self.noise_floor_ms < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "noiseFloorMs must be a non-negative number, got {}",
                self.noise_floor_ms
            )));
        }
        if self.entry_types.is_empty() {
            return Err(ConfigError::Invalid("entryTypes must not be empty".into()));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = self.entry_types.iter().find(|t| !seen.insert(**t)) {
            return Err(ConfigError::Invalid(format!(
                "entryTypes lists `{duplicate}` more than once"
            )));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid("historyCapacity must be at least 1".into()));
        }
        Ok(())
    }

    /// The phases the aggregator may write.
    pub fn phase_set(&self) -> PhaseSet {
        match &self.tracked_phases {
            Some(phases) => phases.iter().copied().collect(),
            None => PhaseSet::all(),
        }
    }

    /// The aggregator part of the configuration.
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            tracked_phases: self.phase_set(),
            lcp_policy: self.lcp_policy,
            recent_resource_limit: self.recent_resource_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_the_default() {
        let config = TrackerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert!(config.buffered);
        assert!(!config.entry_types.contains(&EntryType::LayoutShift));
        assert_eq!(config.phase_set(), PhaseSet::all());
    }

    #[test]
    fn parses_every_field() {
        let config = TrackerConfig::from_json_str(
            r#"{
                "entryTypes": ["navigation", "paint", "largest-contentful-paint"],
                "buffered": false,
                "noiseFloorMs": 0.5,
                "recentResourceLimit": 50,
                "lcpPolicy": "latest-candidate",
                "resetScope": "spa-only",
                "trackedPhases": ["first-paint", "spa-navigation"],
                "historyCapacity": 5
            }"#,
        )
        .unwrap();

        assert_eq!(config.entry_types.len(), 3);
        assert_eq!(config.lcp_policy, LcpPolicy::LatestCandidate);
        assert_eq!(config.reset_scope, ResetScope::SpaOnly);

        let aggregator = config.aggregator_config();
        assert_eq!(aggregator.recent_resource_limit, Some(50));
        assert!(aggregator.tracked_phases.contains(PhaseId::SpaNavigation));
        assert!(!aggregator.tracked_phases.contains(PhaseId::Dns));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            TrackerConfig::from_json_str(r#"{"noiseFloorMs": -1.0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TrackerConfig::from_json_str(r#"{"entryTypes": []}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TrackerConfig::from_json_str(r#"{"entryTypes": ["paint", "paint"]}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TrackerConfig::from_json_str(r#"{"historyCapacity": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_unknown_fields_and_entry_types() {
        assert!(matches!(
            TrackerConfig::from_json_str(r#"{"bufferd": true}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            TrackerConfig::from_json_str(r#"{"entryTypes": ["scroll"]}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = TrackerConfig::from_path("/nonexistent/tempo.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/tempo.json"));
    }
}

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

//! A host outside any client context, such as a server render.

use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempo_core::error::{ObservationError, ObservationResult};
use tempo_core::event::Delivery;
use tempo_core::host::{ObserveOptions, PerformanceHost, Registration};
use tempo_core::timing::EntryType;

/// A non-client host: every observation fails with
/// [`ObservationError::EnvironmentUnavailable`].
///
/// It counts `observe` calls so callers can check none were attempted.
#[derive(Debug, Default)]
pub struct DetachedHost {
    observe_calls: AtomicUsize,
}

impl DetachedHost {
    /// Creates a detached host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times [`PerformanceHost::observe`] was called.
    pub fn observe_calls(&self) -> usize {
        self.observe_calls.load(Ordering::Relaxed)
    }
}

impl PerformanceHost for DetachedHost {
    fn host_id(&self) -> Cow<'static, str> {
        Cow::Borrowed("detached")
    }

    fn is_client(&self) -> bool {
        false
    }

    fn supported_entry_types(&self) -> Vec<EntryType> {
        Vec::new()
    }

    fn now(&self) -> f64 {
        0.0
    }

    fn observe(
        &self,
        options: ObserveOptions,
        _sink: flume::Sender<Delivery>,
    ) -> ObservationResult<Box<dyn Registration>> {
        self.observe_calls.fetch_add(1, Ordering::Relaxed);
        log::warn!("Refusing to observe {} entries outside a client context", options.entry_type);
        Err(ObservationError::EnvironmentUnavailable)
    }

    fn mark(&self, _name: &str) -> ObservationResult<f64> {
        Err(ObservationError::EnvironmentUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_always_fails_and_is_counted() {
        let host = DetachedHost::new();
        let (sink, _deliveries) = flume::unbounded();

        let result = host.observe(ObserveOptions::buffered(EntryType::Paint), sink);

        assert_eq!(result.unwrap_err(), ObservationError::EnvironmentUnavailable);
        assert_eq!(host.observe_calls(), 1);
        assert!(!host.is_client());
    }

    #[test]
    fn measure_falls_back_to_unsupported() {
        let host = DetachedHost::new();
        assert_eq!(
            host.measure("hydrate", "a", "b"),
            Err(ObservationError::Unsupported(EntryType::Measure))
        );
    }
}

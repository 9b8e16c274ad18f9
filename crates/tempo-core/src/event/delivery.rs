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

//! The ordered input queue shared by the host and the router.
//!
//! Host batches and router signals travel through the same channel, so the
//! tracker applies them in the order they happened.

use crate::error::{ObservationError, ObservationResult};
use crate::host::{EntryBatch, PerformanceHost};
use crate::navigation::{NavigationInfo, NavigationSignal};
use std::sync::Arc;

/// A router signal stamped with the host time at which it was sent.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSignal {
    /// The signal as emitted by the router.
    pub signal: NavigationSignal,
    /// Host clock when the signal was sent, in milliseconds.
    pub at: f64,
}

/// One item of a tracker's input queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Entries reported by the host, in host order.
    Entries(EntryBatch),
    /// A router signal.
    Navigation(TimedSignal),
}

impl Delivery {
    /// The entries, if this is a host batch.
    pub fn entries(&self) -> Option<&EntryBatch> {
        match self {
            Delivery::Entries(batch) => Some(batch),
            Delivery::Navigation(_) => None,
        }
    }
}

/// The router's handle on a tracker.
///
/// Each signal is stamped with the host clock at send time and queued behind
/// the host batches already delivered.
#[derive(Debug, Clone)]
pub struct NavigationSender {
    host: Arc<dyn PerformanceHost>,
    sink: flume::Sender<Delivery>,
}

impl NavigationSender {
    /// Creates a sender stamping signals with `host`'s clock.
    pub fn new(host: Arc<dyn PerformanceHost>, sink: flume::Sender<Delivery>) -> Self {
        Self { host, sink }
    }

    /// Queues `signal` and returns its timestamp.
    ///
    /// Fails with [`ObservationError::Disconnected`] once the tracker stopped.
    pub fn send(&self, signal: NavigationSignal) -> ObservationResult<f64> {
        let at = self.host.now();
        self.sink
            .send(Delivery::Navigation(TimedSignal { signal, at }))
            .map_err(|_| ObservationError::Disconnected)?;
        Ok(at)
    }

    /// Queues a "before navigate" signal.
    pub fn before_navigate(&self, info: NavigationInfo) -> ObservationResult<f64> {
        self.send(NavigationSignal::BeforeNavigate(info))
    }

    /// Queues an "after navigate" signal.
    pub fn after_navigate(&self, info: NavigationInfo) -> ObservationResult<f64> {
        self.send(NavigationSignal::AfterNavigate(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ObserveOptions, Registration};
    use crate::navigation::NavigationKind;
    use crate::timing::{EntryType, PerformanceEntry};
    use std::borrow::Cow;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Debug, Default)]
    struct Clock(AtomicU64);

    impl PerformanceHost for Clock {
        fn host_id(&self) -> Cow<'static, str> {
            Cow::Borrowed("clock")
        }
        fn is_client(&self) -> bool {
            true
        }
        fn supported_entry_types(&self) -> Vec<EntryType> {
            Vec::new()
        }
        fn now(&self) -> f64 {
            self.0.load(Ordering::Relaxed) as f64
        }
        fn observe(
            &self,
            options: ObserveOptions,
            _sink: flume::Sender<Delivery>,
        ) -> ObservationResult<Box<dyn Registration>> {
            Err(ObservationError::Unsupported(options.entry_type))
        }
    }

    #[test]
    fn signals_are_stamped_at_send_time() {
        let clock = Arc::new(Clock::default());
        let (sink, queue) = flume::unbounded();
        let sender = NavigationSender::new(clock.clone(), sink);

        clock.0.store(500, Ordering::Relaxed);
        sender.before_navigate(NavigationInfo::link("/", "/a")).unwrap();
        clock.0.store(650, Ordering::Relaxed);
        sender.after_navigate(NavigationInfo::new(NavigationKind::Link)).unwrap();

        let stamps: Vec<f64> = queue
            .try_iter()
            .filter_map(|d| match d {
                Delivery::Navigation(timed) => Some(timed.at),
                Delivery::Entries(_) => None,
            })
            .collect();
        assert_eq!(stamps, [500.0, 650.0]);
    }

    #[test]
    fn signals_queue_behind_earlier_batches() {
        let (sink, queue) = flume::unbounded();
        let sender = NavigationSender::new(Arc::new(Clock::default()), sink.clone());

        sender.before_navigate(NavigationInfo::link("/", "/a")).unwrap();
        sink.send(Delivery::Entries(vec![PerformanceEntry::paint("first-paint", 1.0)]))
            .unwrap();

        let order: Vec<bool> = queue.try_iter().map(|d| d.entries().is_some()).collect();
        assert_eq!(order, [false, true]);
    }

    #[test]
    fn send_fails_once_the_queue_is_gone() {
        let (sink, queue) = flume::unbounded();
        let sender = NavigationSender::new(Arc::new(Clock::default()), sink);
        drop(queue);

        assert_eq!(
            sender.before_navigate(NavigationInfo::link("/", "/a")),
            Err(ObservationError::Disconnected)
        );
    }
}

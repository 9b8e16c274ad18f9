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

/// A multi-producer, single-owner queue for one event type.
///
/// Producers (a router, a host binding) hold cloned senders; the owner drains
/// pending events on its own schedule, so handlers never run re-entrantly.
#[derive(Debug)]
pub struct EventBus<T: Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a new EventBus backed by an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::debug!("EventBus initialized.");
        Self { sender, receiver }
    }

    /// Queues an event for the owner.
    ///
    /// The owner holds the receiver, so this can only fail once the bus has
    /// been torn down; the event is then dropped.
    pub fn publish(&self, event: T) {
        if self.sender.send(event).is_err() {
            log::warn!("EventBus receiver disconnected; event dropped.");
        }
    }

    /// Returns a clone of the sending end, for handing to a producer.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns the receiving end.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Takes every event queued so far, in publish order, without blocking.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Number of events waiting to be drained.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl<T: Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{NavigationInfo, NavigationKind, NavigationSignal};
    use std::thread;

    fn before(to: &str) -> NavigationSignal {
        NavigationSignal::BeforeNavigate(NavigationInfo::new(NavigationKind::Link).with_to(to))
    }

    #[test]
    fn new_bus_is_empty() {
        let bus = EventBus::<NavigationSignal>::new();
        assert_eq!(bus.pending(), 0);
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn drain_preserves_publish_order() {
        let bus = EventBus::new();
        bus.publish(before("/a"));
        bus.publish(NavigationSignal::AfterNavigate(NavigationInfo::new(
            NavigationKind::Link,
        )));
        bus.publish(before("/b"));

        let drained = bus.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0], before("/a"));
        assert_eq!(drained[2], before("/b"));
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn external_senders_feed_the_owner() {
        let bus = EventBus::new();
        let sender = bus.sender();

        let handle = thread::spawn(move || {
            sender.send(before("/products")).expect("send from producer");
        });
        handle.join().expect("producer thread");

        assert_eq!(bus.drain(), vec![before("/products")]);
    }

    #[test]
    fn sender_fails_after_bus_is_dropped() {
        let bus = EventBus::new();
        let sender = bus.sender();
        drop(bus);

        assert!(sender.send(before("/gone")).is_err());
    }
}

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Change notification bus.
//!
//! A `tokio::sync::broadcast` fan-out of [`EngineEvent`]s. Every subscriber
//! sees every event in publish order. Because the engine serializes its
//! transactions, publish order equals completion order equals issue order.
//!
//! ```text
//!   Engine ──publish──► EventBus (broadcast) ──► monitor
//!                                        ├──► panel A
//!                                        └──► panel B
//! ```
//!
//! A slow subscriber that falls more than `capacity` events behind loses
//! the oldest ones; the loss is counted and logged, never surfaced as an
//! error.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::error::BusError;
use crate::value::{EventKey, Value};

// =============================================================================
// Events
// =============================================================================

/// An authoritative register value accepted from the device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    /// Register symbol, raw hex address or `flags`.
    pub key: EventKey,
    /// Decoded value.
    pub value: Value,
    /// Live scale reported with the value.
    pub scale: f64,
    /// When the transaction completed.
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    /// Creates an event stamped with the current time.
    pub fn now(key: EventKey, value: Value, scale: f64) -> Self {
        Self {
            key,
            value,
            scale,
            timestamp: Utc::now(),
        }
    }
}

/// Everything the engine publishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A register value was read.
    Changed(ChangeEvent),
    /// The busy count went from 0 to 1.
    OperationsStarted,
    /// The busy count went back to 0.
    OperationsIdle,
}

impl EngineEvent {
    /// Returns the change, if this is one.
    pub fn as_change(&self) -> Option<&ChangeEvent> {
        match self {
            Self::Changed(change) => Some(change),
            _ => None,
        }
    }
}

// =============================================================================
// Bus Statistics
// =============================================================================

/// Statistics for the event bus.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BusStats {
    /// Events published.
    pub events_published: u64,
    /// Events published while nobody was listening.
    pub events_unobserved: u64,
    /// Events lost by lagging subscribers.
    pub events_dropped: u64,
    /// Current number of subscribers.
    pub subscriber_count: u64,
}

#[derive(Debug, Default)]
struct AtomicBusStats {
    events_published: AtomicU64,
    events_unobserved: AtomicU64,
    events_dropped: AtomicU64,
}

// =============================================================================
// EventBus
// =============================================================================

/// Broadcast bus for engine events. Cheap to clone.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
    stats: Arc<AtomicBusStats>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);

        Self {
            sender,
            stats: Arc::new(AtomicBusStats::default()),
        }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that will see it; `0` when nobody
    /// is listening, which is not an error.
    pub fn publish(&self, event: EngineEvent) -> usize {
        self.stats.events_published.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(event) {
            Ok(count) => count,
            Err(_) => {
                self.stats.events_unobserved.fetch_add(1, Ordering::Relaxed);
                0
            }
        }
    }

    /// Publishes a register change.
    pub fn publish_change(&self, key: EventKey, value: Value, scale: f64) -> usize {
        tracing::trace!(key = %key, value = %value, scale, "Publishing change");
        self.publish(EngineEvent::Changed(ChangeEvent::now(key, value, scale)))
    }

    /// Creates a new subscriber. It sees events published from now on.
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            stats: self.stats.clone(),
        }
    }

    /// Returns the current number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Returns current statistics.
    pub fn stats(&self) -> BusStats {
        BusStats {
            events_published: self.stats.events_published.load(Ordering::Relaxed),
            events_unobserved: self.stats.events_unobserved.load(Ordering::Relaxed),
            events_dropped: self.stats.events_dropped.load(Ordering::Relaxed),
            subscriber_count: self.subscriber_count() as u64,
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .field(
                "events_published",
                &self.stats.events_published.load(Ordering::Relaxed),
            )
            .finish()
    }
}

// =============================================================================
// EventSubscriber
// =============================================================================

/// A subscription to the event bus.
pub struct EventSubscriber {
    receiver: broadcast::Receiver<EngineEvent>,
    stats: Arc<AtomicBusStats>,
}

impl EventSubscriber {
    /// Receives the next event.
    ///
    /// Lagging skips the lost events with a warning. Returns
    /// [`BusError::Closed`] once the engine is gone.
    pub async fn recv(&mut self) -> Result<EngineEvent, BusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Ok(event),
                Err(broadcast::error::RecvError::Closed) => return Err(BusError::Closed),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    self.stats.events_dropped.fetch_add(count, Ordering::Relaxed);
                    tracing::warn!(count, "Event subscriber lagged, events dropped");
                }
            }
        }
    }

    /// Receives the next register change, skipping busy transitions.
    pub async fn recv_change(&mut self) -> Result<ChangeEvent, BusError> {
        loop {
            if let EngineEvent::Changed(change) = self.recv().await? {
                return Ok(change);
            }
        }
    }

    /// Tries to receive an event without waiting.
    pub fn try_recv(&mut self) -> Result<Option<EngineEvent>, BusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Ok(Some(event)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => return Err(BusError::Closed),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    self.stats.events_dropped.fetch_add(count, Ordering::Relaxed);
                }
            }
        }
    }

    /// Drains every event currently buffered.
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

impl std::fmt::Debug for EventSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscriber")
            .field("pending", &self.receiver.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut subscriber = bus.subscribe();

        let count = bus.publish_change(EventKey::Register("SV".into()), Value::Number(50.0), 1.0);
        assert_eq!(count, 1);

        let change = subscriber.recv_change().await.unwrap();
        assert_eq!(change.key, EventKey::Register("SV".into()));
        assert_eq!(change.value, Value::Number(50.0));
        assert_eq!(change.scale, 1.0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_keep_order() {
        let bus = EventBus::new(16);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        bus.publish(EngineEvent::OperationsStarted);
        bus.publish_change(EventKey::Flags, Value::Unknown, 1.0);
        bus.publish(EngineEvent::OperationsIdle);

        for sub in [&mut sub1, &mut sub2] {
            assert_eq!(sub.recv().await.unwrap(), EngineEvent::OperationsStarted);
            assert!(sub.recv().await.unwrap().as_change().is_some());
            assert_eq!(sub.recv().await.unwrap(), EngineEvent::OperationsIdle);
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        assert_eq!(bus.publish(EngineEvent::OperationsIdle), 0);

        let stats = bus.stats();
        assert_eq!(stats.events_published, 1);
        assert_eq!(stats.events_unobserved, 1);
        assert_eq!(stats.subscriber_count, 0);
    }

    #[test]
    fn test_lagging_subscriber_counts_drops() {
        let bus = EventBus::new(2);
        let mut subscriber = bus.subscribe();

        for _ in 0..5 {
            bus.publish(EngineEvent::OperationsStarted);
        }

        let events = subscriber.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(bus.stats().events_dropped, 3);
    }

    #[tokio::test]
    async fn test_closed_when_bus_dropped() {
        let bus = EventBus::new(4);
        let mut subscriber = bus.subscribe();
        drop(bus);
        assert_eq!(subscriber.recv().await, Err(BusError::Closed));
    }

    #[test]
    fn test_event_serialization() {
        let event = EngineEvent::Changed(ChangeEvent::now(
            EventKey::Address(0x0164),
            Value::Number(21.5),
            0.1,
        ));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "changed");
        assert_eq!(json["key"], "0x0164");
        assert_eq!(json["value"]["kind"], "number");
        assert_eq!(json["scale"], 0.1);
    }
}

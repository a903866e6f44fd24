// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Busy accounting for top-level operations.
//!
//! Every public engine operation holds a [`BusyGuard`] for its whole
//! duration. The first guard taken publishes
//! [`EngineEvent::OperationsStarted`], the last one dropped publishes
//! [`EngineEvent::OperationsIdle`]. Because the count is released in
//! `Drop`, every exit path (success, `?`, cancellation) decrements it.
//!
//! Nested operations (a write issuing its own read, a group refresh
//! reading many registers) simply take more guards; only the 0→1 and 1→0
//! transitions are announced.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::bus::{EngineEvent, EventBus};

/// Reference count of in-flight logical operations.
#[derive(Debug, Clone)]
pub struct BusyTracker {
    count: Arc<Mutex<usize>>,
    bus: EventBus,
}

impl BusyTracker {
    /// Creates a tracker announcing transitions on `bus`.
    pub fn new(bus: EventBus) -> Self {
        Self {
            count: Arc::new(Mutex::new(0)),
            bus,
        }
    }

    /// Enters a busy section.
    pub fn enter(&self) -> BusyGuard {
        let mut count = self.count.lock();
        *count += 1;
        if *count == 1 {
            tracing::debug!("Operations started");
            // Published under the lock so Started/Idle can never be reordered.
            self.bus.publish(EngineEvent::OperationsStarted);
        }
        BusyGuard {
            tracker: self.clone(),
        }
    }

    /// Returns the current count.
    pub fn count(&self) -> usize {
        *self.count.lock()
    }

    /// Returns `true` while any operation is in flight.
    pub fn is_busy(&self) -> bool {
        self.count() > 0
    }

    fn leave(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            tracing::debug!("Operations idle");
            self.bus.publish(EngineEvent::OperationsIdle);
        }
    }
}

/// Keeps the engine busy until dropped.
#[must_use = "the operation stops counting as busy as soon as the guard is dropped"]
#[derive(Debug)]
pub struct BusyGuard {
    tracker: BusyTracker,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.tracker.leave();
    }
}

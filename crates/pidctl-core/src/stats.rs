// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Transaction statistics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Lock-free counters updated by every raw exchange.
#[derive(Debug, Default)]
pub struct EngineStats {
    transactions: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
    recoveries: AtomicU64,
    total_latency_us: AtomicU64,
}

impl EngineStats {
    /// Creates zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed exchange.
    pub fn record_success(&self, latency: Duration) {
        self.transactions.fetch_add(1, Ordering::Relaxed);
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.total_latency_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    /// Records an exchange the transport rejected.
    pub fn record_failure(&self) {
        self.transactions.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an exchange abandoned at its deadline.
    pub fn record_timeout(&self) {
        self.transactions.fetch_add(1, Ordering::Relaxed);
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a recovery pass.
    pub fn record_recovery(&self) {
        self.recoveries.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy.
    pub fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            transactions: self.transactions.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            recoveries: self.recoveries.load(Ordering::Relaxed),
            total_latency_us: self.total_latency_us.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStatsSnapshot {
    /// Raw exchanges attempted.
    pub transactions: u64,
    /// Exchanges that completed.
    pub successes: u64,
    /// Exchanges the transport failed.
    pub failures: u64,
    /// Exchanges abandoned at their deadline.
    pub timeouts: u64,
    /// Recovery passes run.
    pub recoveries: u64,
    /// Sum of successful exchange latencies.
    pub total_latency_us: u64,
}

impl EngineStatsSnapshot {
    /// Fraction of exchanges that succeeded, `1.0` when none were made.
    pub fn success_rate(&self) -> f64 {
        if self.transactions == 0 {
            1.0
        } else {
            self.successes as f64 / self.transactions as f64
        }
    }

    /// Mean latency of successful exchanges.
    pub fn average_latency(&self) -> Duration {
        if self.successes == 0 {
            Duration::ZERO
        } else {
            Duration::from_micros(self.total_latency_us / self.successes)
        }
    }
}

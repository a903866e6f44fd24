// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Engine timing settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Deadlines and delays of the transaction engine.
///
/// # Example (YAML)
///
/// ```yaml
/// engine:
///   register_deadline: 500ms
///   flags_deadline: 1s
///   settle_delay: 4ms
///   event_capacity: 256
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deadline of register reads, register writes and coil writes.
    #[serde(with = "humantime_serde")]
    pub register_deadline: Duration,

    /// Deadline of the status coil read.
    #[serde(with = "humantime_serde")]
    pub flags_deadline: Duration,

    /// Pause after each successful exchange for device turnaround.
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,

    /// Events buffered per subscriber before the oldest are dropped.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            register_deadline: Duration::from_millis(500),
            flags_deadline: Duration::from_secs(1),
            settle_delay: Duration::from_millis(4),
            event_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Validates the settings.
    pub fn validate(&self) -> EngineResult<()> {
        if self.register_deadline.is_zero() {
            return Err(EngineError::invalid_config(
                "register_deadline",
                "must be greater than zero",
            ));
        }
        if self.flags_deadline.is_zero() {
            return Err(EngineError::invalid_config(
                "flags_deadline",
                "must be greater than zero",
            ));
        }
        if self.settle_delay >= self.register_deadline {
            return Err(EngineError::invalid_config(
                "settle_delay",
                format!(
                    "{} is not shorter than the register deadline",
                    humantime::format_duration(self.settle_delay)
                ),
            ));
        }
        if self.event_capacity == 0 {
            return Err(EngineError::invalid_config(
                "event_capacity",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

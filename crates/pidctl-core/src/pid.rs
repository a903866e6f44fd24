// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Copying PID parameters between the working set and the stored slots.
//!
//! ```text
//!   store_pid_slot(3):  P ──► P3    I ──► I3    d ──► d3
//!   load_pid_slot(3):   P3 ──► P    I3 ──► I    d3 ──► d
//! ```
//!
//! Each copy reads the source, writes the destination and reads the
//! destination back, publishing both reads.

use pidctl_modbus::ModbusTransport;

use crate::catalog::{Range, PID_SLOTS};
use crate::engine::{Engine, Target};
use crate::error::{CodecError, EngineError, EngineResult};
use crate::value::{Reading, RegisterRef};

const PARAMETERS: [&str; 3] = ["P", "I", "d"];

fn check_slot(slot: u8) -> EngineResult<()> {
    let range = Range::new(1.0, f64::from(PID_SLOTS));
    if range.contains(f64::from(slot)) {
        Ok(())
    } else {
        Err(EngineError::invalid_argument(
            "PID slot",
            CodecError::OutOfRange {
                value: f64::from(slot),
                min: range.min,
                max: range.max,
            },
        ))
    }
}

impl<T: ModbusTransport> Engine<T> {
    /// Copies the working `P`, `I`, `d` into slot `slot` (1 to 9).
    ///
    /// Returns the verified values of the slot registers.
    pub async fn store_pid_slot(&self, slot: u8) -> EngineResult<Vec<(String, Reading)>> {
        check_slot(slot)?;
        let pairs = PARAMETERS.map(|p| (p.to_string(), format!("{p}{slot}")));
        self.copy_registers(&pairs).await
    }

    /// Copies slot `slot` (1 to 9) into the working `P`, `I`, `d`.
    ///
    /// Returns the verified working values.
    pub async fn load_pid_slot(&self, slot: u8) -> EngineResult<Vec<(String, Reading)>> {
        check_slot(slot)?;
        let pairs = PARAMETERS.map(|p| (format!("{p}{slot}"), p.to_string()));
        self.copy_registers(&pairs).await
    }

    async fn copy_registers(&self, pairs: &[(String, String)]) -> EngineResult<Vec<(String, Reading)>> {
        let _busy = self.enter_busy();

        let mut resolved = Vec::with_capacity(pairs.len());
        for (source, destination) in pairs {
            let source = self.resolve(&RegisterRef::Symbol(source.clone()))?;
            let destination = self.catalog().lookup(destination)?;
            resolved.push((source, destination));
        }

        let mut transport = self.lock_channel().await;
        let mut verified = Vec::with_capacity(resolved.len());
        for (source, destination) in resolved {
            let current = self.read_locked(&mut transport, &source, true).await?;
            let input = current.value.to_input().ok_or_else(|| {
                EngineError::invalid_argument(
                    &destination.symbol,
                    CodecError::UnknownValue(source.key.to_string()),
                )
            })?;
            let (_, validated) = self.prepare_write(&destination.symbol, &input)?;

            self.write_locked(&mut transport, destination, validated).await?;
            let reading = self
                .read_locked(&mut transport, &Target::from(destination), true)
                .await?;
            tracing::debug!(
                from = %source.key,
                to = %destination.symbol,
                value = %reading.value,
                "PID parameter copied"
            );
            verified.push((destination.symbol.clone(), reading));
        }
        Ok(verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_bounds() {
        assert!(check_slot(1).is_ok());
        assert!(check_slot(9).is_ok());
        assert!(matches!(
            check_slot(0),
            Err(EngineError::InvalidArgument {
                reason: CodecError::OutOfRange { .. },
                ..
            })
        ));
        assert!(check_slot(10).is_err());
    }
}

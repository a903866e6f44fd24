// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Abstract transport layer for the controller link.
//!
//! The engine only needs four function codes from the device: read coils
//! (FC 01), read holding registers (FC 03), write single coil (FC 05) and
//! write multiple registers (FC 16). [`ModbusTransport`] exposes exactly
//! those, plus the two recovery hooks the engine calls after a timed-out
//! exchange.

use async_trait::async_trait;
use std::fmt;

use crate::error::ModbusResult;

// =============================================================================
// TransportState
// =============================================================================

/// Connection state of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportState {
    /// Transport is disconnected.
    #[default]
    Disconnected,
    /// Transport is opening the link.
    Connecting,
    /// Transport is connected and ready.
    Connected,
    /// Transport is re-establishing the link after a lost exchange.
    Recovering,
    /// Transport encountered an error.
    Error,
}

impl TransportState {
    /// Returns `true` if the transport is connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns `true` if the transport is in a transitional state.
    pub fn is_transitional(&self) -> bool {
        matches!(self, Self::Connecting | Self::Recovering)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Recovering => "recovering",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

// =============================================================================
// ModbusTransport Trait
// =============================================================================

/// Abstract transport layer for Modbus communication.
///
/// A transport is bound to one unit id for its whole life. Every request
/// it sends is addressed to that unit.
///
/// # Implementors
///
/// - [`ModbusRtuTransport`](super::rtu::ModbusRtuTransport): serial RTU link
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Callers are expected to serialize
/// requests themselves; a half-duplex serial line cannot carry two frames
/// at once.
#[async_trait]
pub trait ModbusTransport: Send + Sync {
    // =========================================================================
    // Connection Management
    // =========================================================================

    /// Opens the link to the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be established.
    async fn connect(&mut self) -> ModbusResult<()>;

    /// Closes the link.
    async fn disconnect(&mut self) -> ModbusResult<()>;

    /// Returns `true` if the transport is connected.
    fn is_connected(&self) -> bool;

    /// Returns the current transport state.
    fn state(&self) -> TransportState;

    // =========================================================================
    // Recovery Hooks
    // =========================================================================

    /// Drops the link after an exchange was abandoned.
    ///
    /// Any partially received frame must be discarded so the next request
    /// starts from a clean decoder.
    async fn connection_lost(&mut self, reason: &str) -> ModbusResult<()> {
        tracing::debug!(transport = %self.display_name(), reason, "Connection lost");
        self.disconnect().await
    }

    /// Re-establishes the link after [`connection_lost`](Self::connection_lost).
    async fn connection_made(&mut self) -> ModbusResult<()> {
        self.connect().await
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Reads coils (FC 01).
    ///
    /// # Arguments
    ///
    /// * `address` - Starting coil address (0-based)
    /// * `count` - Number of coils to read
    async fn read_coils(&self, address: u16, count: u16) -> ModbusResult<Vec<bool>>;

    /// Reads holding registers (FC 03).
    ///
    /// # Arguments
    ///
    /// * `address` - Starting register address (0-based)
    /// * `count` - Number of registers to read
    async fn read_holding_registers(&self, address: u16, count: u16) -> ModbusResult<Vec<u16>>;

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Writes a single coil (FC 05).
    async fn write_single_coil(&self, address: u16, value: bool) -> ModbusResult<()>;

    /// Writes multiple holding registers (FC 16).
    async fn write_multiple_registers(&self, address: u16, values: &[u16]) -> ModbusResult<()>;

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Returns the unit ID (slave address).
    fn unit_id(&self) -> u8;

    /// Returns a display name for this transport.
    fn display_name(&self) -> String;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_state() {
        assert!(TransportState::Connected.is_connected());
        assert!(!TransportState::Disconnected.is_connected());
        assert!(!TransportState::Recovering.is_connected());

        assert!(TransportState::Connecting.is_transitional());
        assert!(TransportState::Recovering.is_transitional());
        assert!(!TransportState::Connected.is_transitional());
        assert_eq!(TransportState::default(), TransportState::Disconnected);
    }

    #[test]
    fn test_transport_state_display() {
        assert_eq!(TransportState::Connected.to_string(), "connected");
        assert_eq!(TransportState::Recovering.to_string(), "recovering");
    }
}

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # pidctl-modbus
//!
//! Serial Modbus RTU link to a PID temperature controller.
//!
//! This crate is the bottom layer of the stack. It knows how to open the
//! serial port and move raw words and bits; it knows nothing about what
//! the registers mean.
//!
//! - **Transport trait**: [`ModbusTransport`], the four function codes the
//!   controller needs plus the recovery hooks
//! - **RTU transport**: [`ModbusRtuTransport`] over `tokio-serial`
//! - **Configuration**: [`ModbusRtuConfig`] with factory defaults (9600 8N1, unit 5)
//! - **Errors**: [`ModbusError`] with severity and retryability metadata
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pidctl_modbus::{ModbusRtuConfig, ModbusRtuTransport, ModbusTransport};
//!
//! let config = ModbusRtuConfig::new("/dev/ttyUSB0");
//! let mut transport = ModbusRtuTransport::new(config);
//! transport.connect().await?;
//!
//! // SV lives in the first two holding registers.
//! let words = transport.read_holding_registers(0x0000, 2).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod client;
pub mod error;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{
    ConfigurationError, ConnectionError, ErrorSeverity, ModbusError, ModbusResult,
    OperationError, ProtocolError,
};

pub use types::{DataBits, ModbusRtuConfig, ModbusRtuConfigBuilder, Parity, StopBits};

pub use client::{ModbusRtuTransport, ModbusTransport, TransportState};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus transport implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  pidctl_core::Engine                            │
//! │      (typed registers, deadlines, recovery, events)             │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   ModbusTransport                               │
//! │        (FC 01 / 03 / 05 / 16 + recovery hooks)                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                  ┌─────────────────────┐
//!                  │  ModbusRtuTransport │
//!                  │   (tokio-modbus)    │
//!                  └─────────────────────┘
//! ```

mod rtu;
mod transport;

pub use rtu::ModbusRtuTransport;
pub use transport::{ModbusTransport, TransportState};

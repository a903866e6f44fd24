// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # pidctl-core
//!
//! Typed register transaction engine for a Modbus PID temperature controller.
//!
//! The engine turns a register symbol such as `SV` or `t-12` into a
//! correctly encoded two-word exchange, runs it against the transport under
//! a deadline, recovers the link when the deadline expires, serializes
//! concurrent callers, and republishes every value it reads.
//!
//! - **Catalog**: immutable register table, hand-authored and generated entries
//! - **Codec**: pure mapping between raw word pairs and domain values
//! - **Guard**: deadline race with guaranteed cancellation of the loser
//! - **Engine**: reads, writes, flags, coils, groups, PID slots, auto-tune
//! - **Bus**: broadcast of change and busy events
//!
//! ## Example
//!
//! ```rust,ignore
//! use pidctl_core::{Engine, EngineConfig, EngineEvent, RegisterInput};
//! use pidctl_modbus::{ModbusRtuConfig, ModbusRtuTransport};
//!
//! let transport = ModbusRtuTransport::new(ModbusRtuConfig::new("/dev/ttyUSB0"));
//! let engine = Engine::new(transport, EngineConfig::default())?;
//! engine.connect().await?;
//!
//! let mut events = engine.subscribe();
//! engine.apply_and_verify("t-01", RegisterInput::parse("Jump:-5")).await?;
//!
//! while let Ok(EngineEvent::Changed(change)) = events.recv().await {
//!     println!("{} = {}", change.key, change.value);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod catalog;
pub mod codec;
pub mod error;
pub mod guard;
pub mod value;

pub mod bus;
pub mod busy;
pub mod config;
pub mod engine;
pub mod stats;

pub mod autotune;
pub mod group;
pub mod pid;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::{Catalog, CompositeEntry, Domain, FactoryValue, Range, RegisterDescriptor};
pub use error::{BusError, CatalogError, CodecError, DeadlineExceeded, EngineError, EngineResult};
pub use guard::with_deadline;
pub use value::{EventKey, FlagSet, Reading, RegisterInput, RegisterRef, Value, FLAG_NAMES};

pub use bus::{BusStats, ChangeEvent, EngineEvent, EventBus, EventSubscriber};
pub use busy::{BusyGuard, BusyTracker};
pub use config::EngineConfig;
pub use engine::{Coil, ConnectionState, Engine};
pub use stats::{EngineStats, EngineStatsSnapshot};

pub use autotune::{AutoTuneOptions, AutoTuneReport, AutoTuneSample};
pub use group::{GroupMember, RegisterGroup};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

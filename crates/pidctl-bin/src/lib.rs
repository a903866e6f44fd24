// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # pidctl-bin
//!
//! Operator CLI for a Modbus PID temperature controller.
//!
//! - CLI argument parsing with clap
//! - Layered settings (defaults, file, environment, flags)
//! - Logging initialization
//! - Device session and interrupt handling
//! - Command implementations (list, read, write, monitor, autotune, ...)
//!
//! ## Architecture
//!
//! ```text
//!            main.rs
//!               │
//!       ┌───────┼─────────┐
//!       ▼       ▼         ▼
//!     cli    settings   logging
//!       │
//!       ▼
//!   commands ──► runtime (Session) ──► pidctl-core Engine
//!       │            │
//!       ▼            ▼
//!    output       shutdown
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Show the register catalog
//! pidctl list --group work
//!
//! # Read and write
//! pidctl -p /dev/ttyUSB0 read SV
//! pidctl write t-01 Jump:-5
//!
//! # Follow live values
//! pidctl monitor -i 500ms -f json
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod runtime;
pub mod settings;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands, OutputFormat};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use output::{Printer, Render};
pub use runtime::Session;
pub use settings::Settings;
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

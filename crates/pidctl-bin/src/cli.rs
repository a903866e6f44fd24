// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `list`: Show the register catalog (no device needed)
//! - `read` / `write`: Single register access
//! - `flags`: Status coils
//! - `dump`: Read a whole register group
//! - `pid`: Store or load a PID parameter slot
//! - `coil`: Switch the NAT or A/M coil
//! - `monitor`: Follow live values until Ctrl-C
//! - `autotune`: Run auto-tune with live samples until Ctrl-C

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use pidctl_core::{Coil, RegisterGroup};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// pidctl - inspect and tune a Modbus PID temperature controller
#[derive(Parser, Debug)]
#[command(
    name = "pidctl",
    author = "Sylvex <contact@sylvex.io>",
    version = pidctl_core::VERSION,
    about = "Inspect and tune a Modbus PID temperature controller",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path (YAML, TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "pidctl.yaml",
        env = "PIDCTL_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Serial port, overrides the configuration file
    #[arg(short, long, env = "PIDCTL_PORT", global = true)]
    pub port: Option<String>,

    /// Unit id of the controller, overrides the configuration file
    #[arg(short, long, global = true)]
    pub unit: Option<u8>,

    /// Output format for command results
    #[arg(short, long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PIDCTL_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format (text, json, compact)
    #[arg(long, env = "PIDCTL_LOG_FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Enable quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List catalog registers
    List(ListArgs),

    /// Read one register by symbol or 0xNNNN address
    Read(ReadArgs),

    /// Write one register and read it back
    ///
    /// Values are numbers (25.5), labels (On) or label:number (Jump:-5).
    Write(WriteArgs),

    /// Read the status flags
    Flags,

    /// Read every register of a group
    Dump(DumpArgs),

    /// Copy PID parameters between the working set and a stored slot
    Pid(PidArgs),

    /// Switch a control coil
    Coil(CoilArgs),

    /// Print live values until interrupted
    Monitor(IntervalArgs),

    /// Run auto-tune and print samples until interrupted
    Autotune(IntervalArgs),
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `list` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ListArgs {
    /// Only list this group
    #[arg(short, long)]
    pub group: Option<RegisterGroup>,
}

/// Arguments for the `read` command.
#[derive(Args, Debug, Clone)]
pub struct ReadArgs {
    /// Register symbol or raw address
    pub register: String,
}

/// Arguments for the `write` command.
#[derive(Args, Debug, Clone)]
pub struct WriteArgs {
    /// Register symbol
    pub register: String,

    /// New value
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

/// Arguments for the `dump` command.
#[derive(Args, Debug, Clone)]
pub struct DumpArgs {
    /// Group to read (control, work, function, status, pid, program)
    pub group: RegisterGroup,
}

/// Arguments for the `pid` command.
#[derive(Args, Debug, Clone)]
pub struct PidArgs {
    /// Transfer direction
    #[command(subcommand)]
    pub action: PidAction,
}

/// PID slot transfers.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidAction {
    /// Copy working P, I, d into a slot
    Store {
        /// Slot number (1-9)
        slot: u8,
    },
    /// Copy a slot into working P, I, d
    Load {
        /// Slot number (1-9)
        slot: u8,
    },
}

/// Arguments for the `coil` command.
#[derive(Args, Debug, Clone)]
pub struct CoilArgs {
    /// Coil to switch (nat, am)
    pub coil: Coil,

    /// New state
    pub state: CoilState,
}

/// Arguments for the `monitor` and `autotune` commands.
#[derive(Args, Debug, Clone)]
pub struct IntervalArgs {
    /// Time between samples (e.g. 500ms, 2s)
    #[arg(short, long, default_value = "1s", value_parser = humantime::parse_duration)]
    pub interval: Duration,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

/// Coil state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CoilState {
    /// Coil set
    On,
    /// Coil cleared
    Off,
}

impl CoilState {
    /// Returns `true` for [`CoilState::On`].
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns `true` if the command talks to the device.
    pub fn needs_device(&self) -> bool {
        !matches!(self.command, Commands::List(_))
    }

    /// Get the effective log level: flags first, then `configured`.
    pub fn effective_log_level<'a>(&'a self, configured: &'a str) -> &'a str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            self.log_level.as_deref().unwrap_or(configured)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

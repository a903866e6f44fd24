// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error hierarchy for the register engine.
//!
//! # Error Hierarchy
//!
//! ```text
//! EngineError (root)
//! ├── NotFound         - unknown register symbol, nothing sent
//! ├── InvalidArgument  - value outside the register's domain, nothing sent
//! │     └── CodecError
//! ├── Timeout          - deadline expired, link recovered before returning
//! │     └── DeadlineExceeded
//! ├── Transport        - any other transport failure, passed through unchanged
//! │     └── pidctl_modbus::ModbusError
//! ├── Catalog          - inconsistent register table
//! └── InvalidConfig    - rejected engine settings
//! ```
//!
//! A raw value that matches nothing in the register's domain is not an
//! error. It decodes to [`Value::Unknown`](crate::value::Value::Unknown).
//!
//! # Examples
//!
//! ```
//! use pidctl_core::error::{CodecError, EngineError};
//!
//! let error = EngineError::invalid_argument("P1", CodecError::OutOfRange {
//!     value: 400.0,
//!     min: 0.1,
//!     max: 300.0,
//! });
//! assert!(!error.is_retryable());
//! assert_eq!(error.category(), "invalid_argument");
//! ```

use thiserror::Error;

use pidctl_modbus::ModbusError;

pub use crate::guard::DeadlineExceeded;

// =============================================================================
// EngineError - Root Error Type
// =============================================================================

/// The root error type of the register engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The symbol is not in the catalog.
    #[error("Unknown register: {0}")]
    NotFound(String),

    /// The input does not fit the register's value domain.
    #[error("Invalid argument for {register}: {reason}")]
    InvalidArgument {
        /// Register the value was meant for.
        register: String,
        /// Why the codec rejected it.
        #[source]
        reason: CodecError,
    },

    /// An exchange did not complete before its deadline.
    #[error(transparent)]
    Timeout(#[from] DeadlineExceeded),

    /// The transport reported a failure other than a timeout.
    #[error("Transport failure: {0}")]
    Transport(#[from] ModbusError),

    /// The register table is inconsistent.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Engine settings were rejected.
    #[error("Invalid configuration for '{field}': {message}")]
    InvalidConfig {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

impl EngineError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(register: impl Into<String>, reason: CodecError) -> Self {
        Self::InvalidArgument {
            register: register.into(),
            reason,
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }

    /// Returns `true` for deadline expiries.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Returns `true` if the operation may succeed when issued again.
    ///
    /// The engine never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns `true` if the error was raised before anything reached the wire.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::InvalidArgument { .. } | Self::InvalidConfig { .. }
        )
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::Timeout(_) => "timeout",
            Self::Transport(_) => "transport",
            Self::Catalog(_) => "catalog",
            Self::InvalidConfig { .. } => "config",
        }
    }
}

// =============================================================================
// CodecError
// =============================================================================

/// Reasons the codec rejects a value on the write path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// Numeric input outside the allowed range.
    #[error("{value} is outside {min}..={max}")]
    OutOfRange {
        /// Rejected value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// Label not present in the enumeration or composite map.
    #[error("unknown label '{0}'")]
    UnknownLabel(String),

    /// Composite label selects a range but no number came with it.
    #[error("label '{0}' needs a number, e.g. '{0}:5'")]
    MissingNumber(String),

    /// Input shape does not fit the domain (number for a label list, ...).
    #[error("expected {expected}")]
    WrongInputKind {
        /// Description of what the domain accepts.
        expected: &'static str,
    },

    /// The scaled integer does not fit a signed 16-bit word.
    #[error("{value} cannot be encoded at scale {scale}")]
    NotRepresentable {
        /// Value before scaling.
        value: f64,
        /// Live scale reported by the device.
        scale: f64,
    },

    /// The register cannot be written.
    #[error("register is read-only")]
    ReadOnly,

    /// The current value decoded to nothing the domain knows, so it cannot
    /// be copied elsewhere.
    #[error("current value of {0} is not a valid domain value")]
    UnknownValue(String),
}

// =============================================================================
// CatalogError
// =============================================================================

/// Register table consistency errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two descriptors share a symbol.
    #[error("Duplicate register symbol: {0}")]
    DuplicateSymbol(String),

    /// Two descriptors share an address.
    #[error("Registers {first} and {second} share address {address:#06x}")]
    DuplicateAddress {
        /// Shared address.
        address: u16,
        /// Symbol declared first.
        first: String,
        /// Symbol declared second.
        second: String,
    },

    /// A range whose lower bound exceeds its upper bound.
    #[error("Register {0} has an empty range")]
    EmptyRange(String),
}

// =============================================================================
// BusError
// =============================================================================

/// Event bus errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// Every sender was dropped; no further events will arrive.
    #[error("Event bus closed")]
    Closed,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// A Result type with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Tests
// =============================================================================

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the pidctl binary.

use thiserror::Error;

use pidctl_core::EngineError;
use pidctl_modbus::ModbusError;

/// Result type alias for pidctl-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors that can occur in the pidctl binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Initialization error.
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Runtime error.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Config file loading error.
    #[error("Config error: {0}")]
    Settings(#[from] config::ConfigError),

    /// Register engine error.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Transport setup error.
    #[error("Transport error: {0}")]
    Transport(#[from] ModbusError),

    /// Interrupted before the command finished.
    #[error("Interrupted")]
    Interrupted,

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        /// The context description.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Creates a runtime error.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Creates an I/O error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Adds context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::Settings(_) => 1,
            Self::Initialization(_) => 2,
            Self::Runtime(_) => 3,
            Self::Io(_) => 4,
            Self::Engine(e) => match e {
                EngineError::NotFound(_) | EngineError::InvalidArgument { .. } => 5,
                EngineError::Timeout(_) => 6,
                EngineError::Transport(_) => 7,
                EngineError::Catalog(_) | EngineError::InvalidConfig { .. } => 1,
            },
            Self::Transport(_) => 7,
            Self::Interrupted => 130,
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }
}

impl From<std::io::Error> for BinError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BinError {
    fn from(err: serde_json::Error) -> Self {
        Self::Runtime(format!("cannot encode output: {err}"))
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Reports an error with its cause chain.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}

/// Reports an error and exits with the appropriate code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pidctl_core::{CodecError, DeadlineExceeded};
    use std::time::Duration;

    #[test]
    fn test_error_creation() {
        let err = BinError::config("test error");
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_error_with_context() {
        let err = BinError::config("inner error").with_context("outer context");
        assert_eq!(err.to_string(), "outer context: Configuration error: inner error");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(BinError::init("test").exit_code(), 2);
        assert_eq!(BinError::runtime("test").exit_code(), 3);
        assert_eq!(BinError::io("test").exit_code(), 4);
        assert_eq!(BinError::Interrupted.exit_code(), 130);

        let not_found = BinError::from(EngineError::NotFound("XX".into()));
        assert_eq!(not_found.exit_code(), 5);

        let invalid = BinError::from(EngineError::invalid_argument(
            "At",
            CodecError::UnknownLabel("Maybe".into()),
        ));
        assert_eq!(invalid.exit_code(), 5);

        let timeout = BinError::from(EngineError::from(DeadlineExceeded::new(
            "read_coils",
            Duration::from_secs(1),
        )));
        assert_eq!(timeout.exit_code(), 6);
        assert_eq!(timeout.to_string(), "read_coils timed out after 1s");
    }
}

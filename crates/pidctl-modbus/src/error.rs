// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Transport error types for the serial Modbus link.
//!
//! The register engine never retries on its own; these errors carry enough
//! metadata (`is_retryable`, `severity`, `category`) for a caller to decide.
//!
//! # Error Categories
//!
//! ```text
//! ModbusError
//! ├── Connection    - serial port / link state
//! ├── Protocol      - exception responses and malformed frames
//! ├── Operation     - read/write failures reported by the transport
//! └── Configuration - invalid serial settings
//! ```
//!
//! # Examples
//!
//! ```
//! use pidctl_modbus::error::{ModbusError, ConnectionError, ErrorSeverity};
//!
//! let error = ModbusError::connection(ConnectionError::serial_not_found("/dev/ttyUSB0"));
//! assert!(!error.is_retryable());
//! assert_eq!(error.severity(), ErrorSeverity::Error);
//! ```

use std::fmt;
use std::io;

use thiserror::Error;
use tracing::Level;

// =============================================================================
// ModbusError - Main Error Type
// =============================================================================

/// The main error type for transport operations.
#[derive(Debug, Error)]
pub enum ModbusError {
    /// Serial link errors.
    #[error("{0}")]
    Connection(#[from] ConnectionError),

    /// Modbus protocol errors (exception codes, framing).
    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    /// Operation errors (read/write failures).
    #[error("{0}")]
    Operation(#[from] OperationError),

    /// Configuration errors.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),
}

impl ModbusError {
    /// Creates a connection error.
    #[inline]
    pub fn connection(error: ConnectionError) -> Self {
        Self::Connection(error)
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(error: ProtocolError) -> Self {
        Self::Protocol(error)
    }

    /// Creates an operation error.
    #[inline]
    pub fn operation(error: OperationError) -> Self {
        Self::Operation(error)
    }

    /// Creates a configuration error.
    #[inline]
    pub fn configuration(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }

    /// Creates a not connected error.
    pub fn not_connected() -> Self {
        Self::Connection(ConnectionError::NotConnected)
    }

    /// Creates an exception response error.
    pub fn exception(function_code: u8, exception_code: u8) -> Self {
        Self::Protocol(ProtocolError::exception_response(function_code, exception_code))
    }

    /// Returns `true` if a caller may reasonably retry the operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(e) => e.is_retryable(),
            Self::Protocol(e) => e.is_retryable(),
            Self::Operation(e) => e.is_retryable(),
            Self::Configuration(_) => false,
        }
    }

    /// Returns the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Connection(e) => e.severity(),
            Self::Protocol(e) => e.severity(),
            Self::Operation(_) => ErrorSeverity::Error,
            Self::Configuration(_) => ErrorSeverity::Critical,
        }
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Protocol(_) => "protocol",
            Self::Operation(_) => "operation",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Logs this error with appropriate level and context.
    pub fn log(&self, context: &str) {
        match self.severity().to_tracing_level() {
            Level::ERROR => tracing::error!(
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            _ => tracing::debug!(
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
        }
    }
}

// =============================================================================
// ConnectionError
// =============================================================================

/// Serial link errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Serial port not found.
    #[error("Serial port not found: {port}")]
    SerialPortNotFound {
        /// Port path.
        port: String,
    },

    /// Serial port access denied.
    #[error("Serial port access denied: {port}")]
    SerialPortAccessDenied {
        /// Port path.
        port: String,
    },

    /// Serial port configuration error.
    #[error("Serial port configuration failed for '{port}': {message}")]
    SerialConfigurationFailed {
        /// Port path.
        port: String,
        /// Error message.
        message: String,
    },

    /// Link closed unexpectedly.
    #[error("Connection closed unexpectedly{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Closed {
        /// Reason for closure.
        reason: Option<String>,
    },

    /// Not connected.
    #[error("Not connected to Modbus device")]
    NotConnected,

    /// Generic I/O error.
    #[error("I/O error: {message}")]
    Io {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl ConnectionError {
    /// Creates a serial port not found error.
    pub fn serial_not_found(port: impl Into<String>) -> Self {
        Self::SerialPortNotFound { port: port.into() }
    }

    /// Creates a serial port access denied error.
    pub fn serial_access_denied(port: impl Into<String>) -> Self {
        Self::SerialPortAccessDenied { port: port.into() }
    }

    /// Creates a connection closed error.
    pub fn closed(reason: Option<String>) -> Self {
        Self::Closed { reason }
    }

    /// Creates an I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Closed { .. } | Self::NotConnected => true,
            Self::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
            ),
            Self::SerialPortNotFound { .. }
            | Self::SerialPortAccessDenied { .. }
            | Self::SerialConfigurationFailed { .. } => false,
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotConnected | Self::Closed { .. } => ErrorSeverity::Warning,
            Self::SerialPortAccessDenied { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }
}

// =============================================================================
// ProtocolError
// =============================================================================

/// Modbus protocol-level errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Modbus exception response received.
    #[error("Modbus exception: function code {function_code:#04x}, exception {exception_code} ({exception_name})")]
    ExceptionResponse {
        /// The function code that caused the exception.
        function_code: u8,
        /// The exception code.
        exception_code: u8,
        /// Human-readable exception name.
        exception_name: &'static str,
    },

    /// The response frame did not match the request.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// Error message.
        message: String,
    },
}

impl ProtocolError {
    /// Creates an exception response error.
    pub fn exception_response(function_code: u8, exception_code: u8) -> Self {
        Self::ExceptionResponse {
            function_code,
            exception_code,
            exception_name: Self::exception_name(exception_code),
        }
    }

    /// Creates an unexpected response error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }

    /// Returns the human-readable name for an exception code.
    pub fn exception_name(code: u8) -> &'static str {
        match code {
            0x01 => "Illegal Function",
            0x02 => "Illegal Data Address",
            0x03 => "Illegal Data Value",
            0x04 => "Slave Device Failure",
            0x05 => "Acknowledge",
            0x06 => "Slave Device Busy",
            0x08 => "Memory Parity Error",
            0x0A => "Gateway Path Unavailable",
            0x0B => "Gateway Target Device Failed to Respond",
            _ => "Unknown Exception",
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ExceptionResponse { exception_code, .. } => {
                matches!(exception_code, 0x05 | 0x06 | 0x0B)
            }
            Self::UnexpectedResponse { .. } => true,
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ExceptionResponse { exception_code, .. } => match exception_code {
                0x05 | 0x06 => ErrorSeverity::Warning,
                0x01..=0x03 => ErrorSeverity::Error,
                _ => ErrorSeverity::Critical,
            },
            Self::UnexpectedResponse { .. } => ErrorSeverity::Warning,
        }
    }
}

// =============================================================================
// OperationError
// =============================================================================

/// Read/write operation errors.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Read operation failed.
    #[error("Read of {kind} at {address:#06x} (count {count}) failed: {message}")]
    ReadFailed {
        /// Table being read (`coils`, `holding registers`).
        kind: &'static str,
        /// Start address.
        address: u16,
        /// Number of items.
        count: u16,
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<io::Error>,
    },

    /// Write operation failed.
    #[error("Write of {kind} at {address:#06x} failed: {message}")]
    WriteFailed {
        /// Table being written.
        kind: &'static str,
        /// Start address.
        address: u16,
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<io::Error>,
    },
}

impl OperationError {
    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ReadFailed { .. } | Self::WriteFailed { .. })
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Invalid serial settings.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A required field is missing.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Field name.
        field: String,
    },

    /// Unsupported baud rate.
    #[error("Unsupported baud rate: {baud_rate}")]
    InvalidBaudRate {
        /// The rejected baud rate.
        baud_rate: u32,
    },

    /// Unit id outside the addressable range.
    #[error("Invalid unit ID: {unit_id} (valid range: 1-247)")]
    InvalidUnitId {
        /// The rejected unit id.
        unit_id: u8,
    },
}

impl ConfigurationError {
    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid unit id error.
    pub fn invalid_unit_id(unit_id: u8) -> Self {
        Self::InvalidUnitId { unit_id }
    }
}

// =============================================================================
// ErrorSeverity
// =============================================================================

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Warning - action may be required.
    Warning,
    /// Error - action required, but recoverable.
    Error,
    /// Critical - operator intervention required.
    Critical,
}

impl ErrorSeverity {
    /// Converts to a tracing level.
    pub fn to_tracing_level(self) -> Level {
        match self {
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }

    /// Returns the severity as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// A Result type with ModbusError.
pub type ModbusResult<T> = Result<T, ModbusError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_retryable() {
        assert!(ConnectionError::NotConnected.is_retryable());
        assert!(ConnectionError::closed(None).is_retryable());
        assert!(!ConnectionError::serial_access_denied("/dev/ttyUSB0").is_retryable());
        assert!(!ConnectionError::serial_not_found("/dev/ttyUSB0").is_retryable());
    }

    #[test]
    fn test_protocol_error_exception_names() {
        assert_eq!(ProtocolError::exception_name(0x01), "Illegal Function");
        assert_eq!(ProtocolError::exception_name(0x02), "Illegal Data Address");
        assert_eq!(ProtocolError::exception_name(0x06), "Slave Device Busy");
        assert_eq!(ProtocolError::exception_name(0x42), "Unknown Exception");
    }

    #[test]
    fn test_protocol_error_retryable() {
        let busy = ProtocolError::exception_response(0x03, 0x06);
        assert!(busy.is_retryable());

        let illegal = ProtocolError::exception_response(0x03, 0x01);
        assert!(!illegal.is_retryable());
    }

    #[test]
    fn test_error_severity() {
        assert_eq!(ConnectionError::NotConnected.severity(), ErrorSeverity::Warning);
        assert_eq!(
            ConnectionError::serial_access_denied("/dev/ttyUSB0").severity(),
            ErrorSeverity::Critical
        );
        assert_eq!(ErrorSeverity::Critical.to_tracing_level(), Level::ERROR);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(ModbusError::not_connected().category(), "connection");
        assert_eq!(ModbusError::exception(0x03, 0x02).category(), "protocol");
        assert_eq!(
            ModbusError::configuration(ConfigurationError::invalid_unit_id(0)).category(),
            "configuration"
        );
    }

    #[test]
    fn test_display_messages() {
        let closed = ConnectionError::closed(Some("transaction error".to_string()));
        assert_eq!(closed.to_string(), "Connection closed unexpectedly: transaction error");

        let read = OperationError::ReadFailed {
            kind: "holding registers",
            address: 0x1004,
            count: 2,
            message: "short frame".to_string(),
            source: None,
        };
        assert!(read.to_string().contains("0x1004"));
        assert!(read.is_retryable());

        let unit = ConfigurationError::invalid_unit_id(0);
        assert!(unit.to_string().contains("1-247"));
    }
}

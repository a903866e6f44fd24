// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus RTU transport for the controller's serial line.
//!
//! Built on `tokio-modbus` and `tokio-serial`. The transport itself applies
//! no deadline to a request: the caller races each exchange against its own
//! timer and, when the timer wins, calls
//! [`connection_lost`](ModbusTransport::connection_lost) followed by
//! [`connection_made`](ModbusTransport::connection_made). That pair throws
//! away the RTU decoder together with any half-read frame and reopens the
//! port.
//!
//! # Example
//!
//! ```rust,ignore
//! use pidctl_modbus::client::{ModbusRtuTransport, ModbusTransport};
//! use pidctl_modbus::types::ModbusRtuConfig;
//!
//! let config = ModbusRtuConfig::builder()
//!     .port("/dev/ttyUSB0")
//!     .unit_id(5)
//!     .build()?;
//!
//! let mut transport = ModbusRtuTransport::new(config);
//! transport.connect().await?;
//!
//! let words = transport.read_holding_registers(0x0000, 2).await?;
//! ```

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_modbus::client::Context as ModbusContext;
use tokio_modbus::prelude::*;
use tokio_modbus::{Error as TokioModbusError, ExceptionCode};
use tokio_serial::{
    DataBits as SerialDataBits, Parity as SerialParity, SerialPortBuilderExt,
    StopBits as SerialStopBits,
};

use crate::error::{ConnectionError, ModbusError, ModbusResult, OperationError, ProtocolError};
use crate::types::{DataBits, ModbusRtuConfig, Parity, StopBits};

use super::transport::{ModbusTransport, TransportState};

const FC_READ_COILS: u8 = 0x01;
const FC_READ_HOLDING_REGISTERS: u8 = 0x03;
const FC_WRITE_SINGLE_COIL: u8 = 0x05;
const FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

// =============================================================================
// ModbusRtuTransport
// =============================================================================

/// Modbus RTU transport using tokio-modbus over a serial port.
///
/// The context lives behind an async mutex so the read/write methods can
/// take `&self`. Dropping a request future mid-flight releases the mutex
/// and leaves the context in an unknown framing state; recover with
/// `connection_lost` + `connection_made` before the next request.
pub struct ModbusRtuTransport {
    config: ModbusRtuConfig,
    inner: Arc<Mutex<RtuTransportInner>>,
    state: TransportState,
}

#[derive(Default)]
struct RtuTransportInner {
    context: Option<ModbusContext>,
}

impl RtuTransportInner {
    fn context(&mut self) -> ModbusResult<&mut ModbusContext> {
        self.context
            .as_mut()
            .ok_or_else(|| ModbusError::connection(ConnectionError::NotConnected))
    }
}

impl ModbusRtuTransport {
    /// Creates a new RTU transport with the given configuration.
    pub fn new(config: ModbusRtuConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Mutex::new(RtuTransportInner::default())),
            state: TransportState::Disconnected,
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &ModbusRtuConfig {
        &self.config
    }

    fn convert_data_bits(bits: DataBits) -> SerialDataBits {
        match bits {
            DataBits::Seven => SerialDataBits::Seven,
            DataBits::Eight => SerialDataBits::Eight,
        }
    }

    fn convert_parity(parity: Parity) -> SerialParity {
        match parity {
            Parity::None => SerialParity::None,
            Parity::Odd => SerialParity::Odd,
            Parity::Even => SerialParity::Even,
        }
    }

    fn convert_stop_bits(bits: StopBits) -> SerialStopBits {
        match bits {
            StopBits::One => SerialStopBits::One,
            StopBits::Two => SerialStopBits::Two,
        }
    }

    fn map_open_error(&self, error: tokio_serial::Error) -> ModbusError {
        let port = self.config.port.clone();
        let error = match error.kind {
            tokio_serial::ErrorKind::NoDevice => ConnectionError::serial_not_found(port),
            tokio_serial::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
                ConnectionError::serial_access_denied(port)
            }
            tokio_serial::ErrorKind::Io(io::ErrorKind::NotFound) => {
                ConnectionError::serial_not_found(port)
            }
            _ => ConnectionError::SerialConfigurationFailed {
                port,
                message: error.to_string(),
            },
        };
        ModbusError::connection(error)
    }

    /// Flattens the nested tokio-modbus result into a [`ModbusResult`].
    fn map_response<T>(
        &self,
        response: Result<Result<T, ExceptionCode>, TokioModbusError>,
        function_code: u8,
        address: u16,
        count: u16,
    ) -> ModbusResult<T> {
        match response {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(exception)) => Err(ModbusError::exception(
                function_code,
                Self::exception_code_to_u8(&exception),
            )),
            Err(TokioModbusError::Transport(io_error)) => {
                Err(self.map_io_error(io_error, function_code, address, count))
            }
            Err(TokioModbusError::Protocol(protocol_error)) => Err(ModbusError::protocol(
                ProtocolError::unexpected(format!("{protocol_error:?}")),
            )),
        }
    }

    fn map_io_error(
        &self,
        io_error: io::Error,
        function_code: u8,
        address: u16,
        count: u16,
    ) -> ModbusError {
        match io_error.kind() {
            io::ErrorKind::NotFound => {
                ModbusError::connection(ConnectionError::serial_not_found(&self.config.port))
            }
            io::ErrorKind::PermissionDenied => {
                ModbusError::connection(ConnectionError::serial_access_denied(&self.config.port))
            }
            io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => ModbusError::connection(
                ConnectionError::closed(Some("Serial connection lost".to_string())),
            ),
            io::ErrorKind::TimedOut => {
                ModbusError::connection(ConnectionError::io("Serial line timed out", io_error))
            }
            _ => {
                let message = io_error.to_string();
                let error = match function_code {
                    FC_READ_COILS => OperationError::ReadFailed {
                        kind: "coils",
                        address,
                        count,
                        message,
                        source: Some(io_error),
                    },
                    FC_READ_HOLDING_REGISTERS => OperationError::ReadFailed {
                        kind: "holding registers",
                        address,
                        count,
                        message,
                        source: Some(io_error),
                    },
                    FC_WRITE_SINGLE_COIL => OperationError::WriteFailed {
                        kind: "coil",
                        address,
                        message,
                        source: Some(io_error),
                    },
                    _ => OperationError::WriteFailed {
                        kind: "holding registers",
                        address,
                        message,
                        source: Some(io_error),
                    },
                };
                ModbusError::operation(error)
            }
        }
    }

    fn exception_code_to_u8(code: &ExceptionCode) -> u8 {
        match code {
            ExceptionCode::IllegalFunction => 0x01,
            ExceptionCode::IllegalDataAddress => 0x02,
            ExceptionCode::IllegalDataValue => 0x03,
            ExceptionCode::ServerDeviceFailure => 0x04,
            ExceptionCode::Acknowledge => 0x05,
            ExceptionCode::ServerDeviceBusy => 0x06,
            ExceptionCode::MemoryParityError => 0x08,
            ExceptionCode::GatewayPathUnavailable => 0x0A,
            ExceptionCode::GatewayTargetDevice => 0x0B,
            _ => 0xFF,
        }
    }
}

#[async_trait]
impl ModbusTransport for ModbusRtuTransport {
    async fn connect(&mut self) -> ModbusResult<()> {
        if self.state == TransportState::Connected {
            return Ok(());
        }

        if self.state != TransportState::Recovering {
            self.state = TransportState::Connecting;
        }

        let builder = tokio_serial::new(&self.config.port, self.config.baud_rate)
            .data_bits(Self::convert_data_bits(self.config.data_bits))
            .parity(Self::convert_parity(self.config.parity))
            .stop_bits(Self::convert_stop_bits(self.config.stop_bits));

        let serial = match builder.open_native_async() {
            Ok(serial) => serial,
            Err(e) => {
                self.state = TransportState::Error;
                return Err(self.map_open_error(e));
            }
        };

        let ctx = rtu::attach_slave(serial, Slave(self.config.unit_id));

        self.inner.lock().await.context = Some(ctx);

        self.state = TransportState::Connected;

        tracing::info!(
            port = %self.config.port,
            line = %self.config.line_settings(),
            unit_id = self.config.unit_id,
            "Connected to controller"
        );

        Ok(())
    }

    async fn disconnect(&mut self) -> ModbusResult<()> {
        let mut inner = self.inner.lock().await;

        if let Some(mut ctx) = inner.context.take() {
            if let Err(e) = ctx.disconnect().await {
                tracing::warn!(error = %e, "Error closing serial link");
            }
        }

        drop(inner);
        self.state = TransportState::Disconnected;

        tracing::debug!(port = %self.config.port, "Disconnected from controller");
        Ok(())
    }

    async fn connection_lost(&mut self, reason: &str) -> ModbusResult<()> {
        // The context may still hold a partial frame; drop it without a
        // graceful shutdown so nothing from the abandoned exchange survives.
        let dropped = self.inner.lock().await.context.take().is_some();
        self.state = TransportState::Recovering;

        tracing::warn!(
            port = %self.config.port,
            reason,
            had_context = dropped,
            "Serial link reset"
        );
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state == TransportState::Connected
    }

    fn state(&self) -> TransportState {
        self.state
    }

    async fn read_coils(&self, address: u16, count: u16) -> ModbusResult<Vec<bool>> {
        let mut inner = self.inner.lock().await;
        let response = inner.context()?.read_coils(address, count).await;
        self.map_response(response, FC_READ_COILS, address, count)
    }

    async fn read_holding_registers(&self, address: u16, count: u16) -> ModbusResult<Vec<u16>> {
        let mut inner = self.inner.lock().await;
        let response = inner.context()?.read_holding_registers(address, count).await;
        self.map_response(response, FC_READ_HOLDING_REGISTERS, address, count)
    }

    async fn write_single_coil(&self, address: u16, value: bool) -> ModbusResult<()> {
        let mut inner = self.inner.lock().await;
        let response = inner.context()?.write_single_coil(address, value).await;
        self.map_response(response, FC_WRITE_SINGLE_COIL, address, 1)
    }

    async fn write_multiple_registers(&self, address: u16, values: &[u16]) -> ModbusResult<()> {
        let mut inner = self.inner.lock().await;
        let count = values.len() as u16;
        let response = inner
            .context()?
            .write_multiple_registers(address, values)
            .await;
        self.map_response(response, FC_WRITE_MULTIPLE_REGISTERS, address, count)
    }

    fn unit_id(&self) -> u8 {
        self.config.unit_id
    }

    fn display_name(&self) -> String {
        format!(
            "Modbus RTU {} @{}bps (unit {})",
            self.config.port, self.config.baud_rate, self.config.unit_id
        )
    }
}

impl std::fmt::Debug for ModbusRtuTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModbusRtuTransport")
            .field("port", &self.config.port)
            .field("line", &self.config.line_settings())
            .field("unit_id", &self.config.unit_id)
            .field("state", &self.state)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

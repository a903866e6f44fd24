// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Serial link configuration.
//!
//! The controller speaks Modbus RTU over a single serial line. Defaults match
//! the factory settings of the device: 9600 baud, 8 data bits, no parity,
//! one stop bit, unit 5.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ModbusError};

/// Baud rates accepted by [`ModbusRtuConfig::validate`].
pub const VALID_BAUD_RATES: &[u32] = &[
    1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200,
];

// =============================================================================
// ModbusRtuConfig
// =============================================================================

/// Configuration for the Modbus RTU link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModbusRtuConfig {
    /// Serial port path (e.g., "/dev/ttyUSB0" or "COM1").
    pub port: String,

    /// Baud rate.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Data bits.
    #[serde(default)]
    pub data_bits: DataBits,

    /// Parity.
    #[serde(default)]
    pub parity: Parity,

    /// Stop bits.
    #[serde(default)]
    pub stop_bits: StopBits,

    /// Unit ID / slave address of the controller.
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,

    /// Inter-frame delay override. Computed from the line settings when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(with = "humantime_serde")]
    pub inter_frame_delay: Option<Duration>,
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_unit_id() -> u8 {
    5
}

impl ModbusRtuConfig {
    /// Creates a new builder for ModbusRtuConfig.
    pub fn builder() -> ModbusRtuConfigBuilder {
        ModbusRtuConfigBuilder::default()
    }

    /// Creates a configuration with factory line settings on `port`.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Default::default()
        }
    }

    /// Returns the delay the line needs between two frames.
    ///
    /// Modbus RTU requires 3.5 character times of silence. At 9600 8N1 one
    /// character is 10 bits, which gives roughly 3.6ms.
    pub fn calculated_inter_frame_delay(&self) -> Duration {
        if let Some(delay) = self.inter_frame_delay {
            return delay;
        }

        let bits_per_char =
            1 + self.data_bits.bits() + self.parity.bits() + self.stop_bits.bits();
        let delay_us = (3.5 * f64::from(bits_per_char) / f64::from(self.baud_rate)
            * 1_000_000.0) as u64;

        // Never below 1ms, the OS timer cannot do better anyway.
        Duration::from_micros(delay_us.max(1000))
    }

    /// Returns the short line notation, e.g. `9600 8N1`.
    pub fn line_settings(&self) -> String {
        format!(
            "{} {}{}{}",
            self.baud_rate, self.data_bits, self.parity, self.stop_bits
        )
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), ModbusError> {
        if self.port.is_empty() {
            return Err(ModbusError::configuration(ConfigurationError::missing_field(
                "port",
            )));
        }

        if !VALID_BAUD_RATES.contains(&self.baud_rate) {
            return Err(ModbusError::configuration(
                ConfigurationError::InvalidBaudRate {
                    baud_rate: self.baud_rate,
                },
            ));
        }

        if self.unit_id == 0 || self.unit_id > 247 {
            return Err(ModbusError::configuration(
                ConfigurationError::invalid_unit_id(self.unit_id),
            ));
        }

        Ok(())
    }
}

impl Default for ModbusRtuConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: default_baud_rate(),
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            unit_id: default_unit_id(),
            inter_frame_delay: None,
        }
    }
}

impl fmt::Display for ModbusRtuConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} unit {}",
            self.port,
            self.line_settings(),
            self.unit_id
        )
    }
}

// =============================================================================
// ModbusRtuConfigBuilder
// =============================================================================

/// Builder for ModbusRtuConfig.
#[derive(Debug, Default)]
pub struct ModbusRtuConfigBuilder {
    port: Option<String>,
    baud_rate: Option<u32>,
    data_bits: Option<DataBits>,
    parity: Option<Parity>,
    stop_bits: Option<StopBits>,
    unit_id: Option<u8>,
    inter_frame_delay: Option<Duration>,
}

impl ModbusRtuConfigBuilder {
    /// Sets the serial port.
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Sets the baud rate.
    pub fn baud_rate(mut self, rate: u32) -> Self {
        self.baud_rate = Some(rate);
        self
    }

    /// Sets the data bits.
    pub fn data_bits(mut self, bits: DataBits) -> Self {
        self.data_bits = Some(bits);
        self
    }

    /// Sets the parity.
    pub fn parity(mut self, parity: Parity) -> Self {
        self.parity = Some(parity);
        self
    }

    /// Sets the stop bits.
    pub fn stop_bits(mut self, bits: StopBits) -> Self {
        self.stop_bits = Some(bits);
        self
    }

    /// Sets the unit ID.
    pub fn unit_id(mut self, id: u8) -> Self {
        self.unit_id = Some(id);
        self
    }

    /// Sets the inter-frame delay.
    pub fn inter_frame_delay(mut self, delay: Duration) -> Self {
        self.inter_frame_delay = Some(delay);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Result<ModbusRtuConfig, ModbusError> {
        let port = self.port.ok_or_else(|| {
            ModbusError::configuration(ConfigurationError::missing_field("port"))
        })?;

        let config = ModbusRtuConfig {
            port,
            baud_rate: self.baud_rate.unwrap_or_else(default_baud_rate),
            data_bits: self.data_bits.unwrap_or_default(),
            parity: self.parity.unwrap_or_default(),
            stop_bits: self.stop_bits.unwrap_or_default(),
            unit_id: self.unit_id.unwrap_or_else(default_unit_id),
            inter_frame_delay: self.inter_frame_delay,
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Serial Port Settings
// =============================================================================

/// Data bits configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataBits {
    /// 7 data bits.
    Seven,
    /// 8 data bits (default).
    #[default]
    Eight,
}

impl DataBits {
    /// Returns the number of bits.
    pub const fn bits(&self) -> u8 {
        match self {
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }
}

impl fmt::Display for DataBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Parity configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    /// No parity (default).
    #[default]
    None,
    /// Odd parity.
    Odd,
    /// Even parity.
    Even,
}

impl Parity {
    /// Returns the number of parity bits.
    pub const fn bits(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Odd | Self::Even => 1,
        }
    }

    /// Returns the short character representation.
    pub const fn char(&self) -> char {
        match self {
            Self::None => 'N',
            Self::Odd => 'O',
            Self::Even => 'E',
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

/// Stop bits configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    /// 1 stop bit (default).
    #[default]
    One,
    /// 2 stop bits.
    Two,
}

impl StopBits {
    /// Returns the number of stop bits.
    pub const fn bits(&self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

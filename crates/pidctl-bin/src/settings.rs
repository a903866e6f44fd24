// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Layered configuration loading.
//!
//! # Loading Pipeline
//!
//! 1. Built-in defaults (9600 8N1, unit 5, 500ms deadlines)
//! 2. Configuration file, YAML/TOML/JSON by extension, skipped when missing
//! 3. `PIDCTL__*` environment variables
//! 4. CLI overrides (`--port`, `--unit`, `--log-level`, `--log-format`)
//!
//! # Environment Variable Override
//!
//! ```text
//! PIDCTL__SERIAL__PORT=/dev/ttyUSB1
//! PIDCTL__SERIAL__UNIT_ID=7
//! PIDCTL__ENGINE__REGISTER_DEADLINE=750ms
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use pidctl_core::EngineConfig;
use pidctl_modbus::ModbusRtuConfig;

use crate::cli::{Cli, LogFormat};
use crate::error::{BinError, BinResult};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PIDCTL";

/// Serial port used when nothing else is configured.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

// =============================================================================
// Settings
// =============================================================================

/// Complete runtime configuration.
///
/// # Example (YAML)
///
/// ```yaml
/// serial:
///   port: /dev/ttyUSB0
///   baud_rate: 9600
///   unit_id: 5
/// engine:
///   register_deadline: 500ms
///   settle_delay: 4ms
/// logging:
///   level: info
///   format: text
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Serial link.
    pub serial: ModbusRtuConfig,
    /// Engine deadlines and delays.
    pub engine: EngineConfig,
    /// Log output.
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            serial: ModbusRtuConfig::new(DEFAULT_PORT),
            engine: EngineConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level (trace, debug, info, warn, error).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl Settings {
    /// Loads settings from `path` and the process environment.
    pub fn load(path: &Path) -> BinResult<Self> {
        Self::load_with_env(path, None)
    }

    /// Loads settings from `path`, taking environment variables from `env`
    /// instead of the process environment when given.
    pub fn load_with_env(path: &Path, env: Option<HashMap<String, String>>) -> BinResult<Self> {
        if path.exists() {
            debug!(path = %path.display(), "Loading configuration file");
        } else {
            debug!(path = %path.display(), "Configuration file not found, using defaults");
        }

        let defaults = config::Config::try_from(&Settings::default())?;
        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(env);

        let settings: Settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Applies CLI overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(port) = &cli.port {
            self.serial.port = port.clone();
        }
        if let Some(unit) = cli.unit {
            self.serial.unit_id = unit;
        }
        if let Some(format) = cli.log_format {
            self.logging.format = format;
        }
    }

    /// Validates every section.
    pub fn validate(&self) -> BinResult<()> {
        self.serial
            .validate()
            .map_err(|e| BinError::config(e.to_string()).with_context("serial"))?;
        self.engine
            .validate()
            .map_err(|e| BinError::config(e.to_string()).with_context("engine"))?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings =
            Settings::load_with_env(Path::new("/nonexistent/pidctl.yaml"), no_env()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.serial.unit_id, 5);
        assert_eq!(settings.serial.baud_rate, 9600);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_yaml() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(
            b"serial:\n  port: /dev/ttyS3\n  unit_id: 9\nengine:\n  register_deadline: 750ms\nlogging:\n  level: debug\n",
        )
        .unwrap();

        let settings = Settings::load_with_env(file.path(), no_env()).unwrap();
        assert_eq!(settings.serial.port, "/dev/ttyS3");
        assert_eq!(settings.serial.unit_id, 9);
        assert_eq!(settings.serial.baud_rate, 9600);
        assert_eq!(settings.engine.register_deadline, Duration::from_millis(750));
        assert_eq!(settings.engine.settle_delay, Duration::from_millis(4));
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_load_toml() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(b"[serial]\nport = \"COM3\"\nbaud_rate = 4800\n").unwrap();

        let settings = Settings::load_with_env(file.path(), no_env()).unwrap();
        assert_eq!(settings.serial.port, "COM3");
        assert_eq!(settings.serial.baud_rate, 4800);
    }

    #[test]
    fn test_environment_override() {
        let env = HashMap::from([
            ("PIDCTL__SERIAL__PORT".to_string(), "/dev/ttyACM0".to_string()),
            ("PIDCTL__SERIAL__UNIT_ID".to_string(), "12".to_string()),
        ]);
        let settings = Settings::load_with_env(Path::new("missing.yaml"), Some(env)).unwrap();
        assert_eq!(settings.serial.port, "/dev/ttyACM0");
        assert_eq!(settings.serial.unit_id, 12);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["pidctl", "--port", "/dev/ttyS0", "--unit", "3", "flags"]);
        let mut settings = Settings::default();
        settings.apply_cli(&cli);
        assert_eq!(settings.serial.port, "/dev/ttyS0");
        assert_eq!(settings.serial.unit_id, 3);
    }

    #[test]
    fn test_validation_rejects_bad_unit() {
        let mut settings = Settings::default();
        settings.serial.unit_id = 0;
        let err = settings.validate().unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}

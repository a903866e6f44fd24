// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Command output rendering.
//!
//! Every command result is a [`Render`] value. Text output is aligned for
//! people; JSON output is one document per result, one line per streamed
//! event.

use std::io::Write;
use std::time::Duration;

use serde::Serialize;

use pidctl_core::value::FLAG_DESCRIPTIONS;
use pidctl_core::{
    AutoTuneReport, AutoTuneSample, ChangeEvent, EngineEvent, FlagSet, GroupMember, Reading,
    RegisterDescriptor, RegisterGroup,
};

use crate::cli::OutputFormat;
use crate::error::BinResult;

// =============================================================================
// Printer
// =============================================================================

/// A result that can be printed as text or JSON.
pub trait Render: Serialize {
    /// Writes the human-readable form.
    fn render_text(&self, out: &mut dyn Write) -> std::io::Result<()>;
}

/// Writes command results in the selected format.
pub struct Printer<W: Write> {
    format: OutputFormat,
    out: W,
}

impl Printer<std::io::Stdout> {
    /// Creates a printer on stdout.
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, std::io::stdout())
    }
}

impl<W: Write> Printer<W> {
    /// Creates a printer writing to `out`.
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    /// Returns the output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Prints one result and flushes.
    pub fn emit<R: Render + ?Sized>(&mut self, result: &R) -> BinResult<()> {
        match self.format {
            OutputFormat::Text => result.render_text(&mut self.out)?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, result)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    /// Consumes the printer, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

// =============================================================================
// Results
// =============================================================================

/// One catalog row.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogRow<'a> {
    /// Register symbol.
    pub symbol: &'a str,
    /// Holding register address.
    pub address: String,
    /// Domain summary.
    pub domain: String,
    /// Factory setting.
    pub default: Option<String>,
    /// Whether the register accepts writes.
    pub writable: bool,
    /// Description.
    pub description: &'a str,
}

impl<'a> From<&'a RegisterDescriptor> for CatalogRow<'a> {
    fn from(d: &'a RegisterDescriptor) -> Self {
        Self {
            symbol: &d.symbol,
            address: format!("0x{:04x}", d.address),
            domain: d.domain.to_string(),
            default: d.default_value.map(|v| v.to_string()),
            writable: d.is_writable(),
            description: &d.description,
        }
    }
}

/// The `list` result.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogListing<'a> {
    /// Rows in catalog order.
    pub registers: Vec<CatalogRow<'a>>,
}

impl Render for CatalogListing<'_> {
    fn render_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        for row in &self.registers {
            writeln!(
                out,
                "{:<8} {} {:<3} {:<10} {}  [{}]",
                row.symbol,
                row.address,
                if row.writable { "rw" } else { "ro" },
                row.default.as_deref().unwrap_or("-"),
                row.description,
                row.domain,
            )?;
        }
        writeln!(out, "{} registers", self.registers.len())
    }
}

/// A single register value.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterValue {
    /// Register symbol or raw address.
    pub register: String,
    /// Value formatted with the live scale.
    pub display: String,
    /// The decoded reading.
    #[serde(flatten)]
    pub reading: Reading,
}

impl RegisterValue {
    /// Creates a result for `register`.
    pub fn new(register: impl Into<String>, reading: Reading) -> Self {
        Self {
            register: register.into(),
            display: reading.display(),
            reading,
        }
    }
}

impl Render for RegisterValue {
    fn render_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "{:<8} {}", self.register, self.display)
    }
}

/// The `flags` result.
#[derive(Debug, Clone, Serialize)]
pub struct FlagReport {
    /// Coil states by name.
    pub flags: FlagSet,
}

impl Render for FlagReport {
    fn render_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        for ((name, on), description) in self.flags.iter().zip(FLAG_DESCRIPTIONS) {
            writeln!(
                out,
                "{:<8} {:<3}  {}",
                name,
                if on { "on" } else { "off" },
                description
            )?;
        }
        Ok(())
    }
}

/// Values read as one batch (`dump`, `pid`).
#[derive(Debug, Clone, Serialize)]
pub struct ValueTable {
    /// What was read.
    pub title: String,
    /// Values in read order.
    pub values: Vec<RegisterValue>,
}

impl ValueTable {
    /// Builds a table from a group refresh.
    pub fn from_group(group: RegisterGroup, readings: Vec<(GroupMember, Reading)>) -> Self {
        Self {
            title: group.to_string(),
            values: readings
                .into_iter()
                .map(|(member, reading)| RegisterValue::new(member.to_string(), reading))
                .collect(),
        }
    }

    /// Builds a table from symbol/reading pairs.
    pub fn from_pairs(title: impl Into<String>, readings: Vec<(String, Reading)>) -> Self {
        Self {
            title: title.into(),
            values: readings
                .into_iter()
                .map(|(symbol, reading)| RegisterValue::new(symbol, reading))
                .collect(),
        }
    }
}

impl Render for ValueTable {
    fn render_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "# {}", self.title)?;
        for value in &self.values {
            value.render_text(out)?;
        }
        Ok(())
    }
}

/// Acknowledgement of a command without a value.
#[derive(Debug, Clone, Serialize)]
pub struct Ack {
    /// What was done.
    pub message: String,
}

impl Ack {
    /// Creates an acknowledgement.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Render for Ack {
    fn render_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "{}", self.message)
    }
}

impl Render for EngineEvent {
    fn render_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        match self {
            EngineEvent::Changed(change) => change.render_text(out),
            EngineEvent::OperationsStarted => writeln!(out, "-- busy"),
            EngineEvent::OperationsIdle => writeln!(out, "-- idle"),
        }
    }
}

impl Render for ChangeEvent {
    fn render_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        let reading = Reading::new(self.value.clone(), self.scale);
        writeln!(
            out,
            "{} {:<8} {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.key.to_string(),
            reading.display()
        )
    }
}

impl Render for AutoTuneSample {
    fn render_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        fn cell(v: Option<f64>) -> String {
            v.map_or_else(|| "-".to_string(), |n| format!("{n:.1}"))
        }
        writeln!(
            out,
            "{:>8}  PV {:>7}  dSV {:>7}  OUT {:>6}",
            humantime::format_duration(Duration::from_secs(self.elapsed.as_secs()))
                .to_string(),
            cell(self.pv),
            cell(self.dsv),
            cell(self.out),
        )
    }
}

impl Render for AutoTuneReport {
    fn render_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            out,
            "Auto-tune stopped after {} ({} samples)",
            humantime::format_duration(Duration::from_secs(self.duration.as_secs())),
            self.samples
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pidctl_core::Value;

    fn render<R: Render>(format: OutputFormat, result: &R) -> String {
        let mut printer = Printer::new(format, Vec::new());
        printer.emit(result).unwrap();
        String::from_utf8(printer.into_inner()).unwrap()
    }

    #[test]
    fn test_register_value_text() {
        let value = RegisterValue::new("P1", Reading::new(Value::Number(25.5), 0.1));
        assert_eq!(render(OutputFormat::Text, &value), "P1       25.5\n");
    }

    #[test]
    fn test_register_value_json() {
        let value = RegisterValue::new("SV", Reading::new(Value::Number(50.0), 1.0));
        let json: serde_json::Value =
            serde_json::from_str(&render(OutputFormat::Json, &value)).unwrap();
        assert_eq!(json["register"], "SV");
        assert_eq!(json["display"], "50");
        assert_eq!(json["value"]["kind"], "number");
        assert_eq!(json["scale"], 1.0);
    }

    #[test]
    fn test_flag_report_text() {
        let flags = FlagSet::from_bits(&[false, true, false, false, false, false, false, true]);
        let text = render(OutputFormat::Text, &FlagReport { flags });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[1].starts_with("A/M      on"));
        assert!(lines[7].contains("Auto-tune active"));
    }

    #[test]
    fn test_idle_event_json() {
        let text = render(OutputFormat::Json, &EngineEvent::OperationsIdle);
        assert_eq!(text, "{\"event\":\"operations_idle\"}\n");
    }
}

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Domain-typed register values.
//!
//! - [`Value`]: what a read decodes to
//! - [`RegisterInput`]: what a caller asks to write
//! - [`Reading`]: a decoded value together with the live scale
//! - [`RegisterRef`]: a catalog symbol or a raw address
//! - [`EventKey`]: the key under which a change is published

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

// =============================================================================
// FlagSet
// =============================================================================

/// Names of the eight status coils, in coil order.
pub const FLAG_NAMES: [&str; 8] = ["SV", "A/M", "R/D", "setting", "abnormal", "AL2", "AL1", "AT"];

/// Operator-facing meaning of each status coil.
pub const FLAG_DESCRIPTIONS: [&str; 8] = [
    "User modifying SV",
    "Manual Control",
    "Heat/cool",
    "User modifying settings",
    "Probe input error",
    "Alarm 2 active",
    "Alarm 1 active",
    "Auto-tune active",
];

/// The eight status coils read in one exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagSet {
    bits: [bool; 8],
}

impl FlagSet {
    /// Builds a flag set from the first eight coil bits. Missing bits read
    /// as `false`.
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut set = Self::default();
        for (slot, bit) in set.bits.iter_mut().zip(bits) {
            *slot = *bit;
        }
        set
    }

    /// Returns the flag called `name`.
    pub fn get(&self, name: &str) -> Option<bool> {
        FLAG_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.bits[i])
    }

    /// Iterates `(name, state)` in coil order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        FLAG_NAMES.iter().copied().zip(self.bits.iter().copied())
    }

    /// Returns the flags as an ordered name map.
    pub fn to_map(&self) -> BTreeMap<String, bool> {
        self.iter().map(|(n, b)| (n.to_string(), b)).collect()
    }
}

impl Serialize for FlagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FLAG_NAMES.len()))?;
        for (name, state) in self.iter() {
            map.serialize_entry(name, &state)?;
        }
        map.end()
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(name, on)| format!("{name}={}", if on { "on" } else { "off" }))
            .collect();
        f.write_str(&parts.join(" "))
    }
}

// =============================================================================
// Value
// =============================================================================

/// A decoded register value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Number inside a continuous range.
    Number(f64),
    /// Label of an enumeration or a scalar composite entry.
    Label(String),
    /// Composite label together with its number.
    LabelWithNumber(String, f64),
    /// The status coils.
    Flags(FlagSet),
    /// Program step and elapsed time of the running step.
    StepElapsed {
        /// Current step number.
        step: u16,
        /// Elapsed time within the step.
        elapsed: u16,
    },
    /// The raw value matched nothing in the register's domain.
    Unknown,
}

impl Value {
    /// Returns `true` for [`Value::Unknown`].
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns the numeric part, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) | Self::LabelWithNumber(_, n) => Some(*n),
            _ => None,
        }
    }

    /// Converts the value into a write input that reproduces it.
    ///
    /// Returns `None` for values that cannot be written back.
    pub fn to_input(&self) -> Option<RegisterInput> {
        match self {
            Self::Number(n) => Some(RegisterInput::Number(*n)),
            Self::Label(l) => Some(RegisterInput::Label(l.clone())),
            Self::LabelWithNumber(l, n) => Some(RegisterInput::LabelWithNumber(l.clone(), *n)),
            Self::Flags(_) | Self::StepElapsed { .. } | Self::Unknown => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Label(l) => f.write_str(l),
            Self::LabelWithNumber(l, n) => write!(f, "{l}:{n}"),
            Self::Flags(flags) => write!(f, "{flags}"),
            Self::StepElapsed { step, elapsed } => write!(f, "step {step}, {elapsed} elapsed"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

// =============================================================================
// Reading
// =============================================================================

/// A decoded value and the scale the device reported alongside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Decoded value.
    pub value: Value,
    /// Live scale, `10^-w1`.
    pub scale: f64,
}

impl Reading {
    /// Creates a reading.
    pub fn new(value: Value, scale: f64) -> Self {
        Self { value, scale }
    }

    /// Formats the value with as many decimals as the scale implies.
    pub fn display(&self) -> String {
        match &self.value {
            Value::Number(n) => format!("{n:.prec$}", prec = decimals(self.scale)),
            other => other.to_string(),
        }
    }
}

fn decimals(scale: f64) -> usize {
    if scale > 0.0 && scale < 1.0 {
        (-scale.log10()).round().clamp(0.0, 4.0) as usize
    } else {
        0
    }
}

// =============================================================================
// RegisterInput
// =============================================================================

/// A value to write.
///
/// Parsed from operator text: `25.5` is a number, `On` a label and
/// `Jump:-5` a label with a number.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterInput {
    /// Plain number.
    Number(f64),
    /// Label.
    Label(String),
    /// Label with a number (composite ranges).
    LabelWithNumber(String, f64),
}

impl RegisterInput {
    /// Parses operator text. Never fails; text that is neither a number nor
    /// `label:number` is taken as a label.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Ok(n) = text.parse::<f64>() {
            if n.is_finite() {
                return Self::Number(n);
            }
        }
        if let Some((label, number)) = text.rsplit_once(':') {
            if let Ok(n) = number.trim().parse::<f64>() {
                return Self::LabelWithNumber(label.trim().to_string(), n);
            }
        }
        Self::Label(text.to_string())
    }
}

impl FromStr for RegisterInput {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<f64> for RegisterInput {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RegisterInput {
    fn from(label: &str) -> Self {
        Self::Label(label.to_string())
    }
}

impl fmt::Display for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Label(l) => f.write_str(l),
            Self::LabelWithNumber(l, n) => write!(f, "{l}:{n}"),
        }
    }
}

// =============================================================================
// RegisterRef
// =============================================================================

/// A register named by catalog symbol or by raw address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegisterRef {
    /// Catalog symbol.
    Symbol(String),
    /// Raw holding register address, bypassing the catalog.
    Address(u16),
}

impl RegisterRef {
    /// Parses `0xNNNN` as an address and anything else as a symbol.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let hex = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"));
        match hex.map(|digits| u16::from_str_radix(digits, 16)) {
            Some(Ok(address)) => Self::Address(address),
            _ => Self::Symbol(text.to_string()),
        }
    }
}

impl FromStr for RegisterRef {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for RegisterRef {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<u16> for RegisterRef {
    fn from(address: u16) -> Self {
        Self::Address(address)
    }
}

impl fmt::Display for RegisterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(s) => f.write_str(s),
            Self::Address(a) => write!(f, "0x{a:04x}"),
        }
    }
}

// =============================================================================
// EventKey
// =============================================================================

/// Key of a published change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// Catalog register.
    Register(String),
    /// Raw address, rendered as `0x%04x`.
    Address(u16),
    /// The status coil set.
    Flags,
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(s) => f.write_str(s),
            Self::Address(a) => write!(f, "0x{a:04x}"),
            Self::Flags => f.write_str("flags"),
        }
    }
}

impl Serialize for EventKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_parse() {
        assert_eq!(RegisterInput::parse("25.5"), RegisterInput::Number(25.5));
        assert_eq!(RegisterInput::parse(" -5 "), RegisterInput::Number(-5.0));
        assert_eq!(RegisterInput::parse("On"), RegisterInput::Label("On".into()));
        assert_eq!(
            RegisterInput::parse("Jump:-5"),
            RegisterInput::LabelWithNumber("Jump".into(), -5.0)
        );
        assert_eq!(
            RegisterInput::parse("Duty cycle (s):10"),
            RegisterInput::LabelWithNumber("Duty cycle (s)".into(), 10.0)
        );
        assert_eq!(RegisterInput::parse("0-20mA"), RegisterInput::Label("0-20mA".into()));
        assert_eq!(RegisterInput::parse("inf"), RegisterInput::Label("inf".into()));
    }

    #[test]
    fn test_register_ref_parse() {
        assert_eq!(RegisterRef::parse("0x0164"), RegisterRef::Address(0x0164));
        assert_eq!(RegisterRef::parse("0X1F"), RegisterRef::Address(0x1F));
        assert_eq!(RegisterRef::parse("SV"), RegisterRef::Symbol("SV".into()));
        assert_eq!(RegisterRef::parse("0xZZ"), RegisterRef::Symbol("0xZZ".into()));
        assert_eq!(RegisterRef::Address(0x164).to_string(), "0x0164");
    }

    #[test]
    fn test_event_key_display() {
        assert_eq!(EventKey::Register("SV".into()).to_string(), "SV");
        assert_eq!(EventKey::Address(0x5000).to_string(), "0x5000");
        assert_eq!(EventKey::Flags.to_string(), "flags");
    }

    #[test]
    fn test_flag_set() {
        let flags = FlagSet::from_bits(&[false, true, false, false, false, false, true, false]);
        assert_eq!(flags.get("A/M"), Some(true));
        assert_eq!(flags.get("AL1"), Some(true));
        assert_eq!(flags.get("AT"), Some(false));
        assert_eq!(flags.get("nope"), None);
        assert_eq!(flags.to_map().len(), 8);
        assert!(flags.to_string().starts_with("SV=off A/M=on"));
    }

    #[test]
    fn test_value_to_input() {
        assert_eq!(Value::Number(2.5).to_input(), Some(RegisterInput::Number(2.5)));
        assert_eq!(
            Value::LabelWithNumber("Run".into(), 30.0).to_input(),
            Some(RegisterInput::LabelWithNumber("Run".into(), 30.0))
        );
        assert_eq!(Value::Unknown.to_input(), None);
    }

    #[test]
    fn test_reading_display() {
        assert_eq!(Reading::new(Value::Number(25.5), 0.1).display(), "25.5");
        assert_eq!(Reading::new(Value::Number(50.0), 1.0).display(), "50");
        assert_eq!(Reading::new(Value::Number(1.0), 0.01).display(), "1.00");
        assert_eq!(Reading::new(Value::Label("On".into()), 1.0).display(), "On");
    }

    #[test]
    fn test_value_serialize() {
        let json = serde_json::to_value(Value::LabelWithNumber("Jump".into(), -5.0)).unwrap();
        assert_eq!(json["kind"], "label_with_number");
        assert_eq!(json["value"][0], "Jump");

        let json = serde_json::to_value(Value::Flags(FlagSet::default())).unwrap();
        assert_eq!(json["value"]["AT"], false);
    }
}

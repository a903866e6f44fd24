// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Register catalog.
//!
//! An immutable table of [`RegisterDescriptor`]s keyed by symbol. The
//! built-in table is produced by [`Catalog::generate`]: the hand-authored
//! controller registers followed by the generated PID slot and program
//! step families.
//!
//! ```text
//! 0x0000..0x0003  control      SV AL1 AL2 At
//! 0x0164..0x0190  status       PV dSV OUT Pr+t
//! 0x1000..0x100F  work         AL1y .. FILt
//! 0x2000..0x2012  function     Inty .. bAud
//! 0x3000..0x301A  PID slots    P1 I1 d1 .. P9 I9 d9
//! 0x4000..0x40BF  program      C-01 t-01 Sv01 .. C-64 t-64 Sv64
//! ```

mod generated;
mod tables;

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::{CatalogError, EngineError, EngineResult};

pub use generated::{ordinal, PID_SLOTS, PROGRAM_STEPS};
pub use tables::{ALARM_MODES, INPUT_TYPES, OUTPUT_TYPES, RUN_MODES};

// =============================================================================
// Domains
// =============================================================================

/// Closed numeric interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    /// Lower bound (inclusive).
    pub min: f64,
    /// Upper bound (inclusive).
    pub max: f64,
}

impl Range {
    /// The range used for raw addresses with no catalog entry.
    pub const UNBOUNDED: Range = Range {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    /// Creates a new range.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns `true` if `value` lies inside the range.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// Target of one composite label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeEntry {
    /// The label carries a number from this range.
    Range(Range),
    /// The label stands for exactly this raw value.
    Scalar(i32),
}

/// Value domain of a register.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum Domain {
    /// Real value in a closed interval.
    Range(Range),
    /// Index into a label list; `None` marks a reserved code.
    Enum(&'static [Option<&'static str>]),
    /// Labels selecting a sub-range or an exact value, matched in order.
    Composite(&'static [(&'static str, CompositeEntry)]),
    /// Packed program step number and elapsed step time. Read-only.
    StepElapsed,
}

impl Domain {
    /// Returns `true` if values of this domain can be written.
    pub fn is_writable(&self) -> bool {
        !matches!(self, Self::StepElapsed)
    }

    /// Returns the labels this domain accepts, in declaration order.
    pub fn labels(&self) -> Vec<&'static str> {
        match self {
            Self::Enum(list) => list.iter().flatten().copied().collect(),
            Self::Composite(entries) => entries.iter().map(|(label, _)| *label).collect(),
            Self::Range(_) | Self::StepElapsed => Vec::new(),
        }
    }

    fn check(&self, symbol: &str) -> Result<(), CatalogError> {
        let empty = |r: &Range| r.min > r.max;
        let bad = match self {
            Self::Range(r) => empty(r),
            Self::Composite(entries) => entries.iter().any(|(_, entry)| match entry {
                CompositeEntry::Range(r) => empty(r),
                CompositeEntry::Scalar(_) => false,
            }),
            Self::Enum(_) | Self::StepElapsed => false,
        };
        if bad {
            return Err(CatalogError::EmptyRange(symbol.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range(r) => write!(f, "{r}"),
            Self::Enum(_) => write!(f, "one of [{}]", self.labels().join(", ")),
            Self::Composite(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(label, entry)| match entry {
                        CompositeEntry::Range(r) => format!("{label}:{r}"),
                        CompositeEntry::Scalar(_) => (*label).to_string(),
                    })
                    .collect();
                write!(f, "one of [{}]", parts.join(", "))
            }
            Self::StepElapsed => f.write_str("step/elapsed (read-only)"),
        }
    }
}

/// Factory setting of a register, as printed in the device manual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FactoryValue {
    /// Numeric setting.
    Number(f64),
    /// Label of an enumeration or composite map.
    Label(&'static str),
}

impl fmt::Display for FactoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Label(l) => f.write_str(l),
        }
    }
}

// =============================================================================
// RegisterDescriptor
// =============================================================================

/// Immutable metadata of one register.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterDescriptor {
    /// Unique symbol, as shown on the controller display.
    pub symbol: String,
    /// Human readable description.
    pub description: String,
    /// Holding register address.
    pub address: u16,
    /// Value domain.
    pub domain: Domain,
    /// Factory setting, if the manual gives one.
    pub default_value: Option<FactoryValue>,
    /// Scale the register usually reports. The live scale always comes
    /// from the device.
    pub nominal_scale: Option<f64>,
}

impl RegisterDescriptor {
    /// Creates a descriptor.
    pub fn new(
        symbol: impl Into<String>,
        description: impl Into<String>,
        address: u16,
        domain: Domain,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            description: description.into(),
            address,
            domain,
            default_value: None,
            nominal_scale: None,
        }
    }

    /// Sets the factory value.
    pub fn with_default(mut self, value: FactoryValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Sets the nominal scale.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.nominal_scale = Some(scale);
        self
    }

    /// Returns `true` if the register can be written.
    pub fn is_writable(&self) -> bool {
        self.domain.is_writable()
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Immutable register table.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<RegisterDescriptor>,
    by_symbol: HashMap<String, usize>,
    by_address: HashMap<u16, usize>,
}

impl Catalog {
    /// Builds the controller's built-in register table.
    ///
    /// # Panics
    ///
    /// Panics if the compiled-in table has duplicate symbols or addresses.
    /// That is a build defect, not a runtime condition.
    pub fn generate() -> Self {
        let descriptors = tables::fixed_registers()
            .into_iter()
            .chain(generated::pid_slot_registers())
            .chain(generated::program_step_registers());

        match Self::from_descriptors(descriptors) {
            Ok(catalog) => catalog,
            Err(e) => panic!("built-in register table is inconsistent: {e}"),
        }
    }

    /// Builds a catalog from arbitrary descriptors, checking uniqueness.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = RegisterDescriptor>,
    ) -> Result<Self, CatalogError> {
        let mut entries = Vec::new();
        let mut by_symbol = HashMap::new();
        let mut by_address: HashMap<u16, usize> = HashMap::new();

        for descriptor in descriptors {
            descriptor.domain.check(&descriptor.symbol)?;

            let index = entries.len();
            if by_symbol.insert(descriptor.symbol.clone(), index).is_some() {
                return Err(CatalogError::DuplicateSymbol(descriptor.symbol));
            }
            if let Some(&first) = by_address.get(&descriptor.address) {
                let first: &RegisterDescriptor = &entries[first];
                return Err(CatalogError::DuplicateAddress {
                    address: descriptor.address,
                    first: first.symbol.clone(),
                    second: descriptor.symbol,
                });
            }
            by_address.insert(descriptor.address, index);
            entries.push(descriptor);
        }

        Ok(Self {
            entries,
            by_symbol,
            by_address,
        })
    }

    /// Returns the descriptor for `symbol`.
    pub fn lookup(&self, symbol: &str) -> EngineResult<&RegisterDescriptor> {
        self.get(symbol)
            .ok_or_else(|| EngineError::NotFound(symbol.to_string()))
    }

    /// Returns the descriptor for `symbol`, if any.
    pub fn get(&self, symbol: &str) -> Option<&RegisterDescriptor> {
        self.by_symbol.get(symbol).map(|&i| &self.entries[i])
    }

    /// Returns the descriptor at `address`, if any.
    pub fn by_address(&self, address: u16) -> Option<&RegisterDescriptor> {
        self.by_address.get(&address).map(|&i| &self.entries[i])
    }

    /// Iterates descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisterDescriptor> {
        self.entries.iter()
    }

    /// Returns the number of registers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_counts() {
        let catalog = Catalog::generate();
        // 8 control/status + 16 work + 19 function + 27 PID + 192 program
        assert_eq!(catalog.len(), 8 + 16 + 19 + 27 + 192);
    }

    #[test]
    fn test_lookup() {
        let catalog = Catalog::generate();

        let sv = catalog.lookup("SV").unwrap();
        assert_eq!(sv.address, 0x0000);
        assert_eq!(sv.domain, Domain::Range(Range::new(-1999.0, 9999.0)));
        assert_eq!(sv.default_value, Some(FactoryValue::Number(50.0)));

        let prt = catalog.lookup("Pr+t").unwrap();
        assert_eq!(prt.address, 0x0190);
        assert!(!prt.is_writable());

        assert!(matches!(catalog.lookup("XYZ"), Err(EngineError::NotFound(s)) if s == "XYZ"));
    }

    #[test]
    fn test_generated_families() {
        let catalog = Catalog::generate();

        assert_eq!(catalog.lookup("P1").unwrap().address, 0x3000);
        assert_eq!(catalog.lookup("I1").unwrap().address, 0x3001);
        assert_eq!(catalog.lookup("d9").unwrap().address, 0x301A);
        assert_eq!(catalog.lookup("P3").unwrap().description, "3rd P");

        assert_eq!(catalog.lookup("C-01").unwrap().address, 0x4000);
        assert_eq!(catalog.lookup("t-01").unwrap().address, 0x4001);
        assert_eq!(catalog.lookup("Sv64").unwrap().address, 0x40BF);
        assert_eq!(
            catalog.lookup("t-12").unwrap().description,
            "Run time of 12th step"
        );
        assert_eq!(catalog.lookup("t-12").unwrap().domain, Domain::Composite(RUN_MODES));
    }

    #[test]
    fn test_by_address() {
        let catalog = Catalog::generate();
        assert_eq!(catalog.by_address(0x1004).unwrap().symbol, "P");
        assert!(catalog.by_address(0x5000).is_none());
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let result = Catalog::from_descriptors([
            RegisterDescriptor::new("A", "first", 0x10, Domain::Range(Range::new(0.0, 1.0))),
            RegisterDescriptor::new("B", "second", 0x10, Domain::Range(Range::new(0.0, 1.0))),
        ]);
        assert_eq!(
            result.unwrap_err(),
            CatalogError::DuplicateAddress {
                address: 0x10,
                first: "A".into(),
                second: "B".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let result = Catalog::from_descriptors([
            RegisterDescriptor::new("A", "first", 0x10, Domain::StepElapsed),
            RegisterDescriptor::new("A", "second", 0x11, Domain::StepElapsed),
        ]);
        assert_eq!(result.unwrap_err(), CatalogError::DuplicateSymbol("A".into()));
    }

    #[test]
    fn test_empty_range_rejected() {
        let result = Catalog::from_descriptors([RegisterDescriptor::new(
            "A",
            "bad",
            0x10,
            Domain::Range(Range::new(5.0, 1.0)),
        )]);
        assert_eq!(result.unwrap_err(), CatalogError::EmptyRange("A".into()));
    }

    #[test]
    fn test_domain_labels_skip_holes() {
        let labels = Domain::Enum(ALARM_MODES).labels();
        assert_eq!(labels.len(), 13);
        assert_eq!(labels[7], "High alarm (w/hold)");
    }

    #[test]
    fn test_domain_display() {
        assert_eq!(Domain::Range(Range::new(0.0, 100.0)).to_string(), "0..=100");
        assert_eq!(
            Domain::Composite(OUTPUT_TYPES).to_string(),
            "one of [0-10mA, 4-20mA, 0-20mA, Duty cycle (s):3..=100]"
        );
    }
}

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Formulaically generated register families.

use super::tables::RUN_MODES;
use super::{Domain, FactoryValue, Range, RegisterDescriptor};

/// Number of stored PID parameter sets.
pub const PID_SLOTS: u8 = 9;

/// Number of ramp/soak program steps.
pub const PROGRAM_STEPS: u8 = 64;

const PID_BASE: u16 = 0x3000;
const PROGRAM_BASE: u16 = 0x4000;

/// English ordinal of `n`: 1st, 2nd, 3rd, 4th, 11th, 12th, 21st ...
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 10..=19) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// `P1`/`I1`/`d1` .. `P9`/`I9`/`d9`, three consecutive words per slot.
pub(super) fn pid_slot_registers() -> Vec<RegisterDescriptor> {
    (1..=PID_SLOTS)
        .flat_map(|slot| {
            let base = PID_BASE + 3 * u16::from(slot - 1);
            let nth = ordinal(u32::from(slot));
            [
                RegisterDescriptor::new(
                    format!("P{slot}"),
                    format!("{nth} P"),
                    base,
                    Domain::Range(Range::new(0.1, 300.0)),
                )
                .with_default(FactoryValue::Number(20.0))
                .with_scale(0.1),
                RegisterDescriptor::new(
                    format!("I{slot}"),
                    format!("{nth} I"),
                    base + 1,
                    Domain::Range(Range::new(0.0, 2000.0)),
                )
                .with_default(FactoryValue::Number(100.0))
                .with_scale(1.0),
                RegisterDescriptor::new(
                    format!("d{slot}"),
                    format!("{nth} D"),
                    base + 2,
                    Domain::Range(Range::new(0.0, 1000.0)),
                )
                .with_default(FactoryValue::Number(20.0))
                .with_scale(1.0),
            ]
        })
        .collect()
}

/// `C-01`/`t-01`/`Sv01` .. `C-64`/`t-64`/`Sv64`, three words per step.
pub(super) fn program_step_registers() -> Vec<RegisterDescriptor> {
    (1..=PROGRAM_STEPS)
        .flat_map(|step| {
            let base = PROGRAM_BASE + 3 * u16::from(step - 1);
            let nth = ordinal(u32::from(step));
            [
                RegisterDescriptor::new(
                    format!("C-{step:02}"),
                    format!("PID number of {nth} step"),
                    base,
                    Domain::Range(Range::new(0.0, 8.0)),
                )
                .with_default(FactoryValue::Number(1.0))
                .with_scale(1.0),
                RegisterDescriptor::new(
                    format!("t-{step:02}"),
                    format!("Run time of {nth} step"),
                    base + 1,
                    Domain::Composite(RUN_MODES),
                )
                .with_default(FactoryValue::Label("Pause"))
                .with_scale(1.0),
                RegisterDescriptor::new(
                    format!("Sv{step:02}"),
                    format!("SV of {nth} step"),
                    base + 2,
                    Domain::Range(Range::new(-1999.0, 9999.0)),
                )
                .with_default(FactoryValue::Number(0.0))
                .with_scale(1.0),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(13), "13th");
        assert_eq!(ordinal(21), "21st");
        assert_eq!(ordinal(62), "62nd");
        assert_eq!(ordinal(111), "111th");
    }

    #[test]
    fn test_family_sizes() {
        assert_eq!(pid_slot_registers().len(), 27);
        assert_eq!(program_step_registers().len(), 192);
    }

    #[test]
    fn test_program_step_symbols() {
        let steps = program_step_registers();
        assert_eq!(steps[0].symbol, "C-01");
        assert_eq!(steps[1].symbol, "t-01");
        assert_eq!(steps[2].symbol, "Sv01");
        assert_eq!(steps[189].symbol, "C-64");
        assert_eq!(steps[189].address, 0x40BD);
    }
}

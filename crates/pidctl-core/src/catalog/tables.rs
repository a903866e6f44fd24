// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Hand-authored registers of the controller.

use super::{CompositeEntry, Domain, FactoryValue, Range, RegisterDescriptor};

/// Input sensor types (`Inty`).
pub const INPUT_TYPES: &[Option<&str>] = &[
    Some("T Tc"),
    Some("R Tc"),
    Some("J Tc"),
    Some("Wre3-Wre5"),
    Some("B Tc"),
    Some("S Tc"),
    Some("K Tc"),
    Some("E Tc"),
    Some("Pt100"),
    Some("Cu50"),
    Some("0-375Ω"),
    Some("0-80mV"),
    Some("0-30mV"),
    Some("0-5V"),
    Some("1-5V"),
    Some("0-10V"),
    Some("0-10mA"),
    Some("0-20mA"),
    Some("4-20mA"),
];

/// Alarm modes (`AL1y`, `AL2y`). Codes 7 to 15 are reserved.
pub const ALARM_MODES: &[Option<&str>] = &[
    Some("Program"),
    Some("High alarm"),
    Some("Low alarm"),
    Some("Deviation high alarm"),
    Some("Deviation low alarm"),
    Some("Band alarm"),
    Some("Deviation high/low alarm"),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    Some("High alarm (w/hold)"),
    Some("Low alarm (w/hold)"),
    Some("Deviation high alarm (w/hold)"),
    Some("Deviation low alarm (w/hold)"),
    Some("Band alarm (w/hold)"),
    Some("Deviation high/low alarm (w/hold)"),
];

/// Control output types (`oAty`). SSR outputs use the duty cycle.
pub const OUTPUT_TYPES: &[(&str, CompositeEntry)] = &[
    ("0-10mA", CompositeEntry::Scalar(0)),
    ("4-20mA", CompositeEntry::Scalar(1)),
    ("0-20mA", CompositeEntry::Scalar(2)),
    ("Duty cycle (s)", CompositeEntry::Range(Range::new(3.0, 100.0))),
];

/// Program step run modes (`t-01` .. `t-64`).
pub const RUN_MODES: &[(&str, CompositeEntry)] = &[
    ("Energize J1", CompositeEntry::Scalar(-1011)),
    ("De-energize J1", CompositeEntry::Scalar(-1010)),
    ("Energize J2", CompositeEntry::Scalar(-1021)),
    ("De-energize J2", CompositeEntry::Scalar(-1020)),
    ("Jump", CompositeEntry::Range(Range::new(-64.0, -1.0))),
    ("Pause", CompositeEntry::Scalar(0)),
    ("Run", CompositeEntry::Range(Range::new(1.0, 9999.0))),
];

const OFF_ON: &[Option<&str>] = &[Some("Off"), Some("On")];
const ACTION: &[Option<&str>] = &[Some("reverse action"), Some("direct action")];
const RETRANSMISSION: &[Option<&str>] = &[Some("0-10mA"), Some("4-20mA"), Some("0-20mA")];
const EXTRACTION: &[Option<&str>] = &[Some("extraction"), Some("no extraction")];
const POWER_FAIL: &[Option<&str>] = &[Some("Reset"), Some("Resume")];
const WORK_MODES: &[Option<&str>] = &[
    Some("SV"),
    Some("S-SV"),
    Some("M-SV"),
    Some("S-PV"),
    Some("M-PV"),
];
const TEMPERATURE_UNIT: &[Option<&str>] = &[Some("C"), Some("F")];
const BAUD_RATES: &[Option<&str>] = &[Some("1200"), Some("2400"), Some("4800"), Some("9600")];

/// Compact row used to spell out the table.
struct Row {
    symbol: &'static str,
    description: &'static str,
    address: u16,
    domain: Domain,
    default_value: Option<FactoryValue>,
    nominal_scale: Option<f64>,
}

const fn range(min: f64, max: f64) -> Domain {
    Domain::Range(Range::new(min, max))
}

const fn num(n: f64) -> Option<FactoryValue> {
    Some(FactoryValue::Number(n))
}

const fn label(l: &'static str) -> Option<FactoryValue> {
    Some(FactoryValue::Label(l))
}

macro_rules! rows {
    ($( $symbol:literal, $description:literal, $address:literal, $domain:expr, $default:expr, $scale:expr; )*) => {
        &[$(Row {
            symbol: $symbol,
            description: $description,
            address: $address,
            domain: $domain,
            default_value: $default,
            nominal_scale: $scale,
        }),*]
    };
}

const ROWS: &[Row] = rows![
    // Control
    "SV",   "Set value",                           0x0000, range(-1999.0, 9999.0),         num(50.0),  None;
    "AL1",  "First alarm set value",               0x0001, range(-1999.0, 9999.0),         num(60.0),  None;
    "AL2",  "Second alarm set value",              0x0002, range(-1999.0, 9999.0),         num(40.0),  None;
    "At",   "Auto tuning ON/OFF",                  0x0003, Domain::Enum(OFF_ON),           label("Off"), Some(1.0);

    // Status
    "PV",   "Measured process value",              0x0164, range(-1999.0, 9999.0),         None,       Some(1.0);
    "dSV",  "Dynamic set value",                   0x0168, range(-1999.0, 9999.0),         None,       Some(1.0);
    "OUT",  "Output value",                        0x016C, range(0.0, 100.0),              None,       Some(0.1);
    "Pr+t", "Curve segment number and time",       0x0190, Domain::StepElapsed,            None,       None;

    // Work parameters
    "AL1y", "First alarm type",                    0x1000, Domain::Enum(ALARM_MODES),      label("High alarm"), Some(1.0);
    "AL1C", "First alarm hysteresis",              0x1001, range(0.0, 9999.0),             num(0.0),   None;
    "AL2y", "Second alarm type",                   0x1002, Domain::Enum(ALARM_MODES),      label("Low alarm"), Some(1.0);
    "AL2C", "Second alarm hysteresis",             0x1003, range(0.0, 9999.0),             num(0.0),   None;
    "P",    "Proportional band",                   0x1004, range(0.1, 300.0),              num(20.0),  Some(0.1);
    "I",    "Integral time",                       0x1005, range(0.0, 2000.0),             num(100.0), Some(1.0);
    "d",    "Derivative time",                     0x1006, range(0.0, 999.0),              num(20.0),  Some(1.0);
    "Ct",   "PID proportion cycle",                0x1007, range(0.0, 100.0),              num(1.0),   Some(1.0);
    "SF",   "Anti-reset windup",                   0x1008, range(0.0, 9999.0),             num(50.0),  None;
    "Pd",   "Derivative amplitude limit",          0x1009, range(0.1, 0.9),                num(0.5),   Some(0.1);
    "bb",   "Range of PID action",                 0x100A, range(0.0, 9999.0),             num(1000.0), Some(1.0);
    "outL", "Output low limit",                    0x100B, range(0.0, 100.0),              num(0.0),   Some(0.1);
    "outH", "Output high limit",                   0x100C, range(0.0, 100.0),              num(100.0), Some(0.1);
    "nout", "Output value when input is abnormal", 0x100D, range(0.0, 100.0),              num(20.0),  Some(1.0);
    "Psb",  "PV bias",                             0x100E, range(-1999.0, 9999.0),         num(0.0),   None;
    "FILt", "Digital filter",                      0x100F, range(0.0, 3.0),                num(1.0),   Some(1.0);

    // Function parameters
    "Inty", "Input signal type",                   0x2000, Domain::Enum(INPUT_TYPES),      label("Pt100"), Some(1.0);
    "PvL",  "Display low limit",                   0x2001, range(-1999.0, 9999.0),         num(0.0),   None;
    "PvH",  "Display high limit",                  0x2002, range(-1999.0, 9999.0),         num(500.0), None;
    "dot",  "Decimal point position",              0x2003, range(0.0, 3.0),                num(1.0),   Some(1.0);
    "rd",   "Direct/reverse action",               0x2004, Domain::Enum(ACTION),           label("reverse action"), Some(1.0);
    "obty", "Re-transmission output type",         0x2005, Domain::Enum(RETRANSMISSION),   label("0-20mA"), Some(1.0);
    "obL",  "Re-transmission low limit",           0x2006, range(-1999.0, 9999.0),         num(0.0),   None;
    "obH",  "Re-transmission high limit",          0x2007, range(-1999.0, 9999.0),         num(500.0), None;
    "oAty", "Output type",                         0x2008, Domain::Composite(OUTPUT_TYPES), label("0-20mA"), Some(1.0);
    "EL",   "Extraction",                          0x2009, Domain::Enum(EXTRACTION),       label("no extraction"), Some(1.0);
    "SS",   "Small signal removal",                0x200A, range(0.0, 100.0),              num(0.0),   Some(1.0);
    "rES",  "Delay startup",                       0x200B, range(0.0, 120.0),              num(0.0),   Some(1.0);
    "uP",   "Power fail process",                  0x200C, Domain::Enum(POWER_FAIL),       label("Resume"), Some(1.0);
    "ModL", "Work mode",                           0x200D, Domain::Enum(WORK_MODES),       label("SV"), Some(1.0);
    "PrL",  "First step",                          0x200E, range(1.0, 63.0),               num(1.0),   Some(1.0);
    "PrH",  "Last step",                           0x200F, range(2.0, 64.0),               num(63.0),  Some(1.0);
    "corf", "Celsius/Fahrenheit",                  0x2010, Domain::Enum(TEMPERATURE_UNIT), label("C"), Some(1.0);
    "Id",   "Communication address",               0x2011, range(1.0, 64.0),               num(5.0),   Some(1.0);
    "bAud", "Communication baud rate",             0x2012, Domain::Enum(BAUD_RATES),       label("9600"), Some(1.0);
];

/// Returns the fixed registers in declaration order.
pub(super) fn fixed_registers() -> Vec<RegisterDescriptor> {
    ROWS.iter()
        .map(|row| RegisterDescriptor {
            symbol: row.symbol.to_string(),
            description: row.description.to_string(),
            address: row.address,
            domain: row.domain,
            default_value: row.default_value,
            nominal_scale: row.nominal_scale,
        })
        .collect()
}

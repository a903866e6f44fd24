// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Two-word value codec.
//!
//! Every register is read and written as a pair of words `[w0, w1]`:
//!
//! ```text
//!   w0  signed 16-bit mantissa (two's complement)
//!   w1  decimal exponent, scale = 10^-w1
//!
//!   [0x00FF, 0x0001]  ->  255 * 0.1 = 25.5
//!   [0xFFCE, 0x0001]  ->  -50 * 0.1 = -5.0
//! ```
//!
//! The combined step/elapsed register packs its fields differently and
//! ignores the scale:
//!
//! ```text
//!   w0 = SSSS SSSS EEEE EEEE     step    = w0 >> 8
//!   w1 = eeee eeee xxxx xxxx     elapsed = (w0 & 0xff) << 8 | w1 >> 8
//! ```
//!
//! Writing is split in two so validation can run before anything is sent:
//! [`validate`] checks the input against the domain, then [`encode`] turns
//! the validated value into words once the live scale is known. The second
//! word of an outgoing pair is always zero.

use crate::catalog::{CompositeEntry, Domain};
use crate::error::CodecError;
use crate::value::{Reading, RegisterInput, Value};

/// Interprets a word as signed 16-bit two's complement.
pub fn signed(word: u16) -> i32 {
    if word > 0x7fff {
        i32::from(word) - 0x10000
    } else {
        i32::from(word)
    }
}

/// Returns the scale announced by the exponent word, `10^-w1`.
pub fn scale_of(exponent: u16) -> f64 {
    10f64.powi(-i32::from(exponent))
}

/// Applies the exponent to the mantissa.
///
/// Divides by the power of ten instead of multiplying by the scale so
/// `255 / 10` comes out as exactly `25.5`.
fn scaled(mantissa: u16, exponent: u16) -> f64 {
    f64::from(signed(mantissa)) / 10f64.powi(i32::from(exponent))
}

/// Decodes a raw pair against a domain.
///
/// Never fails: a value the domain does not know decodes to
/// [`Value::Unknown`].
pub fn decode(domain: &Domain, words: [u16; 2]) -> Reading {
    let [w0, w1] = words;

    let number = match domain {
        Domain::StepElapsed => {
            let step = w0 >> 8;
            let elapsed = ((w0 & 0xff) << 8) | (w1 >> 8);
            return Reading::new(Value::StepElapsed { step, elapsed }, 1.0);
        }
        _ => scaled(w0, w1),
    };
    let scale = scale_of(w1);

    let value = match domain {
        Domain::Range(range) => {
            if range.contains(number) {
                Value::Number(number)
            } else {
                Value::Unknown
            }
        }
        Domain::Enum(labels) => {
            let index = number.round();
            if index >= 0.0 && index < labels.len() as f64 {
                match labels[index as usize] {
                    Some(label) => Value::Label(label.to_string()),
                    None => Value::Unknown,
                }
            } else {
                Value::Unknown
            }
        }
        Domain::Composite(entries) => entries
            .iter()
            .find_map(|(label, entry)| match entry {
                CompositeEntry::Range(range) if range.contains(number) => {
                    Some(Value::LabelWithNumber((*label).to_string(), number))
                }
                CompositeEntry::Scalar(exact) if f64::from(*exact) == number => {
                    Some(Value::Label((*label).to_string()))
                }
                _ => None,
            })
            .unwrap_or(Value::Unknown),
        Domain::StepElapsed => Value::Unknown,
    };

    Reading::new(value, scale)
}

/// A write value that passed domain validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Validated {
    /// A real number still to be divided by the live scale.
    Scaled(f64),
    /// A raw integer sent as is (label index or composite scalar).
    Exact(i32),
}

/// Checks `input` against `domain` without touching the device.
pub fn validate(domain: &Domain, input: &RegisterInput) -> Result<Validated, CodecError> {
    match domain {
        Domain::Range(range) => match input {
            RegisterInput::Number(n) if range.contains(*n) => Ok(Validated::Scaled(*n)),
            RegisterInput::Number(n) => Err(CodecError::OutOfRange {
                value: *n,
                min: range.min,
                max: range.max,
            }),
            _ => Err(CodecError::WrongInputKind { expected: "a number" }),
        },

        Domain::Enum(labels) => {
            let wanted = match input {
                RegisterInput::Label(label) => label.clone(),
                // Numeric-looking labels such as baud rates arrive as numbers.
                RegisterInput::Number(n) => n.to_string(),
                RegisterInput::LabelWithNumber(..) => {
                    return Err(CodecError::WrongInputKind { expected: "a label" })
                }
            };
            labels
                .iter()
                .position(|label| *label == Some(wanted.as_str()))
                .map(|index| Validated::Exact(index as i32))
                .ok_or(CodecError::UnknownLabel(wanted))
        }

        Domain::Composite(entries) => {
            let (wanted, number) = match input {
                RegisterInput::Label(label) => (label.as_str(), None),
                RegisterInput::LabelWithNumber(label, n) => (label.as_str(), Some(*n)),
                RegisterInput::Number(_) => {
                    return Err(CodecError::WrongInputKind { expected: "a label" })
                }
            };
            let entry = entries
                .iter()
                .find(|(label, _)| *label == wanted)
                .map(|(_, entry)| entry)
                .ok_or_else(|| CodecError::UnknownLabel(wanted.to_string()))?;

            match entry {
                CompositeEntry::Scalar(exact) => Ok(Validated::Exact(*exact)),
                CompositeEntry::Range(range) => match number {
                    Some(n) if range.contains(n) => Ok(Validated::Scaled(n)),
                    Some(n) => Err(CodecError::OutOfRange {
                        value: n,
                        min: range.min,
                        max: range.max,
                    }),
                    None => Err(CodecError::MissingNumber(wanted.to_string())),
                },
            }
        }

        Domain::StepElapsed => Err(CodecError::ReadOnly),
    }
}

/// Encodes a validated value at the live `scale`.
///
/// Scaled values are rounded half away from zero. Negative results are
/// re-biased into unsigned word space. The exponent word is always zero.
pub fn encode(validated: Validated, scale: f64) -> Result<[u16; 2], CodecError> {
    let intval = match validated {
        Validated::Exact(n) => i64::from(n),
        Validated::Scaled(n) => {
            let raw = (n / scale).round();
            if !raw.is_finite() || raw < f64::from(i16::MIN) || raw > f64::from(i16::MAX) {
                return Err(CodecError::NotRepresentable { value: n, scale });
            }
            raw as i64
        }
    };

    if intval < i64::from(i16::MIN) || intval > i64::from(i16::MAX) {
        return Err(CodecError::NotRepresentable {
            value: intval as f64,
            scale,
        });
    }

    let word = if intval < 0 { intval + 0x10000 } else { intval };
    Ok([word as u16, 0])
}

/// Validates and encodes in one step.
pub fn encode_input(
    domain: &Domain,
    input: &RegisterInput,
    scale: f64,
) -> Result<[u16; 2], CodecError> {
    encode(validate(domain, input)?, scale)
}

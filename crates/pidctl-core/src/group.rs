// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Register groups mirroring the operator panels.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use pidctl_modbus::ModbusTransport;

use crate::catalog::{PID_SLOTS, PROGRAM_STEPS};
use crate::engine::Engine;
use crate::error::EngineResult;
use crate::value::{Reading, RegisterRef, Value};

const CONTROL: &[&str] = &["SV", "AL1", "AL2", "At"];

const WORK: &[&str] = &[
    "AL1y", "AL1C", "AL2y", "AL2C", "P", "I", "d", "Ct", "SF", "Pd", "bb", "outL", "outH", "nout",
    "Psb", "FILt",
];

const FUNCTION: &[&str] = &[
    "Inty", "PvL", "PvH", "dot", "rd", "obty", "obL", "obH", "oAty", "EL", "SS", "rES", "uP",
    "ModL", "PrL", "PrH", "corf", "Id", "bAud",
];

const STATUS: &[&str] = &["PV", "dSV", "OUT", "Pr+t"];

/// A panel of related registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterGroup {
    /// Set value and alarm set points.
    Control,
    /// Work parameters (alarms, PID, output limits).
    Work,
    /// Function parameters (input, display, communication).
    Function,
    /// Live process values and the status coils.
    Status,
    /// The nine stored PID parameter sets.
    Pid,
    /// The 64 program steps.
    Program,
}

/// One thing a group refresh reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupMember {
    /// A catalog register.
    Register(String),
    /// The status coil set.
    Flags,
}

impl fmt::Display for GroupMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(symbol) => f.write_str(symbol),
            Self::Flags => f.write_str("flags"),
        }
    }
}

impl RegisterGroup {
    /// Every group, in panel order.
    pub const ALL: [RegisterGroup; 6] = [
        Self::Control,
        Self::Work,
        Self::Function,
        Self::Status,
        Self::Pid,
        Self::Program,
    ];

    /// Returns the group's name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Work => "work",
            Self::Function => "function",
            Self::Status => "status",
            Self::Pid => "pid",
            Self::Program => "program",
        }
    }

    /// Returns the members in read order.
    pub fn members(self) -> Vec<GroupMember> {
        let fixed = |symbols: &[&str]| -> Vec<GroupMember> {
            symbols
                .iter()
                .map(|s| GroupMember::Register((*s).to_string()))
                .collect()
        };

        match self {
            Self::Control => fixed(CONTROL),
            Self::Work => fixed(WORK),
            Self::Function => fixed(FUNCTION),
            Self::Status => {
                let mut members = fixed(STATUS);
                members.push(GroupMember::Flags);
                members
            }
            Self::Pid => (1..=PID_SLOTS)
                .flat_map(|slot| ["P", "I", "d"].map(|p| GroupMember::Register(format!("{p}{slot}"))))
                .collect(),
            Self::Program => (1..=PROGRAM_STEPS)
                .flat_map(|step| {
                    [
                        format!("C-{step:02}"),
                        format!("t-{step:02}"),
                        format!("Sv{step:02}"),
                    ]
                    .map(GroupMember::Register)
                })
                .collect(),
        }
    }
}

impl fmt::Display for RegisterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RegisterGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|g| g.name() == lower)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|g| g.name()).collect();
                format!("unknown group '{s}', expected one of: {}", names.join(", "))
            })
    }
}

impl<T: ModbusTransport> Engine<T> {
    /// Reads every member of `group` in order, publishing each value.
    ///
    /// Runs as one busy operation and stops at the first failure.
    pub async fn refresh_group(
        &self,
        group: RegisterGroup,
    ) -> EngineResult<Vec<(GroupMember, Reading)>> {
        let _busy = self.enter_busy();
        let members = group.members();

        // Resolve everything up front so a bad symbol fails before any traffic.
        let mut targets = Vec::with_capacity(members.len());
        for member in &members {
            targets.push(match member {
                GroupMember::Register(symbol) => Some(self.resolve(&RegisterRef::Symbol(symbol.clone()))?),
                GroupMember::Flags => None,
            });
        }

        tracing::debug!(group = %group, members = members.len(), "Refreshing group");
        let mut transport = self.lock_channel().await;
        let mut readings = Vec::with_capacity(members.len());
        for (member, target) in members.into_iter().zip(targets) {
            let reading = match target {
                Some(target) => self.read_locked(&mut transport, &target, true).await?,
                None => {
                    let flags = self.flags_locked(&mut transport).await?;
                    Reading::new(Value::Flags(flags), 1.0)
                }
            };
            readings.push((member, reading));
        }
        Ok(readings)
    }
}

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! PID slot transfer.

use std::io::Write;

use pidctl_modbus::ModbusTransport;

use crate::cli::{PidAction, PidArgs};
use crate::error::{BinError, BinResult};
use crate::output::{Printer, ValueTable};
use crate::runtime::Session;

/// Copies PID parameters between the working set and a stored slot.
pub async fn pid<T: ModbusTransport, W: Write>(
    session: &Session<T>,
    args: &PidArgs,
    printer: &mut Printer<W>,
) -> BinResult<()> {
    let engine = session.engine();
    let (title, readings) = match args.action {
        PidAction::Store { slot } => {
            let readings = session
                .interruptible(async { engine.store_pid_slot(slot).await.map_err(BinError::from) })
                .await?;
            (format!("working PID stored into slot {slot}"), readings)
        }
        PidAction::Load { slot } => {
            let readings = session
                .interruptible(async { engine.load_pid_slot(slot).await.map_err(BinError::from) })
                .await?;
            (format!("slot {slot} loaded into working PID"), readings)
        }
    };

    printer.emit(&ValueTable::from_pairs(title, readings))
}

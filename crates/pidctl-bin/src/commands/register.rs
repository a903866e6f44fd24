// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! One-shot register commands.

use std::io::Write;

use tracing::info;

use pidctl_core::{RegisterInput, RegisterRef};
use pidctl_modbus::ModbusTransport;

use crate::cli::{CoilArgs, DumpArgs, ReadArgs, WriteArgs};
use crate::error::{BinError, BinResult};
use crate::output::{Ack, FlagReport, Printer, RegisterValue, ValueTable};
use crate::runtime::Session;

/// Reads one register by symbol or `0xNNNN` address.
pub async fn read<T: ModbusTransport, W: Write>(
    session: &Session<T>,
    args: &ReadArgs,
    printer: &mut Printer<W>,
) -> BinResult<()> {
    let register = RegisterRef::parse(&args.register);
    let engine = session.engine();
    let reading = session
        .interruptible(async { engine.read_register(register.clone()).await.map_err(BinError::from) })
        .await?;

    printer.emit(&RegisterValue::new(register.to_string(), reading))
}

/// Writes one register and prints what the device holds afterwards.
pub async fn write<T: ModbusTransport, W: Write>(
    session: &Session<T>,
    args: &WriteArgs,
    printer: &mut Printer<W>,
) -> BinResult<()> {
    let input = RegisterInput::parse(&args.value);
    let engine = session.engine();
    let reading = session
        .interruptible(async {
            engine
                .apply_and_verify(&args.register, input.clone())
                .await
                .map_err(BinError::from)
        })
        .await?;

    info!(register = %args.register, requested = %input, actual = %reading.value, "Register written");
    printer.emit(&RegisterValue::new(args.register.clone(), reading))
}

/// Reads the status coils.
pub async fn flags<T: ModbusTransport, W: Write>(
    session: &Session<T>,
    printer: &mut Printer<W>,
) -> BinResult<()> {
    let engine = session.engine();
    let flags = session
        .interruptible(async { engine.read_flags().await.map_err(BinError::from) })
        .await?;

    printer.emit(&FlagReport { flags })
}

/// Reads every member of a register group.
pub async fn dump<T: ModbusTransport, W: Write>(
    session: &Session<T>,
    args: &DumpArgs,
    printer: &mut Printer<W>,
) -> BinResult<()> {
    let engine = session.engine();
    let readings = session
        .interruptible(async { engine.refresh_group(args.group).await.map_err(BinError::from) })
        .await?;

    printer.emit(&ValueTable::from_group(args.group, readings))
}

/// Switches a control coil.
pub async fn coil<T: ModbusTransport, W: Write>(
    session: &Session<T>,
    args: &CoilArgs,
    printer: &mut Printer<W>,
) -> BinResult<()> {
    let on = args.state.is_on();
    let engine = session.engine();
    session
        .interruptible(async { engine.set_coil(args.coil, on).await.map_err(BinError::from) })
        .await?;

    printer.emit(&Ack::new(format!(
        "{} {}",
        args.coil,
        if on { "on" } else { "off" }
    )))
}

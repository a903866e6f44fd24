// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Auto-tune session.

use std::io::Write;

use tokio::sync::mpsc;

use pidctl_core::AutoTuneOptions;
use pidctl_modbus::ModbusTransport;

use crate::cli::IntervalArgs;
use crate::error::BinResult;
use crate::output::Printer;
use crate::runtime::Session;

/// Runs auto-tune until shutdown, printing each sample as it arrives.
pub async fn autotune<T: ModbusTransport, W: Write>(
    session: &Session<T>,
    args: &IntervalArgs,
    printer: &mut Printer<W>,
) -> BinResult<()> {
    let (tx, mut rx) = mpsc::channel(16);
    let options = AutoTuneOptions {
        interval: args.interval,
    };
    let stop = session.shutdown().shutdown_signal().wait();

    let tune = session.engine().auto_tune(options, stop, Some(tx));
    tokio::pin!(tune);

    let report = loop {
        tokio::select! {
            report = &mut tune => break report?,
            Some(sample) = rx.recv() => printer.emit(&sample)?,
        }
    };

    while let Ok(sample) = rx.try_recv() {
        printer.emit(&sample)?;
    }
    printer.emit(&report)
}

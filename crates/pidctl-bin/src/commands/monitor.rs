// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Live value stream.

use std::io::Write;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use pidctl_core::{EngineEvent, RegisterGroup};
use pidctl_modbus::ModbusTransport;

use crate::cli::IntervalArgs;
use crate::error::BinResult;
use crate::output::Printer;
use crate::runtime::Session;

/// Refreshes the status group every interval and prints each published
/// change until shutdown.
///
/// A failed refresh is logged and retried on the next tick.
pub async fn monitor<T: ModbusTransport, W: Write>(
    session: &Session<T>,
    args: &IntervalArgs,
    printer: &mut Printer<W>,
) -> BinResult<()> {
    let engine = session.engine();
    let mut events = engine.subscribe();
    let stop = session.shutdown().shutdown_signal().wait();
    tokio::pin!(stop);

    let mut ticker = tokio::time::interval(args.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval = ?args.interval, "Monitoring, press Ctrl-C to stop");
    loop {
        tokio::select! {
            biased;
            () = &mut stop => break,
            event = events.recv() => match event {
                Ok(event @ EngineEvent::Changed(_)) => printer.emit(&event)?,
                Ok(_) => {}
                Err(_) => break,
            },
            _ = ticker.tick() => {
                if let Err(e) = engine.refresh_group(RegisterGroup::Status).await {
                    warn!(error = %e, "Status refresh failed");
                }
            }
        }
    }

    for event in events.drain() {
        if event.as_change().is_some() {
            printer.emit(&event)?;
        }
    }
    Ok(())
}

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - `list`: Catalog listing, no device needed
//! - `read`, `write`, `flags`, `dump`, `coil`: One-shot register access
//! - `pid`: PID slot transfer
//! - `monitor`: Live value stream
//! - `autotune`: Auto-tune session

mod autotune;
mod list;
mod monitor;
mod pid;
mod register;

pub use autotune::autotune;
pub use list::list;
pub use monitor::monitor;
pub use pid::pid;
pub use register::{coil, dump, flags, read, write};

use std::io::Write;

use pidctl_core::Catalog;
use pidctl_modbus::ModbusTransport;

use crate::cli::{Cli, Commands};
use crate::error::BinResult;
use crate::output::Printer;
use crate::runtime::Session;
use crate::settings::Settings;
use crate::shutdown::ShutdownCoordinator;

/// Executes the command selected on the command line.
pub async fn execute(cli: &Cli, settings: &Settings) -> BinResult<()> {
    let mut printer = Printer::stdout(cli.format);

    if let Commands::List(args) = &cli.command {
        return list::list(&Catalog::generate(), args, &mut printer);
    }

    let shutdown = ShutdownCoordinator::new();
    let listener = shutdown.listen_for_signals();

    let result = match Session::open(settings, shutdown).await {
        Ok(session) => {
            let result = run(&session, &cli.command, &mut printer).await;
            session.close().await;
            result
        }
        Err(e) => Err(e),
    };

    listener.abort();
    result
}

/// Runs `command` against an open session.
pub async fn run<T, W>(
    session: &Session<T>,
    command: &Commands,
    printer: &mut Printer<W>,
) -> BinResult<()>
where
    T: ModbusTransport,
    W: Write,
{
    match command {
        Commands::List(args) => list::list(session.engine().catalog(), args, printer),
        Commands::Read(args) => register::read(session, args, printer).await,
        Commands::Write(args) => register::write(session, args, printer).await,
        Commands::Flags => register::flags(session, printer).await,
        Commands::Dump(args) => register::dump(session, args, printer).await,
        Commands::Coil(args) => register::coil(session, args, printer).await,
        Commands::Pid(args) => pid::pid(session, args, printer).await,
        Commands::Monitor(args) => monitor::monitor(session, args, printer).await,
        Commands::Autotune(args) => autotune::autotune(session, args, printer).await,
    }
}

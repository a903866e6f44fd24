// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! pidctl - inspect and tune a Modbus PID temperature controller.

use tracing::debug;

use pidctl_bin::error::report_error_and_exit;
use pidctl_bin::{commands, init_logging, BinResult, Cli, Settings};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    if let Err(e) = run(cli).await {
        report_error_and_exit(e);
    }
}

async fn run(cli: Cli) -> BinResult<()> {
    let mut settings = Settings::load(&cli.config)?;
    settings.apply_cli(&cli);

    init_logging(
        cli.effective_log_level(&settings.logging.level),
        settings.logging.format,
    )?;
    debug!(version = pidctl_bin::VERSION, config = %cli.config.display(), "pidctl starting");

    commands::execute(&cli, &settings).await
}

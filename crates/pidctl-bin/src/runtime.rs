// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Device session orchestration.
//!
//! A [`Session`] owns the engine for the lifetime of one command:
//!
//! - Settings validation
//! - Transport and engine construction
//! - Connect on open, disconnect on close
//! - Racing commands against the shutdown signal

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use pidctl_core::Engine;
use pidctl_modbus::{ModbusRtuTransport, ModbusTransport};

use crate::error::{BinError, BinResult};
use crate::settings::Settings;
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// Session
// =============================================================================

/// An open engine plus the shutdown coordinator commands race against.
pub struct Session<T: ModbusTransport> {
    engine: Arc<Engine<T>>,
    shutdown: ShutdownCoordinator,
}

impl Session<ModbusRtuTransport> {
    /// Opens the serial link described by `settings`.
    pub async fn open(settings: &Settings, shutdown: ShutdownCoordinator) -> BinResult<Self> {
        settings.validate()?;

        info!(serial = %settings.serial, "Opening controller session");
        let transport = ModbusRtuTransport::new(settings.serial.clone());
        Self::with_transport(transport, settings, shutdown).await
    }
}

impl<T: ModbusTransport> Session<T> {
    /// Builds the engine over an existing transport and connects it.
    pub async fn with_transport(
        transport: T,
        settings: &Settings,
        shutdown: ShutdownCoordinator,
    ) -> BinResult<Self> {
        let engine = Engine::new(transport, settings.engine.clone())?;
        engine
            .connect()
            .await
            .map_err(|e| BinError::from(e).with_context("cannot connect to controller"))?;

        Ok(Self {
            engine: Arc::new(engine),
            shutdown,
        })
    }

    /// Returns the engine.
    pub fn engine(&self) -> &Arc<Engine<T>> {
        &self.engine
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Runs `future` unless shutdown wins first.
    pub async fn interruptible<F, R>(&self, future: F) -> BinResult<R>
    where
        F: Future<Output = BinResult<R>>,
    {
        let signal = self.shutdown.shutdown_signal();
        tokio::select! {
            biased;
            result = future => result,
            _ = signal.wait() => Err(BinError::Interrupted),
        }
    }

    /// Closes the link and logs the session statistics.
    pub async fn close(self) {
        let stats = self.engine.stats();
        let bus = self.engine.bus_stats();
        debug!(
            transactions = stats.transactions,
            failures = stats.failures,
            timeouts = stats.timeouts,
            recoveries = stats.recoveries,
            success_rate = stats.success_rate(),
            average_latency = ?stats.average_latency(),
            events_dropped = bus.events_dropped,
            "Session statistics"
        );

        if let Err(e) = self.engine.disconnect().await {
            warn!(error = %e, "Failed to close controller session");
        }
    }
}

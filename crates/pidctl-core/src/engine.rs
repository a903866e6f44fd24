// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The register transaction engine.
//!
//! # Architecture
//!
//! ```text
//!  read_register("SV")
//!        │
//!        ├── BusyTracker::enter         (0→1 publishes OperationsStarted)
//!        ├── Catalog::lookup            (NotFound, nothing sent)
//!        ├── codec::validate            (InvalidArgument, nothing sent; writes only)
//!        ├── channel.lock()             (one raw exchange at a time)
//!        ├── with_deadline(transport)   ──timeout──► recover() ──► Err(Timeout)
//!        ├── codec::decode / encode
//!        ├── EventBus::publish_change   (reads only, unless suppressed)
//!        └── settle delay, then unlock
//! ```
//!
//! The channel mutex stays held through the settle delay, so the next
//! exchange can only start once the device has had time to turn around.
//! Events are published while the mutex is held, which makes publish order
//! equal to completion order.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio::time::Instant;

use pidctl_modbus::{ModbusError, ModbusTransport, ProtocolError};

use crate::bus::{BusStats, EventBus, EventSubscriber};
use crate::busy::{BusyGuard, BusyTracker};
use crate::catalog::{Catalog, Domain, Range, RegisterDescriptor};
use crate::codec::{self, Validated};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::guard::with_deadline;
use crate::stats::{EngineStats, EngineStatsSnapshot};
use crate::value::{EventKey, FlagSet, Reading, RegisterInput, RegisterRef, Value, FLAG_NAMES};

/// Number of status coils read by [`Engine::read_flags`].
const FLAG_COUNT: u16 = FLAG_NAMES.len() as u16;

/// Address of the first status coil.
const FLAG_ADDRESS: u16 = 0x0000;

// =============================================================================
// ConnectionState
// =============================================================================

/// Logical state of the link as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not connected, or reconnection after a timeout failed.
    #[default]
    Disconnected,
    /// Ready for transactions.
    Connected,
    /// Discarding an abandoned exchange and reopening the link.
    Recovering,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Recovering => "recovering",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Coil
// =============================================================================

/// Writable control coils.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coil {
    /// Auto-tune trigger (`NAT`).
    Nat,
    /// Automatic/manual control (`A/M`).
    AutoManual,
}

impl Coil {
    /// Returns the coil address.
    pub fn address(self) -> u16 {
        match self {
            Self::Nat => 0,
            Self::AutoManual => 1,
        }
    }
}

impl fmt::Display for Coil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nat => f.write_str("NAT"),
            Self::AutoManual => f.write_str("A/M"),
        }
    }
}

impl FromStr for Coil {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nat" => Ok(Self::Nat),
            "am" | "a/m" => Ok(Self::AutoManual),
            other => Err(format!("unknown coil '{other}', expected 'nat' or 'am'")),
        }
    }
}

// =============================================================================
// Raw requests
// =============================================================================

/// One raw exchange with the device.
#[derive(Debug, Clone, Copy)]
enum Request {
    ReadPair { address: u16 },
    ReadCoils { address: u16, count: u16 },
    WritePair { address: u16, words: [u16; 2] },
    WriteCoil { address: u16, value: bool },
}

#[derive(Debug)]
enum Response {
    Words(Vec<u16>),
    Bits(Vec<bool>),
    Done,
}

impl Request {
    fn name(&self) -> &'static str {
        match self {
            Self::ReadPair { .. } => "read_holding_registers",
            Self::ReadCoils { .. } => "read_coils",
            Self::WritePair { .. } => "write_multiple_registers",
            Self::WriteCoil { .. } => "write_single_coil",
        }
    }

    async fn send<T: ModbusTransport + ?Sized>(self, transport: &T) -> Result<Response, ModbusError> {
        match self {
            Self::ReadPair { address } => transport
                .read_holding_registers(address, 2)
                .await
                .map(Response::Words),
            Self::ReadCoils { address, count } => {
                transport.read_coils(address, count).await.map(Response::Bits)
            }
            Self::WritePair { address, words } => transport
                .write_multiple_registers(address, &words)
                .await
                .map(|()| Response::Done),
            Self::WriteCoil { address, value } => transport
                .write_single_coil(address, value)
                .await
                .map(|()| Response::Done),
        }
    }
}

impl Response {
    /// Rejects a response whose shape does not match `request`.
    fn check(self, request: &Request) -> EngineResult<Self> {
        let fits = match (request, &self) {
            (Request::ReadPair { .. }, Self::Words(words)) => words.len() >= 2,
            (Request::ReadCoils { count, .. }, Self::Bits(bits)) => bits.len() >= usize::from(*count),
            (Request::WritePair { .. } | Request::WriteCoil { .. }, Self::Done) => true,
            _ => false,
        };
        if fits {
            Ok(self)
        } else {
            Err(unexpected(format!("{} answered with {self:?}", request.name())))
        }
    }

    fn into_pair(self) -> EngineResult<[u16; 2]> {
        match self {
            Self::Words(words) if words.len() >= 2 => Ok([words[0], words[1]]),
            other => Err(unexpected(format!("expected two registers, got {other:?}"))),
        }
    }

    fn into_bits(self, count: u16) -> EngineResult<Vec<bool>> {
        match self {
            Self::Bits(bits) if bits.len() >= usize::from(count) => Ok(bits),
            other => Err(unexpected(format!("expected {count} coils, got {other:?}"))),
        }
    }
}

fn unexpected(message: String) -> EngineError {
    ModbusError::protocol(ProtocolError::unexpected(message)).into()
}

/// A resolved read target.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub(crate) key: EventKey,
    pub(crate) address: u16,
    pub(crate) domain: Domain,
}

impl From<&RegisterDescriptor> for Target {
    fn from(descriptor: &RegisterDescriptor) -> Self {
        Self {
            key: EventKey::Register(descriptor.symbol.clone()),
            address: descriptor.address,
            domain: descriptor.domain,
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Typed register transaction engine bound to one physical unit.
///
/// All operations take `&self`; concurrent callers are serialized on the
/// transport channel. Share an engine with `Arc<Engine<T>>`.
///
/// # Example
///
/// ```rust,ignore
/// use pidctl_core::{Engine, EngineConfig, RegisterInput};
/// use pidctl_modbus::{ModbusRtuConfig, ModbusRtuTransport};
///
/// let transport = ModbusRtuTransport::new(ModbusRtuConfig::new("/dev/ttyUSB0"));
/// let engine = Engine::new(transport, EngineConfig::default())?;
/// engine.connect().await?;
///
/// let sv = engine.read_register("SV").await?;
/// engine.apply_and_verify("P1", RegisterInput::Number(25.5)).await?;
/// ```
pub struct Engine<T: ModbusTransport> {
    channel: Mutex<T>,
    catalog: Arc<Catalog>,
    config: EngineConfig,
    bus: EventBus,
    busy: BusyTracker,
    state: watch::Sender<ConnectionState>,
    stats: EngineStats,
    // Set while an exchange is on the wire; still set afterwards if the
    // caller dropped it before it completed.
    abandoned: AtomicBool,
}

impl<T: ModbusTransport> Engine<T> {
    /// Creates an engine over `transport` with the built-in catalog.
    pub fn new(transport: T, config: EngineConfig) -> EngineResult<Self> {
        Self::with_catalog(transport, Arc::new(Catalog::generate()), config)
    }

    /// Creates an engine with a caller-supplied catalog.
    pub fn with_catalog(
        transport: T,
        catalog: Arc<Catalog>,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        config.validate()?;

        let initial = if transport.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        let bus = EventBus::new(config.event_capacity);
        let (state, _) = watch::channel(initial);

        tracing::debug!(
            transport = %transport.display_name(),
            registers = catalog.len(),
            "Engine created"
        );

        Ok(Self {
            channel: Mutex::new(transport),
            catalog,
            busy: BusyTracker::new(bus.clone()),
            bus,
            config,
            state,
            stats: EngineStats::new(),
            abandoned: AtomicBool::new(false),
        })
    }

    // =========================================================================
    // Connection
    // =========================================================================

    /// Opens the link.
    pub async fn connect(&self) -> EngineResult<()> {
        let mut transport = self.channel.lock().await;
        transport.connect().await?;
        self.abandoned.store(false, Ordering::Release);
        self.state.send_replace(ConnectionState::Connected);
        tracing::info!(transport = %transport.display_name(), "Engine connected");
        Ok(())
    }

    /// Closes the link.
    pub async fn disconnect(&self) -> EngineResult<()> {
        let mut transport = self.channel.lock().await;
        transport.disconnect().await?;
        self.state.send_replace(ConnectionState::Disconnected);
        tracing::info!(transport = %transport.display_name(), "Engine disconnected");
        Ok(())
    }

    // =========================================================================
    // Register operations
    // =========================================================================

    /// Reads a register and publishes the value.
    pub async fn read_register(&self, register: impl Into<RegisterRef>) -> EngineResult<Reading> {
        self.read(register.into(), true).await
    }

    /// Reads a register without publishing it.
    pub async fn read_register_suppressed(
        &self,
        register: impl Into<RegisterRef>,
    ) -> EngineResult<Reading> {
        self.read(register.into(), false).await
    }

    async fn read(&self, register: RegisterRef, notify: bool) -> EngineResult<Reading> {
        let _busy = self.busy.enter();
        let target = self.resolve(&register)?;
        let mut transport = self.channel.lock().await;
        self.read_locked(&mut transport, &target, notify).await
    }

    /// Writes a register.
    ///
    /// The input is checked against the register's domain before anything
    /// is sent. The live scale is then read back from the device (without
    /// publishing) and the value is encoded against it.
    pub async fn write_register(
        &self,
        symbol: &str,
        input: impl Into<RegisterInput>,
    ) -> EngineResult<()> {
        let _busy = self.busy.enter();
        let (descriptor, validated) = self.prepare_write(symbol, &input.into())?;
        let mut transport = self.channel.lock().await;
        self.write_locked(&mut transport, descriptor, validated).await
    }

    /// Writes a register, then reads it back and publishes the result.
    ///
    /// The device may clamp or silently refuse a value; the returned reading
    /// is what it actually holds.
    pub async fn apply_and_verify(
        &self,
        symbol: &str,
        input: impl Into<RegisterInput>,
    ) -> EngineResult<Reading> {
        let _busy = self.busy.enter();
        let (descriptor, validated) = self.prepare_write(symbol, &input.into())?;
        let mut transport = self.channel.lock().await;
        self.write_locked(&mut transport, descriptor, validated).await?;
        self.read_locked(&mut transport, &Target::from(descriptor), true)
            .await
    }

    /// Reads the eight status coils in one exchange and publishes them.
    pub async fn read_flags(&self) -> EngineResult<FlagSet> {
        let _busy = self.busy.enter();
        let mut transport = self.channel.lock().await;
        self.flags_locked(&mut transport).await
    }

    /// Switches a control coil.
    pub async fn set_coil(&self, coil: Coil, on: bool) -> EngineResult<()> {
        let _busy = self.busy.enter();
        let mut transport = self.channel.lock().await;
        let request = Request::WriteCoil {
            address: coil.address(),
            value: on,
        };
        self.exchange(&mut transport, request, self.config.register_deadline)
            .await?;
        tracing::debug!(coil = %coil, on, "Coil written");
        self.settle().await;
        Ok(())
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Subscribes to change and busy events.
    pub fn subscribe(&self) -> EventSubscriber {
        self.bus.subscribe()
    }

    /// Returns the number of top-level operations in flight.
    pub fn busy_count(&self) -> usize {
        self.busy.count()
    }

    /// Returns the current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watches connection state changes.
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Returns transaction statistics.
    pub fn stats(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns event bus statistics.
    pub fn bus_stats(&self) -> BusStats {
        self.bus.stats()
    }

    /// Returns the register catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Crate-internal building blocks
    // =========================================================================

    pub(crate) fn enter_busy(&self) -> BusyGuard {
        self.busy.enter()
    }

    pub(crate) async fn lock_channel(&self) -> MutexGuard<'_, T> {
        self.channel.lock().await
    }

    /// Maps a register reference to an address and domain.
    ///
    /// A raw address with a catalog entry reads as that entry; any other
    /// address reads as an unbounded number keyed by its hex address.
    pub(crate) fn resolve(&self, register: &RegisterRef) -> EngineResult<Target> {
        match register {
            RegisterRef::Symbol(symbol) => Ok(Target::from(self.catalog.lookup(symbol)?)),
            RegisterRef::Address(address) => Ok(match self.catalog.by_address(*address) {
                Some(descriptor) => Target::from(descriptor),
                None => Target {
                    key: EventKey::Address(*address),
                    address: *address,
                    domain: Domain::Range(Range::UNBOUNDED),
                },
            }),
        }
    }

    pub(crate) fn prepare_write(
        &self,
        symbol: &str,
        input: &RegisterInput,
    ) -> EngineResult<(&RegisterDescriptor, Validated)> {
        let descriptor = self.catalog.lookup(symbol)?;
        let validated = codec::validate(&descriptor.domain, input)
            .map_err(|reason| EngineError::invalid_argument(symbol, reason))?;
        Ok((descriptor, validated))
    }

    pub(crate) async fn read_locked(
        &self,
        transport: &mut T,
        target: &Target,
        notify: bool,
    ) -> EngineResult<Reading> {
        let request = Request::ReadPair {
            address: target.address,
        };
        let words = self
            .exchange(transport, request, self.config.register_deadline)
            .await?
            .into_pair()?;

        let reading = codec::decode(&target.domain, words);
        tracing::debug!(
            key = %target.key,
            raw = ?words,
            value = %reading.value,
            scale = reading.scale,
            "Register read"
        );
        if reading.value.is_unknown() {
            tracing::debug!(key = %target.key, raw = ?words, "Value matches nothing in the domain");
        }
        if notify {
            self.bus
                .publish_change(target.key.clone(), reading.value.clone(), reading.scale);
        }

        self.settle().await;
        Ok(reading)
    }

    pub(crate) async fn write_locked(
        &self,
        transport: &mut T,
        descriptor: &RegisterDescriptor,
        validated: Validated,
    ) -> EngineResult<()> {
        let current = self
            .read_locked(transport, &Target::from(descriptor), false)
            .await?;
        let words = codec::encode(validated, current.scale)
            .map_err(|reason| EngineError::invalid_argument(&descriptor.symbol, reason))?;

        let request = Request::WritePair {
            address: descriptor.address,
            words,
        };
        self.exchange(transport, request, self.config.register_deadline)
            .await?;
        tracing::debug!(
            register = %descriptor.symbol,
            raw = ?words,
            scale = current.scale,
            "Register written"
        );

        self.settle().await;
        Ok(())
    }

    pub(crate) async fn flags_locked(&self, transport: &mut T) -> EngineResult<FlagSet> {
        let request = Request::ReadCoils {
            address: FLAG_ADDRESS,
            count: FLAG_COUNT,
        };
        let bits = self
            .exchange(transport, request, self.config.flags_deadline)
            .await?
            .into_bits(FLAG_COUNT)?;

        let flags = FlagSet::from_bits(&bits);
        tracing::debug!(flags = %flags, "Status flags read");
        self.bus
            .publish_change(EventKey::Flags, Value::Flags(flags), 1.0);

        self.settle().await;
        Ok(flags)
    }

    // =========================================================================
    // Exchange and recovery
    // =========================================================================

    /// Runs one raw exchange under `deadline`.
    ///
    /// A deadline expiry runs the recovery pass before the timeout is
    /// returned. An exchange whose caller went away mid-flight is recovered
    /// at the start of the next one. Other transport failures are returned
    /// as they are.
    async fn exchange(
        &self,
        transport: &mut T,
        request: Request,
        deadline: Duration,
    ) -> EngineResult<Response> {
        let operation = request.name();
        if self.abandoned.load(Ordering::Acquire) {
            self.recover(transport, "previous exchange abandoned").await;
        }

        let started = Instant::now();
        tracing::trace!(operation, ?request, "Exchange started");

        self.abandoned.store(true, Ordering::Release);
        let shared: &T = &*transport;
        let result = with_deadline(operation, deadline, async move {
            request.send(shared).await.map_err(EngineError::from)
        })
        .await
        .and_then(|response| response.check(&request));

        match &result {
            Ok(_) => {
                let latency = started.elapsed();
                self.stats.record_success(latency);
                tracing::trace!(operation, latency_us = latency.as_micros() as u64, "Exchange complete");
            }
            Err(EngineError::Timeout(_)) => {
                self.stats.record_timeout();
                self.recover(transport, "transaction timed out").await;
            }
            Err(EngineError::Transport(e)) => {
                self.stats.record_failure();
                e.log(operation);
            }
            Err(_) => self.stats.record_failure(),
        }
        if !matches!(result, Err(EngineError::Timeout(_))) {
            self.abandoned.store(false, Ordering::Release);
        }

        result
    }

    /// Drops the abandoned exchange and reopens the link.
    ///
    /// The pending flag is cleared only once the pass has finished, so a
    /// recovery that is itself cut short runs again next time.
    async fn recover(&self, transport: &mut T, reason: &str) {
        self.stats.record_recovery();
        self.state.send_replace(ConnectionState::Recovering);
        tracing::warn!(transport = %transport.display_name(), reason, "Recovering link");

        if let Err(e) = transport.connection_lost(reason).await {
            e.log("connection_lost");
        }

        match transport.connection_made().await {
            Ok(()) => {
                self.state.send_replace(ConnectionState::Connected);
                tracing::info!(transport = %transport.display_name(), "Link re-established");
            }
            Err(e) => {
                e.log("connection_made");
                self.state.send_replace(ConnectionState::Disconnected);
            }
        }
        self.abandoned.store(false, Ordering::Release);
    }

    async fn settle(&self) {
        if !self.config.settle_delay.is_zero() {
            tokio::time::sleep(self.config.settle_delay).await;
        }
    }
}

impl<T: ModbusTransport> fmt::Debug for Engine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("registers", &self.catalog.len())
            .field("state", &self.connection_state())
            .field("busy", &self.busy_count())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coil_parse() {
        assert_eq!("nat".parse::<Coil>(), Ok(Coil::Nat));
        assert_eq!("AM".parse::<Coil>(), Ok(Coil::AutoManual));
        assert_eq!("A/M".parse::<Coil>(), Ok(Coil::AutoManual));
        assert!("x".parse::<Coil>().is_err());
        assert_eq!(Coil::AutoManual.address(), 1);
        assert_eq!(Coil::Nat.to_string(), "NAT");
    }

    #[test]
    fn test_response_shapes() {
        assert_eq!(Response::Words(vec![1, 2]).into_pair().unwrap(), [1, 2]);
        assert!(Response::Words(vec![1]).into_pair().is_err());
        assert!(Response::Done.into_pair().is_err());
        assert_eq!(Response::Bits(vec![true; 8]).into_bits(8).unwrap().len(), 8);
        assert!(Response::Bits(vec![true; 3]).into_bits(8).is_err());

        let coils = Request::ReadCoils {
            address: 0,
            count: 8,
        };
        assert!(Response::Bits(vec![false; 8]).check(&coils).is_ok());
        assert!(Response::Bits(vec![false; 7]).check(&coils).is_err());
        assert!(Response::Words(vec![1, 2]).check(&coils).is_err());
        let write = Request::WriteCoil {
            address: 6,
            value: true,
        };
        assert!(Response::Done.check(&write).is_ok());
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Recovering.to_string(), "recovering");
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }
}

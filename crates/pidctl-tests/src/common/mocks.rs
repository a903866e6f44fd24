// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Transport
//!
//! A scriptable controller behind the [`ModbusTransport`] seam.
//!
//! - Holds a register map of raw word pairs and eight coils
//! - Records every exchange for verification
//! - Injects hangs (never answers) and device failures
//! - Tracks how many exchanges are in flight at once
//!
//! Clones share state, so a test keeps one handle while the engine owns
//! the other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use pidctl_modbus::{ModbusError, ModbusResult, ModbusTransport, TransportState};

/// Modbus exception code the mock answers injected failures with.
pub const SLAVE_DEVICE_FAILURE: u8 = 0x04;

// =============================================================================
// Recorded exchanges
// =============================================================================

/// One request the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    /// FC 03.
    ReadRegisters {
        /// Start address.
        address: u16,
        /// Register count.
        count: u16,
    },
    /// FC 01.
    ReadCoils {
        /// Start address.
        address: u16,
        /// Coil count.
        count: u16,
    },
    /// FC 16.
    WriteRegisters {
        /// Start address.
        address: u16,
        /// Words written.
        values: Vec<u16>,
    },
    /// FC 05.
    WriteCoil {
        /// Coil address.
        address: u16,
        /// New state.
        value: bool,
    },
}

impl Exchange {
    /// Returns `true` for register or coil writes.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::WriteRegisters { .. } | Self::WriteCoil { .. })
    }

    /// Returns the holding register address, for register exchanges.
    pub fn register_address(&self) -> Option<u16> {
        match self {
            Self::ReadRegisters { address, .. } | Self::WriteRegisters { address, .. } => {
                Some(*address)
            }
            Self::ReadCoils { .. } | Self::WriteCoil { .. } => None,
        }
    }
}

// =============================================================================
// MockTransport
// =============================================================================

#[derive(Debug, Default)]
struct MockState {
    registers: HashMap<u16, [u16; 2]>,
    coils: [bool; 8],
    connected: bool,

    latency: Duration,
    hang_next: usize,
    hang_all: bool,
    fail_next: usize,
    fail_address: Option<u16>,
    fail_connect: bool,
    short_next: usize,

    log: Vec<Exchange>,
    started: Vec<Instant>,
    in_flight: usize,
    max_in_flight: usize,
    connects: usize,
    disconnects: usize,
    lost: usize,
    made: usize,
}

impl MockState {
    fn take_short(&mut self) -> bool {
        let short = self.short_next > 0;
        self.short_next = self.short_next.saturating_sub(1);
        short
    }
}

/// Scriptable controller.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Creates a mock with an empty register map. Unset registers read as
    /// `[0, 0]`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the raw pair held at `address`.
    pub fn set_register(&self, address: u16, words: [u16; 2]) {
        self.state.lock().registers.insert(address, words);
    }

    /// Sets several raw pairs.
    pub fn with_registers(self, registers: impl IntoIterator<Item = (u16, [u16; 2])>) -> Self {
        self.state.lock().registers.extend(registers);
        self
    }

    /// Returns the raw pair held at `address`.
    pub fn register(&self, address: u16) -> [u16; 2] {
        self.state
            .lock()
            .registers
            .get(&address)
            .copied()
            .unwrap_or([0, 0])
    }

    /// Sets coil `address`.
    pub fn set_coil(&self, address: u16, value: bool) {
        self.state.lock().coils[usize::from(address)] = value;
    }

    /// Returns coil `address`.
    pub fn coil(&self, address: u16) -> bool {
        self.state.lock().coils[usize::from(address)]
    }

    /// Delays every answer by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Leaves the next `count` exchanges unanswered.
    pub fn hang_next(&self, count: usize) {
        self.state.lock().hang_next = count;
    }

    /// Leaves every exchange unanswered while set.
    pub fn hang_all(&self, hang: bool) {
        self.state.lock().hang_all = hang;
    }

    /// Answers the next `count` exchanges with a device failure.
    pub fn fail_next(&self, count: usize) {
        self.state.lock().fail_next = count;
    }

    /// Answers every exchange touching register `address` with a device
    /// failure.
    pub fn fail_address(&self, address: u16) {
        self.state.lock().fail_address = Some(address);
    }

    /// Answers the next `count` reads with one item fewer than asked for.
    pub fn short_next(&self, count: usize) {
        self.state.lock().short_next = count;
    }

    /// Makes `connect` and `connection_made` fail while set.
    pub fn fail_connect(&self, fail: bool) {
        self.state.lock().fail_connect = fail;
    }

    /// Returns every exchange received so far.
    pub fn exchanges(&self) -> Vec<Exchange> {
        self.state.lock().log.clone()
    }

    /// Returns the writes received so far.
    pub fn writes(&self) -> Vec<Exchange> {
        self.exchanges().into_iter().filter(Exchange::is_write).collect()
    }

    /// Returns when each logged exchange reached the mock.
    pub fn exchange_times(&self) -> Vec<Instant> {
        self.state.lock().started.clone()
    }

    /// Forgets the exchange log.
    pub fn clear_log(&self) {
        let mut state = self.state.lock();
        state.log.clear();
        state.started.clear();
    }

    /// Returns the highest number of exchanges ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.state.lock().max_in_flight
    }

    /// Returns how often `connect` was called.
    pub fn connect_count(&self) -> usize {
        self.state.lock().connects
    }

    /// Returns how often `disconnect` was called.
    pub fn disconnect_count(&self) -> usize {
        self.state.lock().disconnects
    }

    /// Returns how often the link was dropped after a timeout.
    pub fn lost_count(&self) -> usize {
        self.state.lock().lost
    }

    /// Returns how often the link was re-established after a timeout.
    pub fn made_count(&self) -> usize {
        self.state.lock().made
    }

    /// Records `exchange` and decides how it ends.
    async fn begin(&self, exchange: Exchange) -> ModbusResult<InFlight> {
        let (latency, hang, fail) = {
            let mut state = self.state.lock();
            if !state.connected {
                return Err(ModbusError::not_connected());
            }
            let poisoned =
                state.fail_address.is_some() && exchange.register_address() == state.fail_address;
            state.log.push(exchange);
            state.started.push(Instant::now());
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);

            let hang = state.hang_all || state.hang_next > 0;
            state.hang_next = state.hang_next.saturating_sub(1);
            let fail = !hang && (poisoned || state.fail_next > 0);
            if fail && !poisoned {
                state.fail_next -= 1;
            }
            (state.latency, hang, fail)
        };
        let guard = InFlight {
            state: self.state.clone(),
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if hang {
            std::future::pending::<()>().await;
        }
        if fail {
            return Err(ModbusError::exception(0x03, SLAVE_DEVICE_FAILURE));
        }
        Ok(guard)
    }
}

/// Counts an exchange as in flight until dropped, including when the
/// caller abandons it.
struct InFlight {
    state: Arc<Mutex<MockState>>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.state.lock().in_flight -= 1;
    }
}

#[async_trait]
impl ModbusTransport for MockTransport {
    async fn connect(&mut self) -> ModbusResult<()> {
        let mut state = self.state.lock();
        state.connects += 1;
        if state.fail_connect {
            return Err(ModbusError::not_connected());
        }
        state.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> ModbusResult<()> {
        let mut state = self.state.lock();
        state.disconnects += 1;
        state.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn state(&self) -> TransportState {
        if self.is_connected() {
            TransportState::Connected
        } else {
            TransportState::Disconnected
        }
    }

    async fn connection_lost(&mut self, _reason: &str) -> ModbusResult<()> {
        let mut state = self.state.lock();
        state.lost += 1;
        state.connected = false;
        Ok(())
    }

    async fn connection_made(&mut self) -> ModbusResult<()> {
        let mut state = self.state.lock();
        state.made += 1;
        if state.fail_connect {
            return Err(ModbusError::not_connected());
        }
        state.connected = true;
        Ok(())
    }

    async fn read_coils(&self, address: u16, count: u16) -> ModbusResult<Vec<bool>> {
        let _guard = self.begin(Exchange::ReadCoils { address, count }).await?;
        let mut state = self.state.lock();
        let mut bits: Vec<bool> = (address..address + count)
            .map(|a| state.coils.get(usize::from(a)).copied().unwrap_or(false))
            .collect();
        if state.take_short() {
            bits.pop();
        }
        Ok(bits)
    }

    async fn read_holding_registers(&self, address: u16, count: u16) -> ModbusResult<Vec<u16>> {
        let _guard = self
            .begin(Exchange::ReadRegisters { address, count })
            .await?;
        let mut state = self.state.lock();
        let mut words = Vec::with_capacity(usize::from(count));
        let mut a = address;
        while words.len() < usize::from(count) {
            let pair = state.registers.get(&a).copied().unwrap_or([0, 0]);
            words.extend_from_slice(&pair);
            a = a.wrapping_add(1);
        }
        words.truncate(usize::from(count));
        if state.take_short() {
            words.pop();
        }
        Ok(words)
    }

    async fn write_single_coil(&self, address: u16, value: bool) -> ModbusResult<()> {
        let _guard = self.begin(Exchange::WriteCoil { address, value }).await?;
        if let Some(coil) = self.state.lock().coils.get_mut(usize::from(address)) {
            *coil = value;
        }
        Ok(())
    }

    /// The controller keeps its own decimals: only the value word of a
    /// pair is taken from the request.
    async fn write_multiple_registers(&self, address: u16, values: &[u16]) -> ModbusResult<()> {
        let _guard = self
            .begin(Exchange::WriteRegisters {
                address,
                values: values.to_vec(),
            })
            .await?;
        let mut state = self.state.lock();
        if let Some(&value) = values.first() {
            let entry = state.registers.entry(address).or_insert([0, 0]);
            entry[0] = value;
        }
        Ok(())
    }

    fn unit_id(&self) -> u8 {
        5
    }

    fn display_name(&self) -> String {
        "mock@unit5".to_string()
    }
}

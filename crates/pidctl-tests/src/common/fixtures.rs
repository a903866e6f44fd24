// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! A controller in a known state, and engines wired to it.

use std::time::Duration;

use pidctl_core::{Engine, EngineConfig};

use super::mocks::MockTransport;

// =============================================================================
// Register addresses
// =============================================================================

/// Addresses used by the fixtures.
pub struct Addr;

impl Addr {
    /// `SV`
    pub const SV: u16 = 0x0000;
    /// `At`
    pub const AT: u16 = 0x0003;
    /// `PV`
    pub const PV: u16 = 0x0164;
    /// `dSV`
    pub const DSV: u16 = 0x0168;
    /// `OUT`
    pub const OUT: u16 = 0x016C;
    /// `Pr+t`
    pub const PR_T: u16 = 0x0190;
    /// `AL1y`
    pub const AL1Y: u16 = 0x1000;
    /// `P`
    pub const P: u16 = 0x1004;
    /// `I`
    pub const I: u16 = 0x1005;
    /// `d`
    pub const D: u16 = 0x1006;
    /// `Psb`
    pub const PSB: u16 = 0x100E;
    /// `ModL`
    pub const MODL: u16 = 0x200D;
    /// `bAud`
    pub const BAUD: u16 = 0x2012;
    /// `P1`
    pub const P1: u16 = 0x3000;
    /// `t-01`
    pub const T01: u16 = 0x4001;

    /// First register of PID slot `slot`.
    pub const fn pid_slot(slot: u16) -> u16 {
        Self::P1 + 3 * (slot - 1)
    }
}

/// NAT coil.
pub const NAT_COIL: u16 = 0;

// =============================================================================
// Controller fixtures
// =============================================================================

/// A controller in a known state.
pub struct ControllerFixtures;

impl ControllerFixtures {
    /// Raw register contents of an idle controller.
    ///
    /// - `SV` 50, `PV` 21.5, `dSV` 50.0, `OUT` 30.0
    /// - working PID 20.0 / 100 / 20
    /// - slot 1 holds the same PID, slot 3 holds 35.5 / 240 / 60
    /// - program at step 1, 1315 units elapsed
    pub fn registers() -> Vec<(u16, [u16; 2])> {
        vec![
            (Addr::SV, [50, 0]),
            (Addr::AT, [0, 0]),
            (Addr::PV, [215, 1]),
            (Addr::DSV, [500, 1]),
            (Addr::OUT, [300, 1]),
            (Addr::PR_T, [0x0105, 0x2300]),
            (Addr::AL1Y, [1, 0]),
            (Addr::P, [200, 1]),
            (Addr::I, [100, 0]),
            (Addr::D, [20, 0]),
            (Addr::PSB, [0, 1]),
            (Addr::MODL, [1, 0]),
            (Addr::BAUD, [3, 0]),
            (Addr::pid_slot(1), [200, 1]),
            (Addr::pid_slot(1) + 1, [100, 0]),
            (Addr::pid_slot(1) + 2, [20, 0]),
            (Addr::pid_slot(3), [355, 1]),
            (Addr::pid_slot(3) + 1, [240, 0]),
            (Addr::pid_slot(3) + 2, [60, 0]),
            (Addr::T01, [0, 0]),
        ]
    }

    /// A disconnected mock loaded with [`registers`](Self::registers).
    pub fn controller() -> MockTransport {
        MockTransport::new().with_registers(Self::registers())
    }
}

// =============================================================================
// Engine fixtures
// =============================================================================

/// Engine configurations and connected engines.
pub struct EngineFixtures;

impl EngineFixtures {
    /// The production defaults.
    pub fn config() -> EngineConfig {
        EngineConfig::default()
    }

    /// Short deadlines for tests that do not pause time.
    pub fn fast_config() -> EngineConfig {
        EngineConfig {
            register_deadline: Duration::from_millis(50),
            flags_deadline: Duration::from_millis(100),
            settle_delay: Duration::from_millis(1),
            ..EngineConfig::default()
        }
    }

    /// A connected engine over `transport`.
    pub async fn connected(transport: MockTransport) -> Engine<MockTransport> {
        Self::connected_with(transport, Self::config()).await
    }

    /// A connected engine over `transport` with `config`.
    pub async fn connected_with(
        transport: MockTransport,
        config: EngineConfig,
    ) -> Engine<MockTransport> {
        let engine = Engine::new(transport, config).expect("valid engine config");
        engine.connect().await.expect("mock connects");
        engine
    }
}

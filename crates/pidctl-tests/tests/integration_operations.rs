// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Operation Integration Tests
//!
//! Multi-exchange operations built on the engine:
//!
//! - `test_group_*`: panel refreshes
//! - `test_pid_*`: PID slot store and load
//! - `test_coil_*`: control coils
//! - `test_autotune_*`: auto-tune sessions

use std::time::Duration;

use tokio::sync::mpsc;

use pidctl_core::{
    AutoTuneOptions, Coil, CodecError, EngineError, EngineEvent, GroupMember, RegisterGroup,
    Value,
};
use pidctl_tests::common::{Addr, ControllerFixtures, EngineFixtures, Exchange, NAT_COIL};

// =============================================================================
// Groups
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_group_status_refresh() {
    let mock = ControllerFixtures::controller();
    mock.set_coil(7, true);
    let engine = EngineFixtures::connected(mock.clone()).await;
    let mut events = engine.subscribe();

    let readings = engine.refresh_group(RegisterGroup::Status).await.unwrap();

    let members: Vec<String> = readings.iter().map(|(m, _)| m.to_string()).collect();
    assert_eq!(members, vec!["PV", "dSV", "OUT", "Pr+t", "flags"]);
    assert_eq!(readings[0].1.value, Value::Number(21.5));
    assert_eq!(readings[2].1.value, Value::Number(30.0));
    assert_eq!(readings[4].0, GroupMember::Flags);
    match &readings[4].1.value {
        Value::Flags(flags) => assert_eq!(flags.get("AT"), Some(true)),
        other => panic!("Expected flags, got {other:?}"),
    }

    assert_eq!(mock.exchanges().len(), 5);
    assert_eq!(
        mock.exchanges()[4],
        Exchange::ReadCoils {
            address: 0,
            count: 8
        }
    );

    let drained = events.drain();
    let keys: Vec<String> = drained
        .iter()
        .filter_map(EngineEvent::as_change)
        .map(|c| c.key.to_string())
        .collect();
    assert_eq!(keys, members);
    let started = drained
        .iter()
        .filter(|e| **e == EngineEvent::OperationsStarted)
        .count();
    assert_eq!(started, 1);
}

#[tokio::test(start_paused = true)]
async fn test_group_stops_at_first_failure() {
    let mock = ControllerFixtures::controller();
    mock.fail_address(Addr::DSV);
    let engine = EngineFixtures::connected(mock.clone()).await;

    let err = engine.refresh_group(RegisterGroup::Status).await.unwrap_err();

    assert!(matches!(err, EngineError::Transport(_)));
    assert_eq!(mock.exchanges().len(), 2);
    assert_eq!(engine.busy_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_group_program_covers_every_step() {
    let mock = ControllerFixtures::controller();
    let engine = EngineFixtures::connected(mock.clone()).await;

    let readings = engine.refresh_group(RegisterGroup::Program).await.unwrap();

    assert_eq!(readings.len(), 192);
    assert_eq!(readings[1].0, GroupMember::Register("t-01".into()));
    assert_eq!(readings[1].1.value, Value::Label("Pause".into()));
    assert_eq!(mock.max_in_flight(), 1);
}

// =============================================================================
// PID slots
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_pid_load_slot() {
    let mock = ControllerFixtures::controller();
    let engine = EngineFixtures::connected(mock.clone()).await;

    let copied = engine.load_pid_slot(3).await.unwrap();

    let summary: Vec<(String, Value)> = copied
        .into_iter()
        .map(|(symbol, reading)| (symbol, reading.value))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("P".to_string(), Value::Number(35.5)),
            ("I".to_string(), Value::Number(240.0)),
            ("d".to_string(), Value::Number(60.0)),
        ]
    );
    assert_eq!(
        mock.writes(),
        vec![
            Exchange::WriteRegisters {
                address: Addr::P,
                values: vec![355, 0]
            },
            Exchange::WriteRegisters {
                address: Addr::I,
                values: vec![240, 0]
            },
            Exchange::WriteRegisters {
                address: Addr::D,
                values: vec![60, 0]
            },
        ]
    );
    // Each parameter: source read, destination read, write, read-back.
    assert_eq!(mock.exchanges().len(), 12);
}

#[tokio::test(start_paused = true)]
async fn test_pid_store_slot() {
    let mock = ControllerFixtures::controller();
    let engine = EngineFixtures::connected(mock.clone()).await;
    let mut events = engine.subscribe();

    let copied = engine.store_pid_slot(3).await.unwrap();

    assert_eq!(copied[0].0, "P3");
    assert_eq!(copied[0].1.value, Value::Number(20.0));
    assert_eq!(mock.register(Addr::pid_slot(3)), [200, 1]);
    assert_eq!(mock.register(Addr::pid_slot(3) + 1), [100, 0]);
    assert_eq!(mock.register(Addr::pid_slot(3) + 2), [20, 0]);

    let keys: Vec<String> = events
        .drain()
        .iter()
        .filter_map(EngineEvent::as_change)
        .map(|c| c.key.to_string())
        .collect();
    assert_eq!(keys, vec!["P", "P3", "I", "I3", "d", "d3"]);
}

#[tokio::test(start_paused = true)]
async fn test_pid_slot_out_of_range() {
    let mock = ControllerFixtures::controller();
    let engine = EngineFixtures::connected(mock.clone()).await;

    for slot in [0, 10] {
        let err = engine.load_pid_slot(slot).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument { .. }));
    }
    assert!(mock.exchanges().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_pid_unknown_source_is_not_copied() {
    let mock = ControllerFixtures::controller();
    // 500.0 is outside the proportional band range.
    mock.set_register(Addr::P, [5000, 1]);
    let engine = EngineFixtures::connected(mock.clone()).await;

    let err = engine.store_pid_slot(2).await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::InvalidArgument {
            reason: CodecError::UnknownValue(_),
            ..
        }
    ));
    assert!(mock.writes().is_empty());
}

// =============================================================================
// Coils
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_coil_switching() {
    let mock = ControllerFixtures::controller();
    let engine = EngineFixtures::connected(mock.clone()).await;

    engine.set_coil(Coil::AutoManual, true).await.unwrap();
    engine.set_coil(Coil::Nat, true).await.unwrap();
    engine.set_coil(Coil::Nat, false).await.unwrap();

    assert_eq!(
        mock.writes(),
        vec![
            Exchange::WriteCoil {
                address: 1,
                value: true
            },
            Exchange::WriteCoil {
                address: NAT_COIL,
                value: true
            },
            Exchange::WriteCoil {
                address: NAT_COIL,
                value: false
            },
        ]
    );
    assert!(mock.coil(1));
    assert!(!mock.coil(NAT_COIL));
}

// =============================================================================
// Auto-tune
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_autotune_sequence() {
    let mock = ControllerFixtures::controller();
    let engine = EngineFixtures::connected(mock.clone()).await;
    let (tx, mut rx) = mpsc::channel(8);

    let report = engine
        .auto_tune(
            AutoTuneOptions::default(),
            std::future::ready(()),
            Some(tx),
        )
        .await
        .unwrap();

    assert_eq!(report.samples, 1);
    let sample = rx.recv().await.unwrap();
    assert_eq!(sample.pv, Some(21.5));
    assert_eq!(sample.dsv, Some(50.0));
    assert_eq!(sample.out, Some(30.0));
    assert_eq!(report.last, Some(sample));

    assert_eq!(
        mock.writes(),
        vec![
            Exchange::WriteCoil {
                address: NAT_COIL,
                value: false
            },
            Exchange::WriteRegisters {
                address: Addr::MODL,
                values: vec![0, 0]
            },
            Exchange::WriteRegisters {
                address: Addr::AT,
                values: vec![1, 0]
            },
            Exchange::WriteCoil {
                address: NAT_COIL,
                value: false
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_autotune_runs_until_stopped() {
    let mock = ControllerFixtures::controller();
    let engine = EngineFixtures::connected(mock.clone()).await;
    let mut events = engine.subscribe();

    let stop = tokio::time::sleep(Duration::from_millis(2500));
    let report = engine
        .auto_tune(AutoTuneOptions::default(), stop, None)
        .await
        .unwrap();

    assert_eq!(report.samples, 3);
    assert!(report.duration >= Duration::from_secs(2));
    assert_eq!(engine.busy_count(), 0);

    let drained = events.drain();
    let started = drained
        .iter()
        .filter(|e| **e == EngineEvent::OperationsStarted)
        .count();
    assert_eq!(started, 1, "one busy period for the whole session");
    assert_eq!(drained.last(), Some(&EngineEvent::OperationsIdle));
}

#[tokio::test(start_paused = true)]
async fn test_autotune_survives_dropped_receiver() {
    let engine = EngineFixtures::connected(ControllerFixtures::controller()).await;
    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    let report = engine
        .auto_tune(
            AutoTuneOptions {
                interval: Duration::from_millis(500),
            },
            tokio::time::sleep(Duration::from_millis(1200)),
            Some(tx),
        )
        .await
        .unwrap();

    assert_eq!(report.samples, 3);
}

#[tokio::test(start_paused = true)]
async fn test_autotune_failure_still_clears_nat() {
    let mock = ControllerFixtures::controller();
    mock.fail_address(Addr::MODL);
    let engine = EngineFixtures::connected(mock.clone()).await;

    let err = engine
        .auto_tune(AutoTuneOptions::default(), std::future::pending::<()>(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Transport(_)));
    assert_eq!(
        mock.writes(),
        vec![
            Exchange::WriteCoil {
                address: NAT_COIL,
                value: false
            },
            Exchange::WriteCoil {
                address: NAT_COIL,
                value: false
            },
        ]
    );
    assert_eq!(engine.busy_count(), 0);
}

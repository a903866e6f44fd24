// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # CLI Integration Tests
//!
//! Operator commands run against a mock controller, with output captured
//! in memory.

use std::time::Duration;

use pidctl_bin::cli::{
    CoilArgs, CoilState, DumpArgs, IntervalArgs, PidAction, PidArgs, ReadArgs, WriteArgs,
};
use pidctl_bin::{
    commands, BinError, Commands, OutputFormat, Printer, Session, Settings, ShutdownCoordinator,
};
use pidctl_core::{Coil, ConnectionState, RegisterGroup};
use pidctl_tests::common::{Addr, ControllerFixtures, Exchange, MockTransport, NAT_COIL};

// =============================================================================
// Helpers
// =============================================================================

async fn open(mock: MockTransport, shutdown: ShutdownCoordinator) -> Session<MockTransport> {
    Session::with_transport(mock, &Settings::default(), shutdown)
        .await
        .expect("session should open")
}

async fn run_command(
    session: &Session<MockTransport>,
    command: Commands,
    format: OutputFormat,
) -> Result<String, BinError> {
    let mut printer = Printer::new(format, Vec::new());
    commands::run(session, &command, &mut printer).await?;
    Ok(String::from_utf8(printer.into_inner()).expect("output is UTF-8"))
}

async fn run_text(session: &Session<MockTransport>, command: Commands) -> String {
    run_command(session, command, OutputFormat::Text)
        .await
        .expect("command should succeed")
}

// =============================================================================
// One-shot commands
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_cli_read() {
    let session = open(ControllerFixtures::controller(), ShutdownCoordinator::new()).await;

    let text = run_text(
        &session,
        Commands::Read(ReadArgs {
            register: "SV".into(),
        }),
    )
    .await;
    assert_eq!(text, "SV       50\n");

    let text = run_text(
        &session,
        Commands::Read(ReadArgs {
            register: "PV".into(),
        }),
    )
    .await;
    assert_eq!(text, "PV       21.5\n");
}

#[tokio::test(start_paused = true)]
async fn test_cli_read_unknown_register() {
    let session = open(ControllerFixtures::controller(), ShutdownCoordinator::new()).await;

    let err = run_command(
        &session,
        Commands::Read(ReadArgs {
            register: "XYZ".into(),
        }),
        OutputFormat::Text,
    )
    .await
    .unwrap_err();

    assert_eq!(err.exit_code(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_cli_write_prints_device_value() {
    let mock = ControllerFixtures::controller();
    let session = open(mock.clone(), ShutdownCoordinator::new()).await;

    let text = run_text(
        &session,
        Commands::Write(WriteArgs {
            register: "t-01".into(),
            value: "Jump:-5".into(),
        }),
    )
    .await;

    assert_eq!(text, "t-01     Jump:-5\n");
    assert_eq!(mock.register(Addr::T01), [0xfffb, 0]);
}

#[tokio::test(start_paused = true)]
async fn test_cli_write_rejected_value() {
    let mock = ControllerFixtures::controller();
    let session = open(mock.clone(), ShutdownCoordinator::new()).await;

    let err = run_command(
        &session,
        Commands::Write(WriteArgs {
            register: "At".into(),
            value: "Maybe".into(),
        }),
        OutputFormat::Text,
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("At"));
    assert!(mock.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cli_flags() {
    let mock = ControllerFixtures::controller();
    mock.set_coil(1, true);
    let session = open(mock, ShutdownCoordinator::new()).await;

    let text = run_text(&session, Commands::Flags).await;

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 8);
    assert!(lines[0].starts_with("SV       off"));
    assert!(lines[1].starts_with("A/M      on"));
}

#[tokio::test(start_paused = true)]
async fn test_cli_dump_group() {
    let session = open(ControllerFixtures::controller(), ShutdownCoordinator::new()).await;

    let text = run_text(
        &session,
        Commands::Dump(DumpArgs {
            group: RegisterGroup::Status,
        }),
    )
    .await;

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "# status");
    assert_eq!(lines[1], "PV       21.5");
    assert_eq!(lines[2], "dSV      50.0");
    assert!(lines[5].starts_with("flags"));
}

#[tokio::test(start_paused = true)]
async fn test_cli_pid_load_json() {
    let mock = ControllerFixtures::controller();
    let session = open(mock.clone(), ShutdownCoordinator::new()).await;

    let text = run_command(
        &session,
        Commands::Pid(PidArgs {
            action: PidAction::Load { slot: 3 },
        }),
        OutputFormat::Json,
    )
    .await
    .unwrap();

    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["title"], "slot 3 loaded into working PID");
    let values = json["values"].as_array().unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[0]["register"], "P");
    assert_eq!(values[0]["display"], "35.5");
    assert_eq!(values[1]["value"]["value"], 240.0);
    assert_eq!(mock.register(Addr::D), [60, 0]);
}

#[tokio::test(start_paused = true)]
async fn test_cli_coil() {
    let mock = ControllerFixtures::controller();
    let session = open(mock.clone(), ShutdownCoordinator::new()).await;

    let text = run_text(
        &session,
        Commands::Coil(CoilArgs {
            coil: Coil::Nat,
            state: CoilState::On,
        }),
    )
    .await;

    assert_eq!(text, "NAT on\n");
    assert_eq!(
        mock.writes(),
        vec![Exchange::WriteCoil {
            address: NAT_COIL,
            value: true
        }]
    );
}

// =============================================================================
// Interruption and streaming
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_cli_interrupted_read() {
    let mock = ControllerFixtures::controller();
    mock.hang_all(true);
    let shutdown = ShutdownCoordinator::new();
    let session = open(mock, shutdown.clone()).await;

    shutdown.initiate_shutdown();
    let err = run_command(
        &session,
        Commands::Read(ReadArgs {
            register: "SV".into(),
        }),
        OutputFormat::Text,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, BinError::Interrupted));
    assert_eq!(err.exit_code(), 130);
    assert_eq!(session.engine().busy_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cli_monitor_until_shutdown() {
    let shutdown = ShutdownCoordinator::new();
    let session = open(ControllerFixtures::controller(), shutdown.clone()).await;

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        trigger.initiate_shutdown();
    });

    let text = run_text(
        &session,
        Commands::Monitor(IntervalArgs {
            interval: Duration::from_secs(1),
        }),
    )
    .await;

    // Three refreshes of PV, dSV, OUT, Pr+t and the flags.
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 15);
    assert_eq!(lines.iter().filter(|l| l.contains(" PV ")).count(), 3);
    assert!(lines.iter().any(|l| l.contains("step 1, 1315 elapsed")));
}

#[tokio::test(start_paused = true)]
async fn test_cli_monitor_survives_failed_refresh() {
    let mock = ControllerFixtures::controller();
    mock.fail_next(1);
    let shutdown = ShutdownCoordinator::new();
    let session = open(mock, shutdown.clone()).await;

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        trigger.initiate_shutdown();
    });

    let text = run_text(
        &session,
        Commands::Monitor(IntervalArgs {
            interval: Duration::from_secs(1),
        }),
    )
    .await;

    // The first refresh fails on PV; the second one is complete.
    assert_eq!(text.lines().count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_cli_autotune_until_shutdown() {
    let mock = ControllerFixtures::controller();
    let shutdown = ShutdownCoordinator::new();
    let session = open(mock.clone(), shutdown.clone()).await;

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        trigger.initiate_shutdown();
    });

    let text = run_text(
        &session,
        Commands::Autotune(IntervalArgs {
            interval: Duration::from_secs(1),
        }),
    )
    .await;

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("PV    21.5"));
    assert!(lines[3].starts_with("Auto-tune stopped after"));
    assert!(lines[3].ends_with("(3 samples)"));
    assert!(!mock.coil(NAT_COIL));
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_cli_session_close_disconnects() {
    let mock = ControllerFixtures::controller();
    let session = open(mock.clone(), ShutdownCoordinator::new()).await;
    assert_eq!(session.engine().connection_state(), ConnectionState::Connected);
    assert_eq!(mock.connect_count(), 1);

    session.close().await;

    assert_eq!(mock.disconnect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cli_session_open_fails_without_device() {
    let mock = ControllerFixtures::controller();
    mock.fail_connect(true);

    let result = Session::with_transport(mock, &Settings::default(), ShutdownCoordinator::new()).await;

    let err = result.err().expect("open should fail");
    assert!(err.to_string().contains("cannot connect to controller"));
}

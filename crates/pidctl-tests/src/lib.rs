// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # pidctl Integration Tests
//!
//! Test utilities and end-to-end tests for the register engine and the
//! operator CLI, run against a mock controller.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `mocks`: [`MockTransport`](common::MockTransport), a scriptable controller
//!   - `fixtures`: Known register contents and connected engines
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p pidctl-tests
//!
//! # Run specific test suite
//! cargo test -p pidctl-tests --test integration_engine
//! cargo test -p pidctl-tests --test integration_operations
//! cargo test -p pidctl-tests --test integration_cli
//! ```
//!
//! ## Test Categories
//!
//! ### Engine Tests (`integration_engine.rs`)
//! - Reads, writes and read-back against live scales
//! - Deadline expiry and link recovery
//! - Serialization of concurrent callers
//! - Busy and change event ordering
//!
//! ### Operation Tests (`integration_operations.rs`)
//! - Register groups, PID slots, coils
//! - Auto-tune sessions
//!
//! ### CLI Tests (`integration_cli.rs`)
//! - Commands run through a session over the mock
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use pidctl_tests::common::{ControllerFixtures, EngineFixtures};
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_something() {
//!     let mock = ControllerFixtures::controller();
//!     let engine = EngineFixtures::connected(mock.clone()).await;
//!     // ... test logic
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::fixtures::*;
    pub use crate::common::mocks::*;
}

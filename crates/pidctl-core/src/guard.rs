// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Deadline race for transport exchanges.
//!
//! [`with_deadline`] polls the operation and a timer inside one
//! `tokio::select!`. Whichever finishes first decides the result and the
//! other is dropped before the call returns. Dropping the returned future
//! drops both, so nothing stays runnable after the caller gives up.
//!
//! ```text
//!   with_deadline(op, 500ms)
//!        │
//!        ├── op completes first ──► op's own Ok/Err, timer dropped
//!        │
//!        └── timer fires first ──► op dropped, Err(DeadlineExceeded)
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// An operation lost the race against its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded {
    /// Name of the abandoned operation.
    pub operation: &'static str,
    /// The deadline that expired.
    pub deadline: Duration,
}

impl DeadlineExceeded {
    /// Creates a new deadline error.
    pub fn new(operation: &'static str, deadline: Duration) -> Self {
        Self {
            operation,
            deadline,
        }
    }
}

impl fmt::Display for DeadlineExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} timed out after {}",
            self.operation,
            humantime::format_duration(self.deadline)
        )
    }
}

impl std::error::Error for DeadlineExceeded {}

/// Runs `future` against a deadline.
///
/// The operation's own result, success or failure, is returned unchanged
/// when it finishes in time. Otherwise the operation is dropped and a
/// [`DeadlineExceeded`] converted into `E` is returned.
///
/// The operation is polled first, so a future that is already complete
/// wins even against a zero deadline.
pub async fn with_deadline<F, T, E>(
    operation: &'static str,
    deadline: Duration,
    future: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<DeadlineExceeded>,
{
    tokio::select! {
        biased;
        result = future => result,
        () = tokio::time::sleep(deadline) => {
            tracing::warn!(
                operation,
                deadline_ms = deadline.as_millis() as u64,
                "Deadline expired, abandoning exchange"
            );
            Err(DeadlineExceeded::new(operation, deadline).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Deadline(DeadlineExceeded),
        Failed(&'static str),
    }

    impl From<DeadlineExceeded> for TestError {
        fn from(e: DeadlineExceeded) -> Self {
            Self::Deadline(e)
        }
    }

    /// Flips a flag when dropped so tests can see the loser was released.
    struct DropMarker(Arc<AtomicBool>);

    impl Drop for DropMarker {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_wins() {
        let result: Result<u32, TestError> = with_deadline("op", Duration::from_millis(500), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(7)
        })
        .await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_error_passes_through() {
        let result: Result<u32, TestError> =
            with_deadline("op", Duration::from_millis(500), async { Err(TestError::Failed("nak")) })
                .await;
        assert_eq!(result, Err(TestError::Failed("nak")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_wins_and_drops_operation() {
        let dropped = Arc::new(AtomicBool::new(false));
        let marker = DropMarker(dropped.clone());

        let started = tokio::time::Instant::now();
        let result: Result<u32, TestError> = with_deadline("read", Duration::from_millis(500), async move {
            let _marker = marker;
            std::future::pending::<()>().await;
            Ok(1)
        })
        .await;

        assert_eq!(
            result,
            Err(TestError::Deadline(DeadlineExceeded::new("read", Duration::from_millis(500))))
        );
        assert_eq!(started.elapsed(), Duration::from_millis(500));
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_cancellation_drops_operation() {
        let dropped = Arc::new(AtomicBool::new(false));
        let marker = DropMarker(dropped.clone());

        let guarded = with_deadline::<_, u32, TestError>("read", Duration::from_secs(10), async move {
            let _marker = marker;
            std::future::pending::<()>().await;
            Ok(1)
        });

        let outer = tokio::time::timeout(Duration::from_millis(50), guarded).await;
        assert!(outer.is_err());
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_operation_beats_zero_deadline() {
        let result: Result<u32, TestError> =
            with_deadline("op", Duration::ZERO, async { Ok(3) }).await;
        assert_eq!(result, Ok(3));
    }

    #[test]
    fn test_display() {
        let error = DeadlineExceeded::new("read_coils", Duration::from_secs(1));
        assert_eq!(error.to_string(), "read_coils timed out after 1s");
    }
}

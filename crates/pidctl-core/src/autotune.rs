// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Auto-tune session with live sampling.
//!
//! ```text
//!   NAT := off (errors ignored)
//!   ModL := SV, At := On
//!   loop {
//!       sample PV, dSV, OUT
//!       wait interval  ◄── stop signal ends the loop here
//!   }
//!   NAT := off (best effort, also after errors)
//! ```
//!
//! The stop signal is only raced against the wait between samples, so a
//! sample is never cut off halfway. The whole session counts as one busy
//! operation.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;

use pidctl_modbus::ModbusTransport;

use crate::engine::{Coil, Engine};
use crate::error::EngineResult;
use crate::value::RegisterInput;

/// Auto-tune settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoTuneOptions {
    /// Pause between samples.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for AutoTuneOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

/// One sample of the process during auto-tune.
///
/// Values that decode to nothing valid are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoTuneSample {
    /// Time since auto-tune was switched on.
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    /// Process value.
    pub pv: Option<f64>,
    /// Dynamic set value.
    pub dsv: Option<f64>,
    /// Output percentage.
    pub out: Option<f64>,
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoTuneReport {
    /// Samples taken.
    pub samples: usize,
    /// Session length since auto-tune was switched on.
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    /// The last sample, if any.
    pub last: Option<AutoTuneSample>,
}

impl<T: ModbusTransport> Engine<T> {
    /// Runs an auto-tune session until `stop` completes.
    ///
    /// Each sample is also sent to `samples` when given; a dropped receiver
    /// does not end the session.
    pub async fn auto_tune<S>(
        &self,
        options: AutoTuneOptions,
        stop: S,
        samples: Option<mpsc::Sender<AutoTuneSample>>,
    ) -> EngineResult<AutoTuneReport>
    where
        S: Future<Output = ()>,
    {
        let _busy = self.enter_busy();
        tokio::pin!(stop);

        tracing::info!(interval = ?options.interval, "Auto-tune starting");
        let result = self
            .run_auto_tune(&options, stop.as_mut(), samples.as_ref())
            .await;

        if let Err(e) = self.set_coil(Coil::Nat, false).await {
            tracing::warn!(error = %e, "Failed to clear NAT after auto-tune");
        }

        match &result {
            Ok(report) => tracing::info!(
                samples = report.samples,
                duration = %humantime::format_duration(report.duration),
                "Auto-tune finished"
            ),
            Err(e) => tracing::warn!(error = %e, "Auto-tune aborted"),
        }
        result
    }

    async fn run_auto_tune<S>(
        &self,
        options: &AutoTuneOptions,
        mut stop: std::pin::Pin<&mut S>,
        samples: Option<&mpsc::Sender<AutoTuneSample>>,
    ) -> EngineResult<AutoTuneReport>
    where
        S: Future<Output = ()>,
    {
        if let Err(e) = self.set_coil(Coil::Nat, false).await {
            tracing::debug!(error = %e, "Ignoring NAT clear failure");
        }
        self.apply_and_verify("ModL", RegisterInput::Label("SV".into()))
            .await?;
        let started = Instant::now();
        self.apply_and_verify("At", RegisterInput::Label("On".into()))
            .await?;

        let mut report = AutoTuneReport {
            samples: 0,
            duration: Duration::ZERO,
            last: None,
        };

        loop {
            let elapsed = started.elapsed();
            let pv = self.read_register("PV").await?.value.as_number();
            let dsv = self.read_register("dSV").await?.value.as_number();
            let out = self.read_register("OUT").await?.value.as_number();

            let sample = AutoTuneSample {
                elapsed,
                pv,
                dsv,
                out,
            };
            tracing::debug!(?sample, "Auto-tune sample");
            if let Some(sender) = samples {
                if sender.send(sample.clone()).await.is_err() {
                    tracing::trace!("Sample receiver dropped");
                }
            }
            report.samples += 1;
            report.last = Some(sample);

            tokio::select! {
                biased;
                () = stop.as_mut() => break,
                () = tokio::time::sleep(options.interval) => {}
            }
        }

        report.duration = started.elapsed();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options() {
        assert_eq!(AutoTuneOptions::default().interval, Duration::from_secs(1));
        let options: AutoTuneOptions = serde_json::from_str(r#"{"interval": "250ms"}"#).unwrap();
        assert_eq!(options.interval, Duration::from_millis(250));
    }

    #[test]
    fn test_sample_serialization() {
        let sample = AutoTuneSample {
            elapsed: Duration::from_secs(3),
            pv: Some(21.5),
            dsv: Some(50.0),
            out: None,
        };
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["elapsed"], "3s");
        assert_eq!(json["pv"], 21.5);
        assert!(json["out"].is_null());
    }
}

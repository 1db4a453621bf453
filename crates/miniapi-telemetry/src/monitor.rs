//! Pull-based resource monitoring.
//!
//! [`Monitor::sample`] reads one resource counter at the moment of the
//! call; nothing runs in the background unless the caller starts a
//! [`PeriodicSampler`](crate::PeriodicSampler).

use std::sync::Arc;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use miniapi_core::{ops, Execution, MiniapiError, MiniapiResult, PlatformContext};

use crate::platform;

/// Resource counters the monitor can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Cumulative CPU time (user + system) of this process.
    Cpu,
    /// Resident memory of this process.
    Memory,
    /// Cumulative bytes transferred to/from storage by this process.
    Io,
}

/// One point-in-time reading.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySample {
    pub resource: ResourceKind,
    /// Counter value; see `unit`.
    pub value: u64,
    /// `"microseconds"` for CPU, `"bytes"` otherwise.
    pub unit: &'static str,
    /// Capture time, RFC 3339 in UTC.
    pub captured_at: String,
}

/// The resource monitor.
#[derive(Clone)]
pub struct Monitor {
    ctx: Arc<PlatformContext>,
}

impl Monitor {
    pub fn new(ctx: Arc<PlatformContext>) -> Self {
        Monitor { ctx }
    }

    /// Read one resource counter now.
    pub fn sample(&self, resource: ResourceKind) -> MiniapiResult<TelemetrySample> {
        let operation = match resource {
            ResourceKind::Cpu => ops::TELEMETRY_SAMPLE_CPU,
            ResourceKind::Memory => ops::TELEMETRY_SAMPLE_MEMORY,
            ResourceKind::Io => ops::TELEMETRY_SAMPLE_IO,
        };
        // A no-op policy cannot fabricate a reading, and the counters
        // have no emulation; only a native resolution proceeds.
        if self.ctx.dispatch(operation)? != Execution::Native {
            return Err(MiniapiError::unsupported(
                operation,
                self.ctx.profile().family.as_str(),
            ));
        }

        let (value, unit) = match resource {
            ResourceKind::Cpu => (platform::cpu_time_micros()?, "microseconds"),
            ResourceKind::Memory => (platform::resident_bytes()?, "bytes"),
            ResourceKind::Io => {
                let (read, written) = platform::io_bytes()?;
                (read + written, "bytes")
            }
        };

        Ok(TelemetrySample {
            resource,
            value,
            unit,
            captured_at: now_rfc3339()?,
        })
    }
}

fn now_rfc3339() -> MiniapiResult<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| MiniapiError::platform(format!("timestamp formatting: {e}"), 0))
}

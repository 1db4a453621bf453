//! miniapi-telemetry: Logging facade and performance monitoring
//!
//! Two concerns share this crate because both read the platform through
//! the same capability registry:
//!
//! - **Logging**: [`init_logging`] installs a `tracing` subscriber built
//!   from [`LogConfig`](miniapi_core::config::LogConfig) — console, file,
//!   and platform-native sinks, text or JSON, per-sink level thresholds
//! - **Monitoring**: [`Monitor`] reads CPU, memory, and I/O counters on
//!   demand; [`PeriodicSampler`] does the same on a fixed interval from a
//!   caller-owned worker thread
//!
//! Monitoring is pull-based: a sample is taken when asked for, and the
//! periodic sampler only buffers readings until the caller drains them.

mod logging;
mod monitor;
mod sampler;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use unix as platform;
#[cfg(windows)]
use windows as platform;

pub use logging::init_logging;
pub use monitor::{Monitor, ResourceKind, TelemetrySample};
pub use sampler::PeriodicSampler;

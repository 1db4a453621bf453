//! Logging facade.
//!
//! Builds one `tracing` subscriber from [`LogConfig`]: a fmt layer per
//! configured sink, each behind its own level filter. Sink availability
//! is resolved through the capability registry before any layer is built,
//! so an unsupported native sink fails initialization instead of silently
//! dropping records.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use miniapi_core::config::{LogConfig, LogFormat, LogLevel, SinkKind};
use miniapi_core::{ops, Execution, MiniapiError, MiniapiResult, PlatformContext};

use crate::platform;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the process-wide subscriber described by `config`.
///
/// Callable once per process; a second call reports the conflict as an
/// error. Sinks resolved to a no-op by the registry are skipped.
pub fn init_logging(ctx: &PlatformContext, config: &LogConfig) -> MiniapiResult<()> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    for sink in &config.sinks {
        let operation = match sink.kind {
            SinkKind::Console => ops::LOG_SINK_CONSOLE,
            SinkKind::File => ops::LOG_SINK_FILE,
            SinkKind::Native => ops::LOG_SINK_NATIVE,
        };
        match ctx.dispatch(operation)? {
            Execution::Native => {}
            Execution::Skipped => {
                debug!(operation, "log sink disabled by policy");
                continue;
            }
            // Sinks have no emulation to run.
            Execution::Emulated => {
                return Err(MiniapiError::unsupported(
                    operation,
                    ctx.profile().family.as_str(),
                ))
            }
        }

        // The stricter of the global and per-sink thresholds wins.
        let threshold = sink
            .min_level
            .map_or(config.min_level, |s| s.max(config.min_level));

        let layer = match sink.kind {
            SinkKind::Console => {
                build_layer(config.format, BoxMakeWriter::new(io::stderr), true)
            }
            SinkKind::File => {
                let path = sink.path.as_ref().ok_or_else(|| {
                    MiniapiError::invalid_argument("file log sink requires a path")
                })?;
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| {
                        MiniapiError::from_io(e, ops::LOG_SINK_FILE, &path.display().to_string())
                    })?;
                build_layer(config.format, BoxMakeWriter::new(Mutex::new(file)), false)
            }
            SinkKind::Native => {
                build_layer(config.format, BoxMakeWriter::new(NativeMakeWriter), false)
            }
        };
        layers.push(layer.with_filter(level_filter(threshold)).boxed());
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| MiniapiError::platform(format!("logging initialization: {e}"), 0))
}

fn build_layer(format: LogFormat, writer: BoxMakeWriter, ansi: bool) -> BoxedLayer {
    match format {
        LogFormat::Text => fmt::layer().with_ansi(ansi).with_writer(writer).boxed(),
        LogFormat::Json => fmt::layer().json().with_ansi(false).with_writer(writer).boxed(),
    }
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
    }
}

/// Routes formatted records to the platform-native log (syslog on Unix,
/// debugger output on Windows).
struct NativeMakeWriter;

impl<'a> MakeWriter<'a> for NativeMakeWriter {
    type Writer = NativeLineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        NativeLineWriter { buf: Vec::new() }
    }
}

/// Per-event writer. The fmt layer hands each record to a fresh writer,
/// so flushing on drop delivers exactly one event per native entry.
struct NativeLineWriter {
    buf: Vec<u8>,
}

impl io::Write for NativeLineWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for NativeLineWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        for line in text.lines().filter(|l| !l.is_empty()) {
            platform::emit_native(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stricter_threshold_wins() {
        // Per-sink Warn tightens a global Info; a looser per-sink level
        // cannot widen the global threshold.
        assert_eq!(LogLevel::Warn.max(LogLevel::Info), LogLevel::Warn);
        assert_eq!(LogLevel::Debug.max(LogLevel::Info), LogLevel::Info);
    }

    #[test]
    fn level_filters_map_one_to_one() {
        assert_eq!(level_filter(LogLevel::Trace), LevelFilter::TRACE);
        assert_eq!(level_filter(LogLevel::Error), LevelFilter::ERROR);
    }

    #[test]
    fn native_writer_splits_lines() {
        use std::io::Write;
        let mut writer = NativeLineWriter { buf: Vec::new() };
        writer.write_all(b"one line\nanother\n").unwrap();
        assert_eq!(writer.buf.len(), 17);
        // Delivery happens on drop; nothing to assert beyond not panicking.
    }
}

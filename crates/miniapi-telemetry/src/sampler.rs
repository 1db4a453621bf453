//! Background periodic sampling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::{Monitor, ResourceKind, TelemetrySample};

/// How often the worker re-checks the stop flag while waiting out the
/// sampling interval.
const STOP_POLL: Duration = Duration::from_millis(10);

/// Caller-owned background sampler.
///
/// Samples the requested resources on a fixed interval from a worker
/// thread and buffers readings on an in-process channel. The caller
/// drains buffered samples at its own pace and owns the lifecycle:
/// nothing starts implicitly, and [`stop`](PeriodicSampler::stop) joins
/// the worker before returning the remaining readings. Dropping the
/// sampler also stops the worker.
///
/// Individual failed reads are logged and skipped; a transiently missing
/// counter never kills the worker.
pub struct PeriodicSampler {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    receiver: mpsc::Receiver<TelemetrySample>,
}

impl PeriodicSampler {
    /// Start sampling `resources` every `interval`.
    pub fn start(monitor: Monitor, resources: Vec<ResourceKind>, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::channel();
        let flag = Arc::clone(&stop);

        let worker = std::thread::spawn(move || {
            while !flag.load(Ordering::Relaxed) {
                for &resource in &resources {
                    match monitor.sample(resource) {
                        Ok(sample) => {
                            if sender.send(sample).is_err() {
                                return;
                            }
                        }
                        Err(e) => debug!(?resource, error = %e, "periodic sample failed"),
                    }
                }
                let deadline = Instant::now() + interval;
                while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
                    if remaining.is_zero() || flag.load(Ordering::Relaxed) {
                        break;
                    }
                    std::thread::sleep(remaining.min(STOP_POLL));
                }
            }
        });

        PeriodicSampler {
            stop,
            worker: Some(worker),
            receiver,
        }
    }

    /// Take all samples buffered so far without blocking.
    pub fn drain(&self) -> Vec<TelemetrySample> {
        self.receiver.try_iter().collect()
    }

    /// Stop the worker, wait for it to finish, and return the remaining
    /// buffered samples.
    pub fn stop(mut self) -> Vec<TelemetrySample> {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.drain()
    }
}

impl Drop for PeriodicSampler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

//! Position tracking and throughput reporting.
//!
//! The processing loop is the only writer of the [`PositionCounter`]. A
//! [`ProgressMonitor`] runs on its own thread, samples the counter on a fixed
//! interval and hands each [`ThroughputSample`] to a [`ProgressReporter`].
//! The monitor never touches pipeline state, and stopping it joins the
//! thread, so a finished run leaves nothing behind.
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_ripper::pipeline::progress::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let counter = PositionCounter::new();
//! let monitor = ProgressMonitor::start(
//!     counter.clone(),
//!     Duration::from_secs(30),
//!     Arc::new(ClosureProgressReporter::new(|sample| println!("{sample}"))),
//! );
//! // ... the loop calls counter.increment() per row ...
//! monitor.stop();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

fn serialize_timestamp<S>(timestamp: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&timestamp.to_rfc3339())
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Number of records fully processed so far.
///
/// Clones share the same value. Reads never block the writer.
#[derive(Debug, Clone, Default)]
pub struct PositionCounter {
    value: Arc<AtomicU64>,
}

impl PositionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    pub(crate) fn increment(&self) -> u64 {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// One throughput observation.
///
/// `per_second` is stored unrounded; `Display` rounds it to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThroughputSample {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Local>,
    pub position: u64,
    pub delta: u64,
    #[serde(rename = "interval_secs", serialize_with = "serialize_duration")]
    pub interval: Duration,
    pub per_second: f64,
}

impl std::fmt::Display for ThroughputSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] line: {}, tps: {:.2}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.position,
            self.per_second
        )
    }
}

/// Turns successive counter readings into samples.
#[derive(Debug, Clone)]
pub struct ThroughputTracker {
    interval: Duration,
    previous: u64,
}

impl ThroughputTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            previous: 0,
        }
    }

    /// Record a reading of `current` taken at `timestamp`.
    pub fn sample(&mut self, current: u64, timestamp: DateTime<Local>) -> ThroughputSample {
        let delta = current.saturating_sub(self.previous);
        self.previous = current;

        let secs = self.interval.as_secs_f64();
        let per_second = if secs > 0.0 { delta as f64 / secs } else { 0.0 };

        ThroughputSample {
            timestamp,
            position: current,
            delta,
            interval: self.interval,
            per_second,
        }
    }
}

/// Receives throughput samples from the monitor thread.
///
/// Implementations must not block for long; a slow reporter delays the next
/// sample but never the processing loop.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, sample: &ThroughputSample);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(&ThroughputSample) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(&ThroughputSample) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(&ThroughputSample) + Send + Sync,
{
    fn report(&self, sample: &ThroughputSample) {
        (self.callback)(sample);
    }
}

/// Logs every sample at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgressReporter;

impl ProgressReporter for LogProgressReporter {
    fn report(&self, sample: &ThroughputSample) {
        info!("{}", sample);
    }
}

/// Handle to a running monitor thread.
///
/// Dropping the handle stops the thread as well.
#[derive(Debug)]
pub struct ProgressMonitor {
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<usize>>,
}

impl ProgressMonitor {
    /// Spawn the monitor. The first sample is taken one `interval` from now.
    pub fn start(
        counter: PositionCounter,
        interval: Duration,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let spawned = std::thread::Builder::new()
            .name("ripper-progress".to_string())
            .spawn(move || {
                let mut tracker = ThroughputTracker::new(interval);
                let mut next_tick = Instant::now() + interval;
                let mut samples = 0usize;

                loop {
                    let wait = next_tick.saturating_duration_since(Instant::now());
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            let sample = tracker.sample(counter.get(), Local::now());
                            reporter.report(&sample);
                            samples += 1;
                            next_tick += interval;
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                samples
            });

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Progress monitor could not start: {}", e);
                None
            }
        };

        Self {
            stop_tx: Some(stop_tx),
            handle,
        }
    }

    /// Stop the thread and wait for it. Returns the number of samples taken.
    pub fn stop(mut self) -> usize {
        self.shutdown()
    }

    fn shutdown(&mut self) -> usize {
        if let Some(tx) = self.stop_tx.take() {
            // receiver may already be gone if the thread panicked
            let _ = tx.send(());
        }

        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(samples)) => {
                debug!("Progress monitor stopped after {} samples", samples);
                samples
            }
            Some(Err(_)) => {
                warn!("Progress reporter panicked; monitor stopped");
                0
            }
            None => 0,
        }
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// Shared with the monitor thread
static_assertions::assert_impl_all!(PositionCounter: Send, Sync);
static_assertions::assert_impl_all!(ThroughputSample: Send, Sync);

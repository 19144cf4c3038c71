//! Render metrics.
//!
//! Counters are atomics; recent durations sit behind a mutex for
//! percentile snapshots.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Maximum number of duration samples kept in memory.
const MAX_DURATION_SAMPLES: usize = 1000;

/// Render metrics collector, shared by all render calls.
#[derive(Debug)]
pub struct RenderMetrics {
    /// Render calls started.
    pub renders_started: AtomicU64,
    /// Renders completed by a real backend.
    pub backend_successes: AtomicU64,
    /// Renders that ended with a placeholder.
    pub degraded: AtomicU64,
    /// Individual backend attempts that failed.
    pub backend_failures: AtomicU64,
    /// Backend attempts that panicked.
    pub panics: AtomicU64,
    /// Total PNG bytes produced.
    pub total_output_bytes: AtomicU64,
    duration_samples: Mutex<Vec<Duration>>,
}

impl RenderMetrics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self {
            renders_started: AtomicU64::new(0),
            backend_successes: AtomicU64::new(0),
            degraded: AtomicU64::new(0),
            backend_failures: AtomicU64::new(0),
            panics: AtomicU64::new(0),
            total_output_bytes: AtomicU64::new(0),
            duration_samples: Mutex::new(Vec::with_capacity(MAX_DURATION_SAMPLES)),
        }
    }

    pub fn record_started(&self) {
        self.renders_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished render, real or placeholder.
    pub fn record_finished(&self, duration: Duration, output_bytes: u64, degraded: bool) {
        if degraded {
            self.degraded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.backend_successes.fetch_add(1, Ordering::Relaxed);
        }
        self.total_output_bytes
            .fetch_add(output_bytes, Ordering::Relaxed);
        self.add_duration_sample(duration);
    }

    pub fn record_backend_failure(&self) {
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A panic also counts as a backend failure.
    pub fn record_panic(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn add_duration_sample(&self, duration: Duration) {
        if let Ok(mut samples) = self.duration_samples.lock() {
            if samples.len() >= MAX_DURATION_SAMPLES {
                samples.remove(0);
            }
            samples.push(duration);
        }
    }

    /// Current values.
    pub fn snapshot(&self) -> RenderMetricsSnapshot {
        let durations = self
            .duration_samples
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();
        let (p50, p95, p99) = percentiles(&durations);

        RenderMetricsSnapshot {
            renders_started: self.renders_started.load(Ordering::Relaxed),
            backend_successes: self.backend_successes.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            backend_failures: self.backend_failures.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
            total_output_bytes: self.total_output_bytes.load(Ordering::Relaxed),
            duration_p50: p50,
            duration_p95: p95,
            duration_p99: p99,
            sample_count: durations.len() as u64,
        }
    }
}

impl Default for RenderMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn percentiles(durations: &[Duration]) -> (Option<Duration>, Option<Duration>, Option<Duration>) {
    if durations.is_empty() {
        return (None, None, None);
    }
    let mut sorted = durations.to_vec();
    sorted.sort();
    let len = sorted.len();
    (
        sorted.get(len * 50 / 100).copied(),
        sorted.get(len * 95 / 100).copied(),
        sorted.get(len.saturating_sub(1) * 99 / 100).copied(),
    )
}

/// A point-in-time view of [`RenderMetrics`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RenderMetricsSnapshot {
    pub renders_started: u64,
    pub backend_successes: u64,
    pub degraded: u64,
    pub backend_failures: u64,
    pub panics: u64,
    pub total_output_bytes: u64,
    /// Median render duration, serialized as milliseconds.
    #[serde(
        serialize_with = "serialize_opt_duration",
        deserialize_with = "deserialize_opt_duration"
    )]
    pub duration_p50: Option<Duration>,
    #[serde(
        serialize_with = "serialize_opt_duration",
        deserialize_with = "deserialize_opt_duration"
    )]
    pub duration_p95: Option<Duration>,
    #[serde(
        serialize_with = "serialize_opt_duration",
        deserialize_with = "deserialize_opt_duration"
    )]
    pub duration_p99: Option<Duration>,
    pub sample_count: u64,
}

fn serialize_opt_duration<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match duration {
        Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
        None => serializer.serialize_none(),
    }
}

fn deserialize_opt_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let millis: Option<u64> = serde::Deserialize::deserialize(deserializer)?;
    Ok(millis.map(Duration::from_millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let m = RenderMetrics::new();
        m.record_started();
        m.record_started();
        m.record_backend_failure();
        m.record_panic();
        m.record_finished(Duration::from_millis(40), 1000, false);
        m.record_finished(Duration::from_millis(10), 200, true);

        let snap = m.snapshot();
        assert_eq!(snap.renders_started, 2);
        assert_eq!(snap.backend_successes, 1);
        assert_eq!(snap.degraded, 1);
        assert_eq!(snap.backend_failures, 2);
        assert_eq!(snap.panics, 1);
        assert_eq!(snap.total_output_bytes, 1200);
        assert_eq!(snap.sample_count, 2);
    }

    #[test]
    fn test_percentiles() {
        let m = RenderMetrics::new();
        assert!(m.snapshot().duration_p50.is_none());
        for i in 1..=100 {
            m.record_finished(Duration::from_millis(i * 10), 1, false);
        }
        let snap = m.snapshot();
        assert!(snap.duration_p95.expect("p95") > snap.duration_p50.expect("p50"));
    }

    #[test]
    fn test_snapshot_serializes_millis() {
        let m = RenderMetrics::new();
        m.record_finished(Duration::from_secs(2), 10, false);
        let json = serde_json::to_value(m.snapshot()).expect("serialize");
        assert_eq!(json["duration_p50"], 2000);
        let back: RenderMetricsSnapshot = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.duration_p50, Some(Duration::from_secs(2)));
    }
}

//! Insert-attempt metrics and the bounded recency ring.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::JobId;

/// Default capacity of the metrics ring.
pub const DEFAULT_METRICS_CAPACITY: usize = 200;

/// Outcome of a single insert attempt, immediate or queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertMetric {
    /// The submission's job id.
    pub job_id: JobId,
    pub email: String,
    /// Wall-clock duration of the insert attempt in milliseconds.
    pub duration_ms: u64,
    /// When the attempt finished.
    pub recorded_at: DateTime<Utc>,
    /// Error detail for failed attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Database id of the committed row, for successful attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<i64>,
}

impl InsertMetric {
    /// Metric for an attempt that committed a row.
    pub fn success(job_id: JobId, email: impl Into<String>, duration_ms: u64, registration_id: i64) -> Self {
        Self {
            job_id,
            email: email.into(),
            duration_ms,
            recorded_at: Utc::now(),
            error: None,
            registration_id: Some(registration_id),
        }
    }

    /// Metric for an attempt that failed.
    pub fn failure(job_id: JobId, email: impl Into<String>, duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            job_id,
            email: email.into(),
            duration_ms,
            recorded_at: Utc::now(),
            error: Some(error.into()),
            registration_id: None,
        }
    }

    /// Whether the attempt committed a row.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Fixed-capacity, newest-first buffer of insert metrics.
///
/// `record` and `snapshot` may be called concurrently from the intake path
/// and the drain worker; the ring never grows past its capacity and evicts
/// the oldest entry on overflow.
#[derive(Debug)]
pub struct MetricsRing {
    capacity: usize,
    inner: Mutex<VecDeque<InsertMetric>>,
}

impl MetricsRing {
    /// Create a ring holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Maximum number of retained entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a metric as the newest entry, evicting the oldest if full.
    pub fn record(&self, metric: InsertMetric) {
        let mut inner = self.inner.lock().unwrap();
        inner.push_front(metric);
        if inner.len() > self.capacity {
            inner.pop_back();
        }
    }

    /// Up to `n` most recent entries, newest first.
    pub fn snapshot(&self, n: usize) -> Vec<InsertMetric> {
        let inner = self.inner.lock().unwrap();
        inner.iter().take(n.min(self.capacity)).cloned().collect()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Whether the ring holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MetricsRing {
    fn default() -> Self {
        Self::new(DEFAULT_METRICS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(n: u64) -> InsertMetric {
        InsertMetric::success(JobId(n), format!("user{n}@example.com"), n, n as i64)
    }

    #[test]
    fn newest_first_order() {
        let ring = MetricsRing::new(10);
        ring.record(metric(1));
        ring.record(metric(2));
        ring.record(metric(3));

        let snapshot = ring.snapshot(10);
        let ids: Vec<u64> = snapshot.iter().map(|m| m.job_id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let ring = MetricsRing::new(3);
        for n in 1..=5 {
            ring.record(metric(n));
        }

        assert_eq!(ring.len(), 3);
        let ids: Vec<u64> = ring.snapshot(3).iter().map(|m| m.job_id.0).collect();
        assert_eq!(ids, vec![5, 4, 3]);
    }

    #[test]
    fn snapshot_caps_at_capacity_and_leaves_ring_intact() {
        let ring = MetricsRing::new(4);
        for n in 1..=4 {
            ring.record(metric(n));
        }

        assert_eq!(ring.snapshot(100).len(), 4);
        assert_eq!(ring.snapshot(2).len(), 2);
        assert_eq!(ring.len(), 4);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let ring = MetricsRing::new(0);
        ring.record(metric(1));
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.capacity(), 1);
    }

    #[test]
    fn failure_metric_carries_error() {
        let m = InsertMetric::failure(JobId(7), "x@example.com", 12, "boom");
        assert!(!m.is_success());
        assert_eq!(m.error.as_deref(), Some("boom"));
        assert_eq!(m.registration_id, None);
    }
}

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running admission counters.
///
/// Rejections are an expected, frequent condition, so they are counted here
/// rather than logged as errors.
#[derive(Debug, Clone, Default)]
pub struct AdmissionMetrics {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    total: AtomicU64,
    admitted: AtomicU64,
    rejected: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub admitted_requests: u64,
    pub rejected_requests: u64,
}

impl AdmissionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, allowed: bool) {
        self.inner.total.fetch_add(1, Ordering::Relaxed);
        if allowed {
            self.inner.admitted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.inner.total.load(Ordering::Relaxed),
            admitted_requests: self.inner.admitted.load(Ordering::Relaxed),
            rejected_requests: self.inner.rejected.load(Ordering::Relaxed),
        }
    }
}

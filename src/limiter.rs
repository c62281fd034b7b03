use crate::config::Config;
use crate::metrics::{AdmissionMetrics, MetricsSnapshot};
use crate::registry::ClientRegistry;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Per-client admission controller.
///
/// Owns the client registry and the single sweeper task that keeps it from
/// growing without bound. Construct one at startup and hand clones to the
/// request path; all clones share the same registry and counters. The
/// sweeper stops when the last clone is dropped.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Arc<ClientRegistry>,
    rate: f64,
    burst: u32,
    metrics: AdmissionMetrics,
    sweeper: JoinHandle<()>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

impl RateLimiter {
    /// Build a limiter and spawn its sweeper. Exactly one sweeper task
    /// exists per registry, regardless of how many clones serve requests.
    pub fn new(
        rate: f64,
        burst: u32,
        sweep_interval: Duration,
        idle_threshold: Duration,
    ) -> Self {
        let registry = Arc::new(ClientRegistry::new());
        let sweeper = spawn_sweeper(Arc::clone(&registry), sweep_interval, idle_threshold);

        Self {
            inner: Arc::new(Inner {
                registry,
                rate,
                burst,
                metrics: AdmissionMetrics::new(),
                sweeper,
            }),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.rate_limit_per_sec,
            config.rate_limit_burst,
            config.sweep_interval,
            config.idle_threshold,
        )
    }

    /// Decide admission for one request from `ip`.
    ///
    /// Resolves the client's bucket (creating it on first sight) and tries
    /// to consume one token. Synchronous; the registry lock is released
    /// before the bucket arithmetic runs.
    pub fn check(&self, ip: IpAddr) -> bool {
        let bucket = self
            .inner
            .registry
            .bucket_for(ip, self.inner.rate, self.inner.burst);
        let allowed = bucket.lock().allow();
        self.inner.metrics.record(allowed);
        allowed
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    pub fn tracked_clients(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn rate(&self) -> f64 {
        self.inner.rate
    }

    pub fn burst(&self) -> u32 {
        self.inner.burst
    }
}

fn spawn_sweeper(
    registry: Arc<ClientRegistry>,
    sweep_interval: Duration,
    idle_threshold: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        // The first tick fires immediately; skip it so a fresh registry is
        // not swept before it has seen a single request.
        interval.tick().await;

        loop {
            interval.tick().await;
            let evicted = registry.sweep(idle_threshold);
            if evicted > 0 {
                tracing::debug!(evicted, remaining = registry.len(), "swept idle clients");
            }
        }
    })
}

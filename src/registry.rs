use crate::token_bucket::TokenBucket;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One tracked client: its bucket plus the recency stamp the sweeper uses.
struct ClientEntry {
    bucket: Arc<Mutex<TokenBucket>>,
    last_seen: Instant,
}

/// Shared map of client address to token bucket.
///
/// A single mutex guards the map; it is held only for the lookup/insert or
/// the sweep scan, never across bucket arithmetic. Each bucket lives behind
/// its own lock so callers refill and consume after releasing the map guard.
pub struct ClientRegistry {
    clients: Mutex<HashMap<IpAddr, ClientEntry>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Return the bucket for `ip`, creating a fresh full one on first sight.
    ///
    /// Concurrent first requests from one address race on the map lock; the
    /// loser finds the winner's entry, so exactly one bucket ever exists per
    /// address. An existing entry gets its `last_seen` bumped.
    pub fn bucket_for(&self, ip: IpAddr, rate: f64, burst: u32) -> Arc<Mutex<TokenBucket>> {
        let mut clients = self.clients.lock();

        match clients.get_mut(&ip) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                Arc::clone(&entry.bucket)
            }
            None => {
                let bucket = Arc::new(Mutex::new(TokenBucket::new(burst, rate)));
                clients.insert(
                    ip,
                    ClientEntry {
                        bucket: Arc::clone(&bucket),
                        last_seen: Instant::now(),
                    },
                );
                bucket
            }
        }
    }

    /// Drop every entry idle for longer than `idle_threshold`.
    ///
    /// Returns the number of evicted entries.
    pub fn sweep(&self, idle_threshold: Duration) -> usize {
        let now = Instant::now();
        let mut clients = self.clients.lock();

        let before = clients.len();
        clients.retain(|_, entry| now.duration_since(entry.last_seen) <= idle_threshold);
        before - clients.len()
    }

    /// Number of clients currently tracked.
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

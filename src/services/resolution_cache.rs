use ethers::types::Address;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::models::ResolvedFrom;

/// Source of "now" for cache expiry, in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedResolution {
    pub address: Option<Address>,
    pub resolved_from: Option<ResolvedFrom>,
    pub timestamp_ms: i64,
}

/// Memoizes recipient resolutions (hits and misses) per normalized input.
///
/// A lookup never refreshes an entry's timestamp; only a new resolution
/// written through `insert` does.
pub struct ResolutionCache {
    entries: RwLock<HashMap<String, CachedResolution>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    max_entries: usize,
}

impl ResolutionCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn normalize_key(input: &str) -> String {
        input.trim().to_ascii_lowercase()
    }

    fn is_live(&self, entry: &CachedResolution, now_ms: i64) -> bool {
        let age = now_ms.saturating_sub(entry.timestamp_ms);
        age >= 0 && (age as u128) < self.ttl.as_millis()
    }

    pub async fn get(&self, input: &str) -> Option<CachedResolution> {
        let key = Self::normalize_key(input);
        let now = self.clock.now_millis();
        let entries = self.entries.read().await;
        entries
            .get(&key)
            .filter(|entry| self.is_live(entry, now))
            .cloned()
    }

    pub async fn insert(
        &self,
        input: &str,
        address: Option<Address>,
        resolved_from: Option<ResolvedFrom>,
    ) {
        let key = Self::normalize_key(input);
        let now = self.clock.now_millis();
        let mut entries = self.entries.write().await;

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            entries.retain(|_, entry| self.is_live(entry, now));
            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.timestamp_ms)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            CachedResolution {
                address,
                resolved_from,
                timestamp_ms: now,
            },
        );
    }

    /// Drops expired entries and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| self.is_live(entry, now));
        before - entries.len()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
pub(crate) struct ManualClock {
    now: std::sync::atomic::AtomicI64,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: std::sync::atomic::AtomicI64::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(
            by.as_millis() as i64,
            std::sync::atomic::Ordering::SeqCst,
        );
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    fn addr() -> Address {
        "0x00000000000000000000000000000000000000aa".parse().unwrap()
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = ResolutionCache::new(clock.clone(), TTL, 100);
        cache
            .insert("alice", Some(addr()), Some(ResolvedFrom::Basename))
            .await;

        clock.advance(Duration::from_secs(299));
        assert!(cache.get("alice").await.is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get("alice").await.is_none());
    }

    #[tokio::test]
    async fn hit_does_not_refresh_timestamp() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = ResolutionCache::new(clock.clone(), TTL, 100);
        cache.insert("bob", None, None).await;

        clock.advance(Duration::from_secs(200));
        let hit = cache.get("bob").await.unwrap();
        assert_eq!(hit.timestamp_ms, 0);

        clock.advance(Duration::from_secs(200));
        assert!(cache.get("bob").await.is_none());
    }

    #[tokio::test]
    async fn keys_are_normalized() {
        let cache = ResolutionCache::new(Arc::new(ManualClock::new(0)), TTL, 100);
        cache
            .insert("  Alice ", Some(addr()), Some(ResolvedFrom::Basename))
            .await;
        assert_eq!(cache.get("alice").await.unwrap().address, Some(addr()));
    }

    #[tokio::test]
    async fn insert_overwrites_with_new_timestamp() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = ResolutionCache::new(clock.clone(), TTL, 100);
        cache.insert("carol", None, None).await;
        clock.advance(Duration::from_secs(400));
        cache
            .insert("carol", Some(addr()), Some(ResolvedFrom::Farcaster))
            .await;
        let entry = cache.get("carol").await.unwrap();
        assert_eq!(entry.timestamp_ms, 400_000);
        assert_eq!(entry.resolved_from, Some(ResolvedFrom::Farcaster));
    }

    #[tokio::test]
    async fn full_cache_evicts_expired_then_oldest() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = ResolutionCache::new(clock.clone(), TTL, 2);
        cache.insert("a", None, None).await;
        clock.advance(Duration::from_secs(10));
        cache.insert("b", None, None).await;
        clock.advance(Duration::from_secs(10));
        cache.insert("c", None, None).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_some());
        assert!(cache.get("c").await.is_some());
    }

    #[tokio::test]
    async fn purge_drops_only_expired_entries() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = ResolutionCache::new(clock.clone(), TTL, 100);
        cache.insert("old", None, None).await;
        clock.advance(Duration::from_secs(250));
        cache.insert("fresh", Some(addr()), Some(ResolvedFrom::Ens)).await;
        clock.advance(Duration::from_secs(100));

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("fresh").await.is_some());
    }
}

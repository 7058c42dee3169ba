//! Bounded, expiring report cache.
//!
//! Created once in `main`, shared by handle into the request handlers, and
//! torn down by cancelling the sweeper's token.
//!
//! - `get` treats expired entries as absent but leaves them in place.
//! - `set` on a new key at capacity evicts the single oldest entry.
//! - The sweeper removes expired entries on a fixed period.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::models::{Report, UnitSystem};

#[derive(Debug)]
struct CacheEntry {
    report: Arc<Report>,
    created_at: Instant,
    expires_at: Instant,
}

/// Cache configuration and occupancy.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CacheStatus {
    /// Entries currently stored, including expired ones not yet swept
    pub entries: usize,
    pub capacity: usize,
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

/// In-memory report cache with a TTL and a capacity ceiling.
///
/// Clones share the same map.
#[derive(Debug, Clone)]
pub struct ReportCache {
    inner: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
    capacity: usize,
    sweep_interval: Duration,
}

impl ReportCache {
    /// Create an empty cache. A capacity of 0 disables caching.
    pub fn new(ttl: Duration, capacity: usize, sweep_interval: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            capacity,
            sweep_interval,
        }
    }

    /// Lowercased place name joined with the unit system label.
    pub fn cache_key(place: &str, units: UnitSystem) -> String {
        format!("{}|{}", place.to_lowercase(), units.as_str())
    }

    /// Fresh entry for `key`. Expired entries read as absent.
    pub async fn get(&self, key: &str) -> Option<Arc<Report>> {
        let map = self.inner.read().await;
        map.get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| Arc::clone(&entry.report))
    }

    /// Insert or replace `key`, evicting the oldest entry when a new key
    /// would exceed capacity.
    pub async fn set(&self, key: String, report: Arc<Report>) {
        if self.capacity == 0 {
            return;
        }

        let now = Instant::now();
        let mut map = self.inner.write().await;

        if !map.contains_key(&key) && map.len() >= self.capacity {
            let oldest = map
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                tracing::debug!("Cache full ({}), evicting {}", self.capacity, oldest);
                map.remove(&oldest);
            }
        }

        map.insert(
            key,
            CacheEntry {
                report,
                created_at: now,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Remove every expired entry. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut map = self.inner.write().await;
        let before = map.len();
        map.retain(|_, entry| entry.expires_at > now);
        before - map.len()
    }

    /// Number of stored entries, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Occupancy and configuration snapshot.
    pub async fn status(&self) -> CacheStatus {
        CacheStatus {
            entries: self.len().await,
            capacity: self.capacity,
            ttl_secs: self.ttl.as_secs(),
            sweep_interval_secs: self.sweep_interval.as_secs(),
        }
    }

    /// Run `sweep` every `sweep_interval` until `token` is cancelled.
    pub fn spawn_sweeper(&self, token: CancellationToken) -> JoinHandle<()> {
        let cache = self.clone();
        // tokio intervals panic on a zero period.
        let period = self.sweep_interval.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("Cache sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = cache.sweep().await;
                        if removed > 0 {
                            tracing::debug!("Cache sweep removed {} expired entries", removed);
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{CurrentConditions, Location};
    use crate::services::outfit::build_outfit;
    use crate::services::uv::UvLevel;

    pub(crate) fn sample_report(name: &str) -> Arc<Report> {
        let mut report = Report {
            location: Location {
                name: name.to_string(),
                latitude: 0.0,
                longitude: 0.0,
                country: String::new(),
                country_code: String::new(),
                timezone: "UTC".to_string(),
            },
            units: UnitSystem::Metric,
            temp_unit: "°C".to_string(),
            wind_unit: "km/h".to_string(),
            current: CurrentConditions {
                time: "2026-06-01T12:00".to_string(),
                temperature: 18.0,
                feels_like: Some(18.0),
                humidity: Some(50),
                cloud_cover: Some(20),
                wind_speed: Some(5.0),
                wind_direction: Some(180),
                wind_compass: Some("S".to_string()),
                pressure: Some(1015.0),
                dew_point: Some(8.0),
                uv_index: Some(3.0),
                uv_level: Some(UvLevel::Moderate),
                uv_advice: None,
                weather_code: Some(1),
                description: "Mainly clear".to_string(),
                icon: "wi-day-sunny-overcast".to_string(),
            },
            daily: vec![],
            hourly: vec![],
            sun: None,
            consensus: None,
            outfit: Default::default(),
        };
        report.outfit = build_outfit(&report);
        Arc::new(report)
    }

    fn cache(capacity: usize) -> ReportCache {
        ReportCache::new(Duration::from_secs(600), capacity, Duration::from_secs(300))
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(
            ReportCache::cache_key("ZüRICH", UnitSystem::Metric),
            "zürich|metric"
        );
        assert_eq!(
            ReportCache::cache_key("Zurich", UnitSystem::Imperial),
            "zurich|imperial"
        );
    }

    #[tokio::test]
    async fn test_get_and_set() {
        let cache = cache(10);
        assert!(cache.get("zurich|metric").await.is_none());

        cache.set("zurich|metric".into(), sample_report("Zurich")).await;
        let hit = cache.get("zurich|metric").await.unwrap();
        assert_eq!(hit.location.name, "Zurich");
        assert!(cache.get("zurich|imperial").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_absent_but_kept_until_sweep() {
        let cache = cache(10);
        cache.set("bern|metric".into(), sample_report("Bern")).await;

        tokio::time::advance(Duration::from_secs(601)).await;

        assert!(cache.get("bern|metric").await.is_none());
        assert_eq!(cache.len().await, 1);

        assert_eq!(cache.sweep().await, 1);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_oldest_only() {
        let cache = cache(3);
        for name in ["a", "b", "c"] {
            cache.set(format!("{}|metric", name), sample_report(name)).await;
            tokio::time::advance(Duration::from_secs(1)).await;
        }

        cache.set("d|metric".into(), sample_report("d")).await;

        assert_eq!(cache.len().await, 3);
        assert!(cache.get("a|metric").await.is_none());
        assert!(cache.get("b|metric").await.is_some());
        assert!(cache.get("d|metric").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_refreshes_without_eviction() {
        let cache = cache(2);
        cache.set("a|metric".into(), sample_report("a")).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.set("b|metric".into(), sample_report("b")).await;
        tokio::time::advance(Duration::from_secs(500)).await;

        cache.set("a|metric".into(), sample_report("a2")).await;
        assert_eq!(cache.len().await, 2);

        // "b" expires at 601s, the refreshed "a" at 1101s.
        tokio::time::advance(Duration::from_secs(200)).await;
        assert!(cache.get("b|metric").await.is_none());
        assert_eq!(cache.get("a|metric").await.unwrap().location.name, "a2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_periodically_and_stops_on_cancel() {
        let cache = cache(10);
        cache.set("x|metric".into(), sample_report("x")).await;

        let token = CancellationToken::new();
        let handle = cache.spawn_sweeper(token.clone());

        // Not yet expired at the first sweep (300s); removed at the second (600s+).
        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(cache.len().await, 1);
        tokio::time::sleep(Duration::from_secs(300)).await;
        tokio::task::yield_now().await;
        assert_eq!(cache.len().await, 0);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_status() {
        let cache = cache(200);
        cache.set("a|metric".into(), sample_report("a")).await;
        let status = cache.status().await;
        assert_eq!(status.entries, 1);
        assert_eq!(status.capacity, 200);
        assert_eq!(status.ttl_secs, 600);
        assert_eq!(status.sweep_interval_secs, 300);
    }
}

//! Per-destination path cache with most-recently-used ordering.
//!
//! This module implements:
//! - Bounded MRU lists keyed by path fingerprint
//! - Candidate refresh from an external path source
//! - Selection preferring recently successful paths

mod mru;
mod source;

pub use mru::PathsMru;
pub use source::{PathSource, StaticPathSource};

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, ErrorContext, LookupError, Result};
use crate::path::Path;
use crate::types::IsdAsn;

/// Default number of recently used paths kept per destination.
pub const DEFAULT_MAX_PATHS: usize = 8;

/// Default age after which candidates are re-queried.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Path cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum MRU entries per destination.
    #[serde(default = "default_max_paths")]
    pub max_paths_per_destination: usize,

    /// Re-query the path source when candidates are older than this.
    #[serde(default = "default_refresh_interval", with = "humantime_serde")]
    pub refresh_interval: Duration,
}

fn default_max_paths() -> usize {
    DEFAULT_MAX_PATHS
}
fn default_refresh_interval() -> Duration {
    DEFAULT_REFRESH_INTERVAL
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_paths_per_destination: default_max_paths(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_paths_per_destination == 0 {
            return Err(Error::InvalidConfig(
                "max_paths_per_destination must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Cached state for one destination.
#[derive(Debug, Default)]
struct DestinationPaths {
    /// Last answer from the path source, in source order.
    candidates: Vec<Path>,
    /// When the candidates were fetched.
    fetched_at: Option<Instant>,
    /// Recently used paths.
    mru: PathsMru,
}

impl DestinationPaths {
    fn needs_refresh(&self, refresh_interval: Duration, now: SystemTime) -> bool {
        match self.fetched_at {
            None => true,
            Some(at) => {
                at.elapsed() >= refresh_interval
                    || self.candidates.iter().all(|p| p.is_expired(now))
            }
        }
    }

    fn store(&mut self, candidates: Vec<Path>) {
        self.mru.refresh(candidates.iter());
        self.candidates = candidates;
        self.fetched_at = Some(Instant::now());
    }

    /// Recently used candidates first, then the rest in source order.
    fn ordered(&self, now: SystemTime) -> Vec<Path> {
        let mut ordered: Vec<Path> = Vec::with_capacity(self.candidates.len());
        for used in self.mru.iter() {
            if let Some(candidate) = self.candidates.iter().find(|c| *c == used) {
                if !candidate.is_expired(now) {
                    ordered.push(candidate.clone());
                }
            }
        }
        for candidate in &self.candidates {
            if !candidate.is_expired(now) && !ordered.contains(candidate) {
                ordered.push(candidate.clone());
            }
        }
        ordered
    }
}

/// Destination-keyed path cache.
///
/// Each destination has its own lock; it is never held while the path
/// source is being queried.
pub struct PathCache {
    /// Configuration.
    config: CacheConfig,
    /// External path source.
    source: Arc<dyn PathSource>,
    /// Cached state per destination.
    destinations: DashMap<IsdAsn, Arc<Mutex<DestinationPaths>>>,
}

impl PathCache {
    /// Create a new cache over `source`.
    pub fn new(source: Arc<dyn PathSource>, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            destinations: DashMap::new(),
        })
    }

    /// Ordered paths to `dst`, most preferred first.
    ///
    /// Queries the path source when nothing usable is cached. A failed query
    /// leaves the cache untouched.
    pub async fn select(&self, dst: IsdAsn) -> Result<Vec<Path>> {
        let now = SystemTime::now();
        let cached = self.get(dst);

        let stale = cached
            .as_ref()
            .map_or(true, |entry| entry.lock().needs_refresh(self.config.refresh_interval, now));

        if stale {
            self.refresh(dst).await?;
        }

        let entry = self.entry(dst);
        let guard = entry.lock();
        let ordered = guard.ordered(now);
        if ordered.is_empty() {
            return Err(LookupError::NoPaths(dst).into());
        }
        Ok(ordered)
    }

    /// Query the path source for `dst` and replace the cached candidates.
    pub async fn refresh(&self, dst: IsdAsn) -> Result<usize> {
        let now = SystemTime::now();
        let paths = self.source.query_paths(dst).await.map_err(|e| {
            let ctx = ErrorContext {
                destination: Some(dst),
                fingerprint: None,
                operation: "query_paths".into(),
            };
            warn!("Path lookup failed ({}): {}", ctx, e);
            e
        })?;

        let mut candidates: Vec<Path> = Vec::with_capacity(paths.len());
        for path in paths {
            if !path.is_expired(now) && !candidates.contains(&path) {
                candidates.push(path);
            }
        }
        if candidates.is_empty() {
            return Err(LookupError::NoPaths(dst).into());
        }

        let count = candidates.len();
        self.entry(dst).lock().store(candidates);
        debug!("Refreshed {} paths to {}", count, dst);
        Ok(count)
    }

    /// Record that `path` was used successfully towards `dst`.
    pub fn record(&self, dst: IsdAsn, path: Path) -> Result<()> {
        if !path.destination.is_unspecified() && path.destination != dst {
            return Err(Error::InvalidArgument(format!(
                "path to {} recorded for {}",
                path.destination, dst
            )));
        }

        let fingerprint = path.fingerprint().clone();
        let evicted = self
            .entry(dst)
            .lock()
            .mru
            .insert(path, self.config.max_paths_per_destination)?;

        for old in evicted {
            debug!(
                "Evicted path {} to {} (recorded {})",
                old.fingerprint().short(),
                dst,
                fingerprint.short()
            );
        }
        Ok(())
    }

    /// Snapshot of the MRU list for `dst`.
    pub fn recent(&self, dst: IsdAsn) -> Vec<Path> {
        self.get(dst)
            .map(|entry| entry.lock().mru.paths().to_vec())
            .unwrap_or_default()
    }

    /// Forget everything cached for `dst`.
    pub fn invalidate(&self, dst: IsdAsn) {
        if self.destinations.remove(&dst).is_some() {
            debug!("Invalidated paths to {}", dst);
        }
    }

    /// Drop expired paths everywhere; destinations left empty are removed.
    pub fn cleanup(&self) -> usize {
        let now = SystemTime::now();
        let mut dropped = 0;
        self.destinations.retain(|_, entry| {
            let mut guard = entry.lock();
            dropped += guard.mru.retain_unexpired(now);
            let before = guard.candidates.len();
            guard.candidates.retain(|p| !p.is_expired(now));
            dropped += before - guard.candidates.len();
            !(guard.mru.is_empty() && guard.candidates.is_empty())
        });
        dropped
    }

    pub fn clear(&self) {
        self.destinations.clear();
    }

    /// Destinations with cached state.
    pub fn destinations(&self) -> Vec<IsdAsn> {
        self.destinations.iter().map(|e| *e.key()).collect()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn get(&self, dst: IsdAsn) -> Option<Arc<Mutex<DestinationPaths>>> {
        self.destinations.get(&dst).map(|e| Arc::clone(e.value()))
    }

    fn entry(&self, dst: IsdAsn) -> Arc<Mutex<DestinationPaths>> {
        Arc::clone(self.destinations.entry(dst).or_default().value())
    }
}

impl std::fmt::Debug for PathCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathCache")
            .field("config", &self.config)
            .field("destinations", &self.destinations.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{DecodedPath, ForwardingPath, HopField, InfoField, PathMetadata};
    use crate::types::PathInterface;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::UNIX_EPOCH;

    fn dst() -> IsdAsn {
        "1-ff00:0:112".parse().unwrap()
    }

    /// Two-hop path leaving the source on `ifid`.
    fn path_via(ifid: u16, expiry_secs: u64) -> Path {
        let src: IsdAsn = "1-ff00:0:110".parse().unwrap();
        let info = InfoField {
            cons_dir: true,
            ..Default::default()
        };
        let hops = vec![
            HopField {
                cons_egress: ifid,
                ..Default::default()
            },
            HopField {
                cons_ingress: 1,
                ..Default::default()
            },
        ];
        let decoded = DecodedPath::from_segments(vec![(info, hops)]).unwrap();
        let md = PathMetadata::new(
            vec![PathInterface::new(src, ifid), PathInterface::new(dst(), 1)],
            1400,
            UNIX_EPOCH + Duration::from_secs(expiry_secs),
        );
        Path::new(src, dst(), ForwardingPath::from_decoded(decoded), Some(md)).unwrap()
    }

    fn fresh(ifid: u16) -> Path {
        path_via(ifid, 4_000_000_000)
    }

    struct CountingSource {
        inner: StaticPathSource,
        queries: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl PathSource for CountingSource {
        async fn query_paths(&self, dst: IsdAsn) -> Result<Vec<Path>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.inner.query_paths(dst).await
        }
    }

    fn cache_with(paths: Vec<Path>) -> (PathCache, Arc<CountingSource>) {
        let source = Arc::new(CountingSource {
            inner: StaticPathSource::new(),
            queries: AtomicUsize::new(0),
        });
        source.inner.set_paths(dst(), paths);
        let cache = PathCache::new(source.clone(), CacheConfig::default()).unwrap();
        (cache, source)
    }

    #[tokio::test]
    async fn test_select_source_order_then_mru() {
        let (cache, _) = cache_with(vec![fresh(1), fresh(2), fresh(3)]);

        let selected = cache.select(dst()).await.unwrap();
        assert_eq!(selected, vec![fresh(1), fresh(2), fresh(3)]);

        cache.record(dst(), fresh(3)).unwrap();
        let selected = cache.select(dst()).await.unwrap();
        assert_eq!(selected, vec![fresh(3), fresh(1), fresh(2)]);

        cache.record(dst(), fresh(2)).unwrap();
        let selected = cache.select(dst()).await.unwrap();
        assert_eq!(selected, vec![fresh(2), fresh(3), fresh(1)]);
    }

    #[tokio::test]
    async fn test_select_caches_candidates() {
        let (cache, source) = cache_with(vec![fresh(1)]);
        cache.select(dst()).await.unwrap();
        cache.select(dst()).await.unwrap();
        assert_eq!(source.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_leaves_cache_untouched() {
        let (cache, source) = cache_with(vec![]);
        source.inner.remove(dst());

        let err = cache.select(dst()).await.unwrap_err();
        assert!(matches!(err, Error::Lookup(LookupError::Unreachable { .. })));
        assert!(cache.destinations().is_empty());
    }

    #[tokio::test]
    async fn test_only_expired_candidates_is_no_paths() {
        let (cache, _) = cache_with(vec![path_via(1, 1)]);
        let err = cache.select(dst()).await.unwrap_err();
        assert!(matches!(err, Error::Lookup(LookupError::NoPaths(_))));
        assert!(cache.destinations().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_candidates_collapsed() {
        let (cache, _) = cache_with(vec![fresh(1), fresh(1), fresh(2)]);
        assert_eq!(cache.select(dst()).await.unwrap().len(), 2);
    }

    #[test]
    fn test_record_bounds_mru() {
        let (cache, _) = cache_with(vec![]);
        let config = CacheConfig {
            max_paths_per_destination: 2,
            ..Default::default()
        };
        let cache = PathCache::new(cache.source.clone(), config).unwrap();

        for ifid in 1..=5 {
            cache.record(dst(), fresh(ifid)).unwrap();
        }
        assert_eq!(cache.recent(dst()), vec![fresh(5), fresh(4)]);
    }

    #[test]
    fn test_record_wrong_destination() {
        let (cache, _) = cache_with(vec![]);
        let other: IsdAsn = "2-ff00:0:220".parse().unwrap();
        assert!(matches!(
            cache.record(other, fresh(1)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zero_max_paths_rejected() {
        let config = CacheConfig {
            max_paths_per_destination: 0,
            ..Default::default()
        };
        let source: Arc<dyn PathSource> = Arc::new(StaticPathSource::new());
        assert!(matches!(
            PathCache::new(source, config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_invalidate_and_cleanup() {
        let (cache, source) = cache_with(vec![fresh(1)]);
        cache.select(dst()).await.unwrap();
        cache.record(dst(), path_via(9, 1)).unwrap();

        assert_eq!(cache.cleanup(), 1);
        assert_eq!(cache.destinations(), vec![dst()]);

        cache.invalidate(dst());
        assert!(cache.destinations().is_empty());
        cache.select(dst()).await.unwrap();
        assert_eq!(source.queries.load(Ordering::SeqCst), 2);
    }
}

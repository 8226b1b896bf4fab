//! # TTL Cache
//!
//! A key-value cache with per-entry TTL over the fixed key namespace,
//! fronting expensive full-table reads.
//!
//! ## Entry Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cache Entry States                                │
//! │                                                                         │
//! │   absent ──── set(key, value, ttl) ────► populated                     │
//! │     ▲                                        │                          │
//! │     │                                        │ TTL elapses             │
//! │     ├──── invalidate(key) ◄──────────────────┤                          │
//! │     │                                        ▼                          │
//! │     └──────── read-as-absent ◄─────────── expired                      │
//! │                                                                         │
//! │   No "stale-but-servable" state: once TTL elapses or invalidation      │
//! │   fires, the next read is a guaranteed miss.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fault Policy
//! A cache fault must never abort the caller's primary operation. Reads that
//! fault degrade to a miss; writes that fault report `false`; corrupt
//! payloads are dropped (self-heal) and read as a miss. Faults are logged,
//! never thrown past this module.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use tally_core::keys::CacheKey;
use tally_core::types::DashboardSummary;

use crate::error::StoreResult;

// =============================================================================
// Clock
// =============================================================================

/// Time source for TTL arithmetic.
///
/// ## Why Injected?
/// TTL expiry is behavior with an invariant attached; testing it must not
/// depend on wall-clock sleeps. Production uses [`SystemClock`], tests use
/// [`ManualClock`] and advance time deterministically.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A hand-advanced clock (for testing).
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    pub fn new() -> Self {
        ManualClock {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Advances the clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock();
        *now += delta;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

// =============================================================================
// Backend
// =============================================================================

/// A fault in the cache backing store.
///
/// Stays inside this module's boundary: callers of [`Cache`] never see it.
#[derive(Debug, Clone, Error)]
#[error("cache backend fault: {0}")]
pub struct CacheFault(pub String);

/// The cache backing-store contract: string payloads with a TTL.
///
/// Mirrors what a hosted cache service offers (opaque string values,
/// expiry on write). [`MemoryBackend`] is the in-process implementation;
/// tests also use a faulting stub to exercise the degradation paths.
pub trait CacheBackend: Send + Sync {
    /// Reads a payload; expired entries read as `None`.
    fn read(&self, key: &str) -> Result<Option<String>, CacheFault>;

    /// Writes a payload expiring `ttl` from now.
    fn write(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), CacheFault>;

    /// Removes a payload; removing an absent key is a no-op.
    fn remove(&self, key: &str) -> Result<(), CacheFault>;
}

/// In-memory [`CacheBackend`] with lazy expiry.
pub struct MemoryBackend {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, Entry>>,
}

#[derive(Debug)]
struct Entry {
    payload: String,
    expires_at: Instant,
}

impl MemoryBackend {
    /// Creates a backend on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a backend on an injected clock (for testing).
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        MemoryBackend {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        MemoryBackend::new()
    }
}

impl CacheBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, CacheFault> {
        let now = self.clock.now();

        // Fast path: shared lock, unexpired hit
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    return Ok(Some(entry.payload.clone()))
                }
                Some(_) => {} // expired, fall through to evict
                None => return Ok(None),
            }
        }

        // Lazy eviction of the expired entry
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(key) {
            if entry.expires_at <= now {
                entries.remove(key);
            } else {
                // Re-populated between locks
                return Ok(Some(entry.payload.clone()));
            }
        }
        Ok(None)
    }

    fn write(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), CacheFault> {
        let expires_at = self.clock.now() + ttl;
        self.entries.write().insert(
            key.to_string(),
            Entry {
                payload: payload.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheFault> {
        self.entries.write().remove(key);
        Ok(())
    }
}

// =============================================================================
// Cache Value
// =============================================================================

/// A payload type the cache can carry.
///
/// `worth_caching` decides whether a freshly computed value gets stored:
/// empty listings are cheap to recompute and usually mean "table not seeded
/// yet", so pinning them would hide the first real rows for a full TTL.
pub trait CacheValue: Serialize + DeserializeOwned {
    /// Whether a freshly computed value should be stored.
    fn worth_caching(&self) -> bool {
        true
    }
}

impl<T: Serialize + DeserializeOwned> CacheValue for Vec<T> {
    fn worth_caching(&self) -> bool {
        !self.is_empty()
    }
}

impl CacheValue for DashboardSummary {}

impl CacheValue for serde_json::Value {
    fn worth_caching(&self) -> bool {
        !self.is_null()
    }
}

// =============================================================================
// Cache Service
// =============================================================================

/// The typed cache service over a [`CacheBackend`].
///
/// ## Usage
/// ```rust
/// use std::time::Duration;
/// use tally_core::keys::CacheKey;
/// use tally_store::cache::Cache;
///
/// let cache = Cache::in_memory();
/// let stored = cache.set(CacheKey::CustomersAll, &vec!["CUST-001".to_string()], Duration::from_secs(300));
/// assert!(stored);
///
/// let names: Option<Vec<String>> = cache.get(CacheKey::CustomersAll);
/// assert_eq!(names.unwrap(), vec!["CUST-001".to_string()]);
/// ```
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
}

impl Cache {
    /// Creates a cache over an explicit backend.
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Cache { backend }
    }

    /// Creates a cache over a fresh [`MemoryBackend`].
    pub fn in_memory() -> Self {
        Cache::new(Arc::new(MemoryBackend::new()))
    }

    /// Returns the cached value, or `None` on miss, expiry, fault, or shape
    /// mismatch.
    ///
    /// A payload that fails to deserialize as `T` is treated as corrupt:
    /// dropped from the backend (self-heal) and reported as a miss.
    pub fn get<T: CacheValue>(&self, key: CacheKey) -> Option<T> {
        let payload = match self.backend.read(key.as_str()) {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(fault) => {
                warn!(%key, %fault, "cache read fault, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%key, error = %err, "corrupt cache payload, dropping entry");
                if let Err(fault) = self.backend.remove(key.as_str()) {
                    warn!(%key, %fault, "failed to drop corrupt entry");
                }
                None
            }
        }
    }

    /// Stores a value with a TTL.
    ///
    /// ## Returns
    /// `true` if stored. Never fails: null payloads are rejected with
    /// `false`, serialization and backend faults are logged and reported as
    /// `false`.
    pub fn set<T: CacheValue>(&self, key: CacheKey, value: &T, ttl: Duration) -> bool {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%key, error = %err, "cache serialization fault, skipping store");
                return false;
            }
        };

        if payload == "null" {
            warn!(%key, "refusing to cache null payload");
            return false;
        }

        match self.backend.write(key.as_str(), &payload, ttl) {
            Ok(()) => {
                debug!(%key, ttl_s = ttl.as_secs(), size = payload.len(), "cache populated");
                true
            }
            Err(fault) => {
                warn!(%key, %fault, "cache write fault, skipping store");
                false
            }
        }
    }

    /// Removes one entry. Idempotent: an absent key is a no-op.
    pub fn invalidate(&self, key: CacheKey) {
        if let Err(fault) = self.backend.remove(key.as_str()) {
            warn!(%key, %fault, "cache invalidation fault");
        }
    }

    /// Removes several entries.
    pub fn invalidate_many(&self, keys: &[CacheKey]) {
        for key in keys {
            self.invalidate(*key);
        }
    }

    /// Removes every entry in the key namespace.
    pub fn invalidate_all(&self) {
        self.invalidate_many(&CacheKey::ALL);
    }

    /// Cache-aside read: return the cached value on hit, otherwise compute,
    /// store (if worth caching), and return.
    ///
    /// ## Failure Semantics
    /// - `producer` errors propagate to the caller untouched - no silent
    ///   empty-result substitution
    /// - cache faults (read or store) degrade to calling `producer` and
    ///   returning its result directly
    pub fn get_or_compute<T, F>(&self, key: CacheKey, ttl: Duration, producer: F) -> StoreResult<T>
    where
        T: CacheValue,
        F: FnOnce() -> StoreResult<T>,
    {
        if let Some(hit) = self.get::<T>(key) {
            debug!(%key, "cache hit");
            return Ok(hit);
        }

        debug!(%key, "cache miss, computing");
        let value = producer()?;
        if value.worth_caching() {
            self.set(key, &value, ttl);
        }
        Ok(value)
    }

    /// Reports per-key cache status for operational visibility.
    ///
    /// Best-effort and infallible: faults or unparseable payloads show up as
    /// misses / unknown shapes, never as errors.
    pub fn stats(&self) -> Vec<KeyStats> {
        CacheKey::ALL
            .iter()
            .map(|&key| {
                let payload = self.backend.read(key.as_str()).ok().flatten();
                match payload {
                    Some(payload) => {
                        let (shape, len) = classify(&payload);
                        KeyStats {
                            key,
                            hit: true,
                            size_bytes: payload.len(),
                            shape,
                            len,
                        }
                    }
                    None => KeyStats {
                        key,
                        hit: false,
                        size_bytes: 0,
                        shape: None,
                        len: None,
                    },
                }
            })
            .collect()
    }
}

/// Classifies a JSON payload for the stats probe.
fn classify(payload: &str) -> (Option<ValueShape>, Option<usize>) {
    match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(serde_json::Value::Array(items)) => (Some(ValueShape::Sequence), Some(items.len())),
        Ok(serde_json::Value::Object(_)) => (Some(ValueShape::Object), None),
        Ok(_) => (Some(ValueShape::Scalar), None),
        Err(_) => (None, None),
    }
}

/// The shape of a cached payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// A JSON array (list of records).
    Sequence,
    /// A JSON object (aggregate).
    Object,
    /// A bare scalar.
    Scalar,
}

/// One row of the cache statistics probe.
#[derive(Debug, Clone, Serialize)]
pub struct KeyStats {
    /// The key being probed.
    pub key: CacheKey,

    /// Whether a live entry is present.
    pub hit: bool,

    /// Approximate serialized size in bytes (0 on miss).
    pub size_bytes: usize,

    /// Payload shape, when present and parseable.
    pub shape: Option<ValueShape>,

    /// Element count for sequence-shaped payloads.
    pub len: Option<usize>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tally_core::types::Customer;

    /// A backend that faults on every operation.
    struct FlakyBackend;

    impl CacheBackend for FlakyBackend {
        fn read(&self, _key: &str) -> Result<Option<String>, CacheFault> {
            Err(CacheFault("simulated read fault".to_string()))
        }

        fn write(&self, _key: &str, _payload: &str, _ttl: Duration) -> Result<(), CacheFault> {
            Err(CacheFault("simulated write fault".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), CacheFault> {
            Err(CacheFault("simulated remove fault".to_string()))
        }
    }

    // Fixed instant so fixtures compare equal across calls
    fn fixture_time() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    fn customers() -> Vec<Customer> {
        vec![
            Customer {
                id: "CUST-001".to_string(),
                name: "Bilal".to_string(),
                phone: Some("0300-1234567".to_string()),
                balance_cents: 125000,
                created_at: fixture_time(),
            },
            Customer {
                id: "CUST-002".to_string(),
                name: "Sana".to_string(),
                phone: None,
                balance_cents: 0,
                created_at: fixture_time(),
            },
        ]
    }

    fn dashboard() -> DashboardSummary {
        DashboardSummary {
            sales_today_cents: 1_450_000,
            sale_count_today: 17,
            low_stock_count: 3,
            total_debt_cents: 620_000,
            generated_at: fixture_time(),
        }
    }

    #[test]
    fn test_round_trip_sequence_and_aggregate() {
        let cache = Cache::in_memory();
        let ttl = Duration::from_secs(300);

        assert!(cache.set(CacheKey::CustomersAll, &customers(), ttl));
        let back: Vec<Customer> = cache.get(CacheKey::CustomersAll).unwrap();
        assert_eq!(back, customers());

        assert!(cache.set(CacheKey::DashboardAggregate, &dashboard(), ttl));
        let agg: DashboardSummary = cache.get(CacheKey::DashboardAggregate).unwrap();
        assert_eq!(agg.sale_count_today, 17);
    }

    #[test]
    fn test_ttl_expiry_reads_as_absent() {
        let clock = Arc::new(ManualClock::new());
        let cache = Cache::new(Arc::new(MemoryBackend::with_clock(clock.clone())));

        cache.set(CacheKey::CustomersAll, &customers(), Duration::from_secs(1));
        assert!(cache.get::<Vec<Customer>>(CacheKey::CustomersAll).is_some());

        clock.advance(Duration::from_millis(1100));
        assert!(cache.get::<Vec<Customer>>(CacheKey::CustomersAll).is_none());
    }

    #[test]
    fn test_entry_survives_until_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = Cache::new(Arc::new(MemoryBackend::with_clock(clock.clone())));

        cache.set(CacheKey::CustomersAll, &customers(), Duration::from_secs(300));
        clock.advance(Duration::from_secs(299));
        assert!(cache.get::<Vec<Customer>>(CacheKey::CustomersAll).is_some());
    }

    #[test]
    fn test_set_rejects_null_payload() {
        let cache = Cache::in_memory();
        let stored = cache.set(
            CacheKey::DashboardAggregate,
            &serde_json::Value::Null,
            Duration::from_secs(60),
        );
        assert!(!stored);
        assert!(cache
            .get::<serde_json::Value>(CacheKey::DashboardAggregate)
            .is_none());
    }

    #[test]
    fn test_corrupt_payload_self_heals() {
        let backend = Arc::new(MemoryBackend::new());
        let cache = Cache::new(backend.clone());

        backend
            .write(
                CacheKey::CustomersAll.as_str(),
                "{not json",
                Duration::from_secs(300),
            )
            .unwrap();

        // Read as miss...
        assert!(cache.get::<Vec<Customer>>(CacheKey::CustomersAll).is_none());
        // ...and the corrupt entry is gone
        assert_eq!(backend.read(CacheKey::CustomersAll.as_str()).unwrap(), None);
    }

    #[test]
    fn test_shape_mismatch_reads_as_miss() {
        let cache = Cache::in_memory();
        // An aggregate stored where a sequence is expected
        cache.set(CacheKey::CustomersAll, &dashboard(), Duration::from_secs(300));
        assert!(cache.get::<Vec<Customer>>(CacheKey::CustomersAll).is_none());
    }

    #[test]
    fn test_invalidate_is_idempotent() {
        let cache = Cache::in_memory();
        cache.invalidate(CacheKey::LowStock); // absent: no-op, no panic
        cache.set(CacheKey::LowStock, &customers(), Duration::from_secs(60));
        cache.invalidate(CacheKey::LowStock);
        cache.invalidate(CacheKey::LowStock);
        assert!(cache.get::<Vec<Customer>>(CacheKey::LowStock).is_none());
    }

    #[test]
    fn test_invalidate_all_clears_namespace() {
        let cache = Cache::in_memory();
        cache.set(CacheKey::CustomersAll, &customers(), Duration::from_secs(60));
        cache.set(CacheKey::DashboardAggregate, &dashboard(), Duration::from_secs(60));
        cache.invalidate_all();
        assert!(cache.get::<Vec<Customer>>(CacheKey::CustomersAll).is_none());
        assert!(cache
            .get::<DashboardSummary>(CacheKey::DashboardAggregate)
            .is_none());
    }

    #[test]
    fn test_get_or_compute_hit_skips_producer() {
        let cache = Cache::in_memory();
        cache.set(CacheKey::CustomersAll, &customers(), Duration::from_secs(300));

        let result: Vec<Customer> = cache
            .get_or_compute(CacheKey::CustomersAll, Duration::from_secs(300), || {
                panic!("producer must not run on a hit")
            })
            .unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_get_or_compute_miss_stores_and_returns() {
        let cache = Cache::in_memory();
        let result: Vec<Customer> = cache
            .get_or_compute(CacheKey::CustomersAll, Duration::from_secs(300), || {
                Ok(customers())
            })
            .unwrap();
        assert_eq!(result, customers());
        // Stored: a second read hits without a producer
        assert!(cache.get::<Vec<Customer>>(CacheKey::CustomersAll).is_some());
    }

    #[test]
    fn test_get_or_compute_does_not_pin_empty_listings() {
        let cache = Cache::in_memory();
        let empty: Vec<Customer> = cache
            .get_or_compute(CacheKey::CustomersAll, Duration::from_secs(300), || {
                Ok(Vec::new())
            })
            .unwrap();
        assert!(empty.is_empty());
        // Not stored: the next read must recompute
        assert!(cache.get::<Vec<Customer>>(CacheKey::CustomersAll).is_none());
    }

    #[test]
    fn test_get_or_compute_propagates_producer_error() {
        let cache = Cache::in_memory();
        let err = cache
            .get_or_compute::<Vec<Customer>, _>(
                CacheKey::CustomersAll,
                Duration::from_secs(300),
                || Err(crate::error::StoreError::backing("fetch blew up")),
            )
            .unwrap_err();
        assert!(matches!(err, crate::error::StoreError::Backing(_)));
    }

    #[test]
    fn test_get_or_compute_survives_total_backend_failure() {
        // Backend faults on read AND write: the producer's result must still
        // come back, without an error
        let cache = Cache::new(Arc::new(FlakyBackend));
        let result: Vec<Customer> = cache
            .get_or_compute(CacheKey::CustomersAll, Duration::from_secs(300), || {
                Ok(customers())
            })
            .unwrap();
        assert_eq!(result, customers());
    }

    #[test]
    fn test_stats_reports_shapes_and_misses() {
        let cache = Cache::in_memory();
        cache.set(CacheKey::CustomersAll, &customers(), Duration::from_secs(60));
        cache.set(CacheKey::DashboardAggregate, &dashboard(), Duration::from_secs(60));

        let stats = cache.stats();
        assert_eq!(stats.len(), CacheKey::ALL.len());

        let customers_row = stats
            .iter()
            .find(|s| s.key == CacheKey::CustomersAll)
            .unwrap();
        assert!(customers_row.hit);
        assert_eq!(customers_row.shape, Some(ValueShape::Sequence));
        assert_eq!(customers_row.len, Some(2));
        assert!(customers_row.size_bytes > 0);

        let dash_row = stats
            .iter()
            .find(|s| s.key == CacheKey::DashboardAggregate)
            .unwrap();
        assert_eq!(dash_row.shape, Some(ValueShape::Object));
        assert_eq!(dash_row.len, None);

        let miss_row = stats.iter().find(|s| s.key == CacheKey::LowStock).unwrap();
        assert!(!miss_row.hit);
        assert_eq!(miss_row.size_bytes, 0);
    }

    #[test]
    fn test_stats_never_fails_on_faulty_backend() {
        let cache = Cache::new(Arc::new(FlakyBackend));
        let stats = cache.stats();
        assert!(stats.iter().all(|s| !s.hit));
    }
}

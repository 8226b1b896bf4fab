//! # Sequential ID Allocator
//!
//! Produces unique, ordered, human-readable `PREFIX-NNN` identifiers, safe
//! under concurrent invocation from independent sessions sharing one backing
//! table.
//!
//! ## How An Allocation Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              allocate("Sales", "Sale_ID", SALE)                         │
//! │                                                                         │
//! │  acquire lock (bounded 30 s wait) ── timeout ──► Busy error            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  read_column("Sales", "Sale_ID")                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  [SALE-001, SALE-007, "refund?", SALE-003, 42, ""]                     │
//! │       │         │                                                       │
//! │       │         └── non-matching cells skipped, never errors            │
//! │       ▼                                                                 │
//! │  max = 7  →  next = 8  →  SALE-008                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  release lock (guard drop - every exit path)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Full Scan By Design
//! There is no persisted counter. Every allocation re-derives the maximum
//! from the live column, which tolerates manual edits, externally inserted
//! rows, and deletions without drifting - at the cost of an O(n) scan per
//! allocation. Deleting the highest-numbered record means its number is
//! legitimately reissued on the next call.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use tally_core::ident::{Prefix, RecordId};

use crate::error::{StoreError, StoreResult};
use crate::lock::AllocatorLock;
use crate::table::{Cell, RecordStore};

// =============================================================================
// Configuration
// =============================================================================

/// Allocator timing configuration.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use tally_store::allocator::AllocatorConfig;
///
/// let config = AllocatorConfig::new()
///     .lock_wait(Duration::from_secs(10))
///     .max_attempts(5);
/// ```
#[derive(Debug, Clone)]
pub struct AllocatorConfig {
    /// Bounded wait for the allocator lock.
    /// Default: 30 seconds
    pub lock_wait: Duration,

    /// Base backoff between retry attempts; attempt N sleeps N × this.
    /// Default: 500 ms
    pub retry_backoff: Duration,

    /// Attempt budget for `allocate_with_retry`.
    /// Default: 3
    pub max_attempts: u32,
}

impl AllocatorConfig {
    /// Creates a configuration with the defaults above.
    pub fn new() -> Self {
        AllocatorConfig {
            lock_wait: Duration::from_secs(30),
            retry_backoff: Duration::from_millis(500),
            max_attempts: 3,
        }
    }

    /// Sets the bounded lock wait.
    pub fn lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    /// Sets the base retry backoff.
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Sets the retry attempt budget.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        AllocatorConfig::new()
    }
}

// =============================================================================
// ID Allocator
// =============================================================================

/// The single allocation entry point for the whole system.
///
/// One instance (one lock) serializes allocation across all entity types;
/// unrelated prefixes contend on purpose - a known throughput cost accepted
/// for simplicity.
///
/// ## Usage
/// ```rust,ignore
/// let allocator = IdAllocator::new(store, lock);
/// let sale_prefix = Prefix::new("SALE")?;
/// let id = allocator.allocate("Sales", "Sale_ID", &sale_prefix).await?;
/// ```
#[derive(Debug)]
pub struct IdAllocator<S> {
    store: Arc<S>,
    lock: Arc<AllocatorLock>,
    config: AllocatorConfig,
}

// Manual impl: a derive would demand S: Clone, but the store is shared
// through the Arc.
impl<S> Clone for IdAllocator<S> {
    fn clone(&self) -> Self {
        IdAllocator {
            store: Arc::clone(&self.store),
            lock: Arc::clone(&self.lock),
            config: self.config.clone(),
        }
    }
}

impl<S: RecordStore> IdAllocator<S> {
    /// Creates an allocator with default timing.
    pub fn new(store: Arc<S>, lock: Arc<AllocatorLock>) -> Self {
        Self::with_config(store, lock, AllocatorConfig::new())
    }

    /// Creates an allocator with explicit timing configuration.
    pub fn with_config(store: Arc<S>, lock: Arc<AllocatorLock>, config: AllocatorConfig) -> Self {
        IdAllocator {
            store,
            lock,
            config,
        }
    }

    /// Returns the shared lock (for diagnostics and tests).
    pub fn lock(&self) -> &Arc<AllocatorLock> {
        &self.lock
    }

    /// Allocates the next identifier for `prefix` in `table.id_column`.
    ///
    /// ## Behavior
    /// Acquires the global lock (failing with [`StoreError::Busy`] after the
    /// bounded wait), scans the live column for the highest matching suffix,
    /// and returns `max + 1`. Cells that do not parse as `PREFIX-NNN` are
    /// skipped. The lock is released on every exit path.
    ///
    /// ## Side Effects
    /// None - the caller persists the record. When concurrent writers share
    /// the table, persist inside the same critical section via
    /// [`IdAllocator::allocate_and_persist`], otherwise a second session can
    /// observe the same maximum before your row lands.
    pub async fn allocate(
        &self,
        table: &str,
        id_column: &str,
        prefix: &Prefix,
    ) -> StoreResult<RecordId> {
        let _guard = self.lock.acquire(self.config.lock_wait).await?;
        let next = self.next_suffix(table, id_column, prefix)?;
        let id = RecordId::new(prefix.clone(), next);
        debug!(table, id_column, id = %id, "allocated id");
        Ok(id)
    }

    /// Allocates `count` consecutive identifiers under one lock hold.
    ///
    /// ## Atomicity
    /// The whole range `max+1 ..= max+count` is computed inside a single
    /// critical section. `count == 0` yields an empty allocation.
    ///
    /// ## Side Effects
    /// None - like [`IdAllocator::allocate`], nothing is persisted, so the
    /// range is only reserved against allocations that run while the lock is
    /// held. When concurrent writers share the table, persist the rows inside
    /// the same critical section via
    /// [`IdAllocator::allocate_batch_and_persist`].
    pub async fn allocate_batch(
        &self,
        table: &str,
        id_column: &str,
        prefix: &Prefix,
        count: usize,
    ) -> StoreResult<Vec<RecordId>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let _guard = self.lock.acquire(self.config.lock_wait).await?;
        let first = self.next_suffix(table, id_column, prefix)?;
        let ids: Vec<RecordId> = (0..count as u64)
            .map(|offset| RecordId::new(prefix.clone(), first + offset))
            .collect();
        debug!(
            table,
            id_column,
            first = %ids[0],
            count,
            "allocated id batch"
        );
        Ok(ids)
    }

    /// Allocates `count` consecutive identifiers and persists their rows in
    /// one critical section.
    ///
    /// ## The Safe Batch Write Path
    /// The batch form of [`IdAllocator::allocate_and_persist`]: every row is
    /// appended before the lock is released, so the whole range is genuinely
    /// reserved - any later allocation observes all of it and lands strictly
    /// after. `count == 0` appends nothing and yields an empty allocation.
    pub async fn allocate_batch_and_persist<F>(
        &self,
        table: &str,
        id_column: &str,
        prefix: &Prefix,
        count: usize,
        mut build_row: F,
    ) -> StoreResult<Vec<RecordId>>
    where
        F: FnMut(&RecordId) -> Vec<Cell>,
    {
        if count == 0 {
            return Ok(Vec::new());
        }

        let _guard = self.lock.acquire(self.config.lock_wait).await?;
        let first = self.next_suffix(table, id_column, prefix)?;
        let ids: Vec<RecordId> = (0..count as u64)
            .map(|offset| RecordId::new(prefix.clone(), first + offset))
            .collect();
        for id in &ids {
            self.store.append_row(table, build_row(id))?;
        }
        debug!(
            table,
            id_column,
            first = %ids[0],
            count,
            "allocated and persisted id batch"
        );
        Ok(ids)
    }

    /// Allocates an identifier and persists its row in one critical section.
    ///
    /// ## The Safe Write Path
    /// ```text
    /// lock ── scan max ── build row ── append ── unlock ── return id
    /// ```
    /// Because the append happens before the lock is released, a concurrent
    /// allocation is guaranteed to observe this row and therefore a higher
    /// maximum. This is the path the service layer's `create_record` uses.
    pub async fn allocate_and_persist<F>(
        &self,
        table: &str,
        id_column: &str,
        prefix: &Prefix,
        build_row: F,
    ) -> StoreResult<RecordId>
    where
        F: FnOnce(&RecordId) -> Vec<Cell>,
    {
        let _guard = self.lock.acquire(self.config.lock_wait).await?;
        let next = self.next_suffix(table, id_column, prefix)?;
        let id = RecordId::new(prefix.clone(), next);
        self.store.append_row(table, build_row(&id))?;
        debug!(table, id_column, id = %id, "allocated and persisted id");
        Ok(id)
    }

    /// [`IdAllocator::allocate`] with linear-backoff retries on transient
    /// failures.
    ///
    /// ## Retry Discipline
    /// - Retries only transient errors (`Busy`, `Backing`); schema errors
    ///   fail immediately
    /// - Attempt N sleeps N × `retry_backoff` before the next try
    /// - After the budget is spent, fails with
    ///   [`StoreError::RetriesExhausted`] naming the attempt count
    pub async fn allocate_with_retry(
        &self,
        table: &str,
        id_column: &str,
        prefix: &Prefix,
    ) -> StoreResult<RecordId> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.allocate(table, id_column, prefix).await {
                Ok(id) => return Ok(id),
                Err(err) if err.is_retryable() && attempt < self.config.max_attempts => {
                    let backoff = self.config.retry_backoff * attempt;
                    warn!(
                        table,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "allocation attempt failed, backing off"
                    );
                    sleep(backoff).await;
                }
                Err(err) if err.is_retryable() => {
                    return Err(StoreError::RetriesExhausted {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Scans the live column and returns `max + 1` for the prefix.
    ///
    /// Caller must hold the allocator lock.
    fn next_suffix(&self, table: &str, id_column: &str, prefix: &Prefix) -> StoreResult<u64> {
        let cells = self.store.read_column(table, id_column)?;
        let max = cells
            .iter()
            .filter_map(Cell::as_text)
            .filter_map(|raw| RecordId::parse_suffix(raw, prefix))
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::MemoryStore;

    /// A store whose reads always fault, for lock-release and retry tests.
    struct FaultyStore;

    impl RecordStore for FaultyStore {
        fn read_column(&self, _table: &str, _column: &str) -> StoreResult<Vec<Cell>> {
            Err(StoreError::backing("simulated read fault"))
        }

        fn append_row(&self, _table: &str, _values: Vec<Cell>) -> StoreResult<()> {
            Err(StoreError::backing("simulated write fault"))
        }

        fn update_cell(
            &self,
            _table: &str,
            _row: usize,
            _column: &str,
            _value: Cell,
        ) -> StoreResult<()> {
            Err(StoreError::backing("simulated write fault"))
        }
    }

    fn quick_config() -> AllocatorConfig {
        AllocatorConfig::new()
            .lock_wait(Duration::from_millis(50))
            .retry_backoff(Duration::from_millis(1))
    }

    fn fresh_inventory() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.create_table("Inventory", &["Item_ID", "Name", "Quantity"]);
        Arc::new(store)
    }

    fn allocator(store: Arc<MemoryStore>) -> IdAllocator<MemoryStore> {
        IdAllocator::with_config(
            store,
            Arc::new(AllocatorLock::new("tally-allocator")),
            quick_config(),
        )
    }

    fn item_prefix() -> Prefix {
        Prefix::new("ITEM").unwrap()
    }

    #[tokio::test]
    async fn test_fresh_table_starts_at_one() {
        let alloc = allocator(fresh_inventory());
        let id = alloc
            .allocate("Inventory", "Item_ID", &item_prefix())
            .await
            .unwrap();
        assert_eq!(id.to_string(), "ITEM-001");
    }

    #[tokio::test]
    async fn test_next_is_max_plus_one_not_row_count() {
        let store = fresh_inventory();
        // Sparse suffixes: max is 40, row count is 2
        store
            .append_row("Inventory", vec![Cell::text("ITEM-003")])
            .unwrap();
        store
            .append_row("Inventory", vec![Cell::text("ITEM-040")])
            .unwrap();

        let alloc = allocator(store);
        let id = alloc
            .allocate("Inventory", "Item_ID", &item_prefix())
            .await
            .unwrap();
        assert_eq!(id.to_string(), "ITEM-041");
    }

    #[tokio::test]
    async fn test_scan_skips_malformed_and_foreign_cells() {
        let store = fresh_inventory();
        for cell in [
            Cell::text("ITEM-012"),
            Cell::text("SALE-099"),    // foreign prefix
            Cell::text("ITEM-"),       // no digits
            Cell::text("ITEM-twelve"), // non-numeric
            Cell::Number(400.0),       // stray number
            Cell::Empty,               // blank row
        ] {
            store.append_row("Inventory", vec![cell]).unwrap();
        }

        let alloc = allocator(store);
        let id = alloc
            .allocate("Inventory", "Item_ID", &item_prefix())
            .await
            .unwrap();
        assert_eq!(id.to_string(), "ITEM-013");
    }

    #[tokio::test]
    async fn test_gap_tolerance_reissues_freed_maximum() {
        let store = fresh_inventory();
        store
            .append_row("Inventory", vec![Cell::text("ITEM-001")])
            .unwrap();
        store
            .append_row("Inventory", vec![Cell::text("ITEM-002")])
            .unwrap();

        // Delete the highest-numbered record: the counter is derived from
        // live data, so 2 becomes free again.
        store.delete_row("Inventory", 1).unwrap();

        let alloc = allocator(store);
        let id = alloc
            .allocate("Inventory", "Item_ID", &item_prefix())
            .await
            .unwrap();
        assert_eq!(id.to_string(), "ITEM-002");
    }

    #[tokio::test]
    async fn test_interior_gaps_are_not_refilled() {
        let store = fresh_inventory();
        for suffix in ["ITEM-001", "ITEM-002", "ITEM-005"] {
            store.append_row("Inventory", vec![Cell::text(suffix)]).unwrap();
        }

        let alloc = allocator(store);
        let id = alloc
            .allocate("Inventory", "Item_ID", &item_prefix())
            .await
            .unwrap();
        // Max is 5, so next is 6; interior holes 3 and 4 stay holes
        assert_eq!(id.to_string(), "ITEM-006");
    }

    #[tokio::test]
    async fn test_absurd_suffix_cell_is_junk_not_the_maximum() {
        // A hand-typed cell holding u64::MAX parses as a number; if the scan
        // took it as the live maximum, the +1 would overflow. It must be
        // skipped like any other junk cell.
        let store = fresh_inventory();
        store
            .append_row("Inventory", vec![Cell::text("ITEM-18446744073709551615")])
            .unwrap();
        store
            .append_row("Inventory", vec![Cell::text("ITEM-004")])
            .unwrap();

        let alloc = allocator(store);
        let id = alloc
            .allocate("Inventory", "Item_ID", &item_prefix())
            .await
            .unwrap();
        assert_eq!(id.to_string(), "ITEM-005");
    }

    #[tokio::test]
    async fn test_suffix_widens_past_999() {
        let store = fresh_inventory();
        store
            .append_row("Inventory", vec![Cell::text("ITEM-999")])
            .unwrap();

        let alloc = allocator(store);
        let id = alloc
            .allocate("Inventory", "Item_ID", &item_prefix())
            .await
            .unwrap();
        assert_eq!(id.to_string(), "ITEM-1000");
    }

    #[tokio::test]
    async fn test_missing_column_is_fatal_schema_error() {
        let alloc = allocator(fresh_inventory());
        let err = alloc
            .allocate("Inventory", "SKU", &item_prefix())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ColumnNotFound { .. }));
    }

    #[tokio::test]
    async fn test_batch_is_contiguous() {
        let store = fresh_inventory();
        store
            .append_row("Inventory", vec![Cell::text("ITEM-003")])
            .unwrap();

        let alloc = allocator(store);
        let batch = alloc
            .allocate_batch("Inventory", "Item_ID", &item_prefix(), 4)
            .await
            .unwrap();
        let rendered: Vec<String> = batch.iter().map(RecordId::to_string).collect();
        assert_eq!(rendered, ["ITEM-004", "ITEM-005", "ITEM-006", "ITEM-007"]);
    }

    #[tokio::test]
    async fn test_persisted_batch_reserves_its_range() {
        let store = fresh_inventory();
        let alloc = allocator(Arc::clone(&store));
        let prefix = item_prefix();

        let batch = alloc
            .allocate_batch_and_persist("Inventory", "Item_ID", &prefix, 5, |id| {
                vec![Cell::text(id.to_string())]
            })
            .await
            .unwrap();
        let rendered: Vec<String> = batch.iter().map(RecordId::to_string).collect();
        assert_eq!(
            rendered,
            ["ITEM-001", "ITEM-002", "ITEM-003", "ITEM-004", "ITEM-005"]
        );
        assert_eq!(store.row_count("Inventory").unwrap(), 5);

        // The rows landed inside the critical section, so a follow-up
        // allocation must land strictly after the range - nothing in it can
        // ever be reissued.
        let next = alloc
            .allocate("Inventory", "Item_ID", &prefix)
            .await
            .unwrap();
        assert_eq!(next.to_string(), "ITEM-006");
    }

    #[tokio::test]
    async fn test_persisted_batch_of_zero_appends_nothing() {
        let store = fresh_inventory();
        let alloc = allocator(Arc::clone(&store));
        let batch = alloc
            .allocate_batch_and_persist("Inventory", "Item_ID", &item_prefix(), 0, |id| {
                vec![Cell::text(id.to_string())]
            })
            .await
            .unwrap();
        assert!(batch.is_empty());
        assert_eq!(store.row_count("Inventory").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_of_zero_is_empty() {
        let alloc = allocator(fresh_inventory());
        let batch = alloc
            .allocate_batch("Inventory", "Item_ID", &item_prefix(), 0)
            .await
            .unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_lock_released_after_scan_failure() {
        // Two allocators share one lock; the first one's store faults
        // mid-scan. If the lock leaked, the second allocation would time out.
        let lock = Arc::new(AllocatorLock::new("tally-allocator"));
        let faulty = IdAllocator::with_config(Arc::new(FaultyStore), Arc::clone(&lock), quick_config());

        let err = faulty
            .allocate("Inventory", "Item_ID", &item_prefix())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backing(_)));

        let store = fresh_inventory();
        let healthy = IdAllocator::with_config(store, lock, quick_config());
        let id = healthy
            .allocate("Inventory", "Item_ID", &item_prefix())
            .await
            .unwrap();
        assert_eq!(id.to_string(), "ITEM-001");
    }

    #[tokio::test]
    async fn test_retry_exhaustion_names_attempt_count() {
        let alloc = IdAllocator::with_config(
            Arc::new(FaultyStore),
            Arc::new(AllocatorLock::new("tally-allocator")),
            quick_config(),
        );

        let err = alloc
            .allocate_with_retry("Inventory", "Item_ID", &item_prefix())
            .await
            .unwrap_err();
        match err {
            StoreError::RetriesExhausted { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, StoreError::Backing(_)));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_retry_does_not_touch_schema_errors() {
        let alloc = allocator(fresh_inventory());
        // Wrong column: must fail on the first attempt, no retries
        let err = alloc
            .allocate_with_retry("Inventory", "SKU", &item_prefix())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ColumnNotFound { .. }));
    }

    #[tokio::test]
    async fn test_retry_succeeds_once_lock_frees() {
        let store = fresh_inventory();
        let lock = Arc::new(AllocatorLock::new("tally-allocator"));
        let alloc = IdAllocator::with_config(
            Arc::clone(&store),
            Arc::clone(&lock),
            quick_config().max_attempts(5),
        );

        // Hold the lock long enough to burn the first attempt
        let guard = lock.acquire(Duration::from_millis(50)).await.unwrap();
        let handle = {
            let alloc = alloc.clone();
            tokio::spawn(async move {
                alloc
                    .allocate_with_retry("Inventory", "Item_ID", &Prefix::new("ITEM").unwrap())
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(70)).await;
        drop(guard);

        let id = handle.await.unwrap().unwrap();
        assert_eq!(id.to_string(), "ITEM-001");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_persisting_allocations_are_unique() {
        let store = fresh_inventory();
        let alloc = IdAllocator::with_config(
            Arc::clone(&store),
            Arc::new(AllocatorLock::new("tally-allocator")),
            AllocatorConfig::new(),
        );

        let mut handles = Vec::new();
        for _ in 0..24 {
            let alloc = alloc.clone();
            handles.push(tokio::spawn(async move {
                alloc
                    .allocate_and_persist(
                        "Inventory",
                        "Item_ID",
                        &Prefix::new("ITEM").unwrap(),
                        |id| vec![Cell::text(id.to_string())],
                    )
                    .await
            }));
        }

        let mut suffixes = Vec::new();
        for handle in handles {
            suffixes.push(handle.await.unwrap().unwrap().number());
        }
        suffixes.sort_unstable();

        // Pairwise distinct and exactly the range 1..=24
        let expected: Vec<u64> = (1..=24).collect();
        assert_eq!(suffixes, expected);
        assert_eq!(store.row_count("Inventory").unwrap(), 24);
    }
}

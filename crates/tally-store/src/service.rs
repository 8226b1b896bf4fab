//! # Service Layer
//!
//! Wires the record store, the allocator, and the cached views into the one
//! write path business modules call.
//!
//! ## A Write, End to End
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   create_record("Customers", "Customer_ID", CUST, Customer, row_fn)    │
//! │                                                                         │
//! │   acquire allocator lock (bounded 30 s)                                │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   scan Customer_ID column → max → CUST-<max+1>                         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   append row (still inside the critical section)                       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   release lock                                                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   invalidate customers-all, customer-debt, dashboard-aggregate         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   return CUST-<max+1>                                                  │
//! │                                                                         │
//! │   Invalidation is synchronous and unconditional on the write having    │
//! │   been applied - never batched, never deferred.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Multi-Table Writes
//! A sale that touches the sales, inventory, customer, and financial tables
//! is a series of single-table writes, each firing its own invalidation set.
//! There is no cross-table transaction or compensation: a failure partway
//! leaves the earlier writes in place (best-effort, by decision - the
//! backing store offers appends and single-cell updates only).

use std::sync::Arc;

use tally_core::ident::{Prefix, RecordId};
use tally_core::keys::Mutation;

use crate::allocator::{AllocatorConfig, IdAllocator};
use crate::cache::Cache;
use crate::error::StoreResult;
use crate::lock::AllocatorLock;
use crate::table::{Cell, RecordStore};
use crate::views::Views;

/// Name of the single process-wide allocator lock.
pub const ALLOCATOR_LOCK_NAME: &str = "tally-allocator";

// =============================================================================
// Pos Core
// =============================================================================

/// The assembled core: one store, one lock, one allocator, one cache.
///
/// ## Usage
/// ```rust
/// use std::sync::Arc;
/// use tally_core::ident::Prefix;
/// use tally_core::keys::Mutation;
/// use tally_store::service::PosCore;
/// use tally_store::table::{Cell, MemoryStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = Arc::new(MemoryStore::new());
/// store.create_table("Customers", &["Customer_ID", "Name"]);
///
/// let core = PosCore::new(store);
/// let cust = Prefix::new("CUST").unwrap();
/// let id = core
///     .create_record("Customers", "Customer_ID", &cust, Mutation::Customer, |id| {
///         vec![Cell::text(id.to_string()), Cell::text("Bilal")]
///     })
///     .await
///     .unwrap();
/// assert_eq!(id.to_string(), "CUST-001");
/// # }
/// ```
pub struct PosCore<S> {
    store: Arc<S>,
    allocator: IdAllocator<S>,
    views: Views,
}

// Manual impl: a derive would demand S: Clone, but the store is shared
// through the Arc.
impl<S> Clone for PosCore<S> {
    fn clone(&self) -> Self {
        PosCore {
            store: Arc::clone(&self.store),
            allocator: self.allocator.clone(),
            views: self.views.clone(),
        }
    }
}

impl<S: RecordStore> PosCore<S> {
    /// Assembles a core with default allocator timing and an in-memory cache.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_parts(store, AllocatorConfig::new(), Cache::in_memory())
    }

    /// Assembles a core from explicit parts.
    pub fn with_parts(store: Arc<S>, config: AllocatorConfig, cache: Cache) -> Self {
        let lock = Arc::new(AllocatorLock::new(ALLOCATOR_LOCK_NAME));
        let allocator = IdAllocator::with_config(Arc::clone(&store), lock, config);
        PosCore {
            store,
            allocator,
            views: Views::new(cache),
        }
    }

    /// Returns the record store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the ID allocator.
    pub fn allocator(&self) -> &IdAllocator<S> {
        &self.allocator
    }

    /// Returns the cached views.
    pub fn views(&self) -> &Views {
        &self.views
    }

    /// Returns the cache (for stats and direct operations).
    pub fn cache(&self) -> &Cache {
        self.views.cache()
    }

    /// Allocates an identifier, appends the record, and invalidates the
    /// mutation's cache keys - the standard write path.
    ///
    /// The allocation and the append share one critical section, so
    /// concurrent writers can never claim the same identifier. Invalidation
    /// fires after the row is in place and before this returns.
    pub async fn create_record<F>(
        &self,
        table: &str,
        id_column: &str,
        prefix: &Prefix,
        mutation: Mutation,
        build_row: F,
    ) -> StoreResult<RecordId>
    where
        F: FnOnce(&RecordId) -> Vec<Cell>,
    {
        let id = self
            .allocator
            .allocate_and_persist(table, id_column, prefix, build_row)
            .await?;
        self.views.invalidate_after(mutation);
        Ok(id)
    }

    /// Updates a single cell and invalidates the mutation's cache keys.
    ///
    /// The other write shape the backing store supports (stock adjustments,
    /// balance updates). No identifier is involved, so no lock is taken.
    pub fn update_record_cell(
        &self,
        table: &str,
        row: usize,
        column: &str,
        value: Cell,
        mutation: Mutation,
    ) -> StoreResult<()> {
        self.store.update_cell(table, row, column, value)?;
        self.views.invalidate_after(mutation);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

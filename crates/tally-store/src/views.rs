//! # Cached Views
//!
//! Named convenience wrappers binding each cache key to a fixed TTL and a
//! caller-supplied domain fetch, plus the invalidation trigger fired by
//! write paths.
//!
//! ## The Cache-Aside Pattern, Bound Per Entity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            views.customers(|| fetch_customers_from_store())            │
//! │                                                                         │
//! │  probe cache["customers-all"]                                          │
//! │       │                                                                 │
//! │       ├── hit ──────────────────────────► return cached Vec<Customer>  │
//! │       │                                                                 │
//! │       └── miss ──► fetch() ──► store (TTL 300 s) ──► return            │
//! │                                                                         │
//! │  The fetch closure is the expensive full-table read; it belongs to     │
//! │  the business module, not to this layer.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use tally_core::keys::{invalidation_set, CacheKey, Mutation};
use tally_core::types::{
    Customer, DashboardSummary, DebtEntry, InventoryItem, SaleSummary, Supplier,
};

use crate::cache::Cache;
use crate::error::StoreResult;

// =============================================================================
// TTLs
// =============================================================================

/// Per-view TTLs.
///
/// ## Tuning Rationale
/// The dashboard is the most write-sensitive view (every category clears
/// it), so its TTL is the shortest. Suppliers change rarely and get the
/// longest. TTLs are a backstop only - any relevant write clears the key
/// immediately through the invalidation map.
pub mod ttl {
    use std::time::Duration;

    /// Dashboard aggregate: 60 seconds.
    pub const DASHBOARD: Duration = Duration::from_secs(60);
    /// Recent sales window: 2 minutes.
    pub const RECENT_SALES: Duration = Duration::from_secs(120);
    /// Full inventory listing: 5 minutes.
    pub const INVENTORY: Duration = Duration::from_secs(300);
    /// Full customer listing: 5 minutes.
    pub const CUSTOMERS: Duration = Duration::from_secs(300);
    /// Low-stock listing: 5 minutes.
    pub const LOW_STOCK: Duration = Duration::from_secs(300);
    /// Customer debt listing: 5 minutes.
    pub const CUSTOMER_DEBT: Duration = Duration::from_secs(300);
    /// Full supplier listing: 10 minutes.
    pub const SUPPLIERS: Duration = Duration::from_secs(600);
}

// =============================================================================
// Views
// =============================================================================

/// Typed, TTL-bound cached views over the fixed key namespace.
#[derive(Clone)]
pub struct Views {
    cache: Cache,
}

impl Views {
    /// Creates the views layer over a cache.
    pub fn new(cache: Cache) -> Self {
        Views { cache }
    }

    /// Returns the underlying cache (for stats and direct invalidation).
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Full inventory listing (`inventory-all`, TTL 5 min).
    pub fn inventory<F>(&self, fetch: F) -> StoreResult<Vec<InventoryItem>>
    where
        F: FnOnce() -> StoreResult<Vec<InventoryItem>>,
    {
        self.cache
            .get_or_compute(CacheKey::InventoryAll, ttl::INVENTORY, fetch)
    }

    /// Full customer listing (`customers-all`, TTL 5 min).
    pub fn customers<F>(&self, fetch: F) -> StoreResult<Vec<Customer>>
    where
        F: FnOnce() -> StoreResult<Vec<Customer>>,
    {
        self.cache
            .get_or_compute(CacheKey::CustomersAll, ttl::CUSTOMERS, fetch)
    }

    /// Full supplier listing (`suppliers-all`, TTL 10 min).
    pub fn suppliers<F>(&self, fetch: F) -> StoreResult<Vec<Supplier>>
    where
        F: FnOnce() -> StoreResult<Vec<Supplier>>,
    {
        self.cache
            .get_or_compute(CacheKey::SuppliersAll, ttl::SUPPLIERS, fetch)
    }

    /// Recent sales window (`recent-sales`, TTL 2 min).
    pub fn recent_sales<F>(&self, fetch: F) -> StoreResult<Vec<SaleSummary>>
    where
        F: FnOnce() -> StoreResult<Vec<SaleSummary>>,
    {
        self.cache
            .get_or_compute(CacheKey::RecentSales, ttl::RECENT_SALES, fetch)
    }

    /// Items at or below reorder level (`low-stock`, TTL 5 min).
    pub fn low_stock<F>(&self, fetch: F) -> StoreResult<Vec<InventoryItem>>
    where
        F: FnOnce() -> StoreResult<Vec<InventoryItem>>,
    {
        self.cache
            .get_or_compute(CacheKey::LowStock, ttl::LOW_STOCK, fetch)
    }

    /// Customers carrying debt (`customer-debt`, TTL 5 min).
    pub fn customer_debt<F>(&self, fetch: F) -> StoreResult<Vec<DebtEntry>>
    where
        F: FnOnce() -> StoreResult<Vec<DebtEntry>>,
    {
        self.cache
            .get_or_compute(CacheKey::CustomerDebt, ttl::CUSTOMER_DEBT, fetch)
    }

    /// Dashboard aggregate (`dashboard-aggregate`, TTL 60 s).
    pub fn dashboard<F>(&self, fetch: F) -> StoreResult<DashboardSummary>
    where
        F: FnOnce() -> StoreResult<DashboardSummary>,
    {
        self.cache
            .get_or_compute(CacheKey::DashboardAggregate, ttl::DASHBOARD, fetch)
    }

    /// Clears every cache key the mutation category makes stale.
    ///
    /// Called synchronously by write paths, after the write has been
    /// applied and before they return success. Unrelated keys are left
    /// untouched.
    pub fn invalidate_after(&self, mutation: Mutation) {
        let keys = invalidation_set(mutation);
        debug!(?mutation, ?keys, "invalidating caches after write");
        self.cache.invalidate_many(keys);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

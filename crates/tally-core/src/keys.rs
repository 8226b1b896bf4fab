//! # Cache Keys & Invalidation Map
//!
//! The fixed cache key namespace and the static map from mutation category to
//! the keys that mutation makes stale.
//!
//! ## How Invalidation Flows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Write → Invalidation                               │
//! │                                                                         │
//! │  add_customer(...)                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  append row to Customers table                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  invalidation_set(Mutation::Customer)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  [customers-all, customer-debt, dashboard-aggregate]  ← purged          │
//! │                                                                         │
//! │  suppliers-all, recent-sales, ...                      ← untouched      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Invariant
//! Every cache key whose value is derived (even partially) from an entity's
//! table MUST appear in that entity's invalidation set. Staleness within the
//! TTL window is only acceptable for data the map says a write could not have
//! touched - never after a relevant write.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Cache Key
// =============================================================================

/// The closed namespace of cache keys.
///
/// ## Why an Enum, Not Strings?
/// The key set is small and fixed, and the invalidation map must be
/// exhaustive over it. An enum lets the compiler enforce that a new key
/// cannot be added without the map (and the stats probe) seeing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheKey {
    /// Full inventory listing.
    InventoryAll,
    /// Full customer listing.
    CustomersAll,
    /// Full supplier listing.
    SuppliersAll,
    /// Most recent sales (bounded window).
    RecentSales,
    /// Aggregate figures for the dashboard (today's sales, debt, low stock).
    DashboardAggregate,
    /// Items at or below their reorder level.
    LowStock,
    /// Customers carrying an outstanding balance.
    CustomerDebt,
}

impl CacheKey {
    /// Every key in the namespace, for `invalidate_all` and the stats probe.
    pub const ALL: [CacheKey; 7] = [
        CacheKey::InventoryAll,
        CacheKey::CustomersAll,
        CacheKey::SuppliersAll,
        CacheKey::RecentSales,
        CacheKey::DashboardAggregate,
        CacheKey::LowStock,
        CacheKey::CustomerDebt,
    ];

    /// Returns the backing-store key string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheKey::InventoryAll => "inventory-all",
            CacheKey::CustomersAll => "customers-all",
            CacheKey::SuppliersAll => "suppliers-all",
            CacheKey::RecentSales => "recent-sales",
            CacheKey::DashboardAggregate => "dashboard-aggregate",
            CacheKey::LowStock => "low-stock",
            CacheKey::CustomerDebt => "customer-debt",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Mutation Category
// =============================================================================

/// The category of a write, as reported by the business module performing it.
///
/// A multi-table operation (a credit sale touches sales, inventory, customer
/// and financial tables) reports one category per table it wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutation {
    /// Inventory table changed (stock level, new item, price).
    Inventory,
    /// Customer table changed (new customer, balance update).
    Customer,
    /// Supplier table changed.
    Supplier,
    /// Sales table changed (new sale, void).
    Sale,
    /// Financial/ledger table changed (payment, expense).
    Financial,
}

// =============================================================================
// Invalidation Map
// =============================================================================

/// Returns the cache keys a mutation category makes stale.
///
/// ## Derivation
/// ```text
/// inventory-all        ← Inventory table            (Inventory, Sale*)
/// low-stock            ← Inventory table            (Inventory, Sale*)
/// customers-all        ← Customers table            (Customer)
/// customer-debt        ← Customers + Financial      (Customer, Financial)
/// suppliers-all        ← Suppliers table            (Supplier)
/// recent-sales         ← Sales table                (Sale)
/// dashboard-aggregate  ← Sales + Inventory +        (all but Supplier)
/// │                      Customers + Financial
/// │
/// └─ *A completed sale decrements stock in the same flow, so the Sale
///    category also clears the inventory-derived keys.
/// ```
pub const fn invalidation_set(mutation: Mutation) -> &'static [CacheKey] {
    match mutation {
        Mutation::Inventory => &[
            CacheKey::InventoryAll,
            CacheKey::LowStock,
            CacheKey::DashboardAggregate,
        ],
        Mutation::Customer => &[
            CacheKey::CustomersAll,
            CacheKey::CustomerDebt,
            CacheKey::DashboardAggregate,
        ],
        Mutation::Supplier => &[CacheKey::SuppliersAll],
        Mutation::Sale => &[
            CacheKey::RecentSales,
            CacheKey::InventoryAll,
            CacheKey::LowStock,
            CacheKey::DashboardAggregate,
        ],
        Mutation::Financial => &[CacheKey::CustomerDebt, CacheKey::DashboardAggregate],
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

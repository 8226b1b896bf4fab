//! # Record Types
//!
//! The record shapes carried by cached views.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cached View Payloads                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryItem   │   │    Customer     │   │    Supplier     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (ITEM-NNN)  │   │  id (CUST-NNN)  │   │  id (SUP-NNN)   │       │
//! │  │  quantity       │   │  balance_cents  │   │  phone          │       │
//! │  │  reorder_level  │   │  phone          │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  SaleSummary    │   │   DebtEntry     │   │DashboardSummary │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (SALE-NNN)  │   │  customer_id    │   │  sales_today    │       │
//! │  │  total_cents    │   │  balance_cents  │   │  low_stock_count│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Integer Money
//! All monetary values are in cents (i64) to avoid float errors, same as the
//! rest of the system. A debt of Rs. 1,250.00 is `balance_cents: 125000`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Inventory Item
// =============================================================================

/// A stocked item as carried by the `inventory-all` and `low-stock` views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Business identifier (`ITEM-NNN`).
    pub id: String,

    /// Display name shown to the cashier.
    pub name: String,

    /// Free-form category label.
    pub category: Option<String>,

    /// Units currently in stock.
    pub quantity: i64,

    /// Selling price in cents.
    pub unit_price_cents: i64,

    /// Stock level at which the item shows up in the low-stock view.
    pub reorder_level: i64,

    /// Supplier this item is restocked from (`SUP-NNN`), if known.
    pub supplier_id: Option<String>,

    /// When the row was last touched.
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Checks whether the item belongs in the low-stock view.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer as carried by the `customers-all` view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Business identifier (`CUST-NNN`).
    pub id: String,

    /// Customer name.
    pub name: String,

    /// Contact phone, if recorded.
    pub phone: Option<String>,

    /// Outstanding balance in cents. Positive means the customer owes us.
    pub balance_cents: i64,

    /// When the customer was registered.
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Checks whether the customer carries debt (appears in `customer-debt`).
    #[inline]
    pub fn owes(&self) -> bool {
        self.balance_cents > 0
    }
}

// =============================================================================
// Supplier
// =============================================================================

/// A supplier as carried by the `suppliers-all` view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    /// Business identifier (`SUP-NNN`).
    pub id: String,

    /// Supplier name.
    pub name: String,

    /// Contact phone, if recorded.
    pub phone: Option<String>,

    /// When the supplier was registered.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Summary
// =============================================================================

/// A sale as carried by the `recent-sales` view.
///
/// This is the listing shape, not the full sale with line items - the views
/// layer only ever serves aggregate/listing reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleSummary {
    /// Business identifier (`SALE-NNN`).
    pub id: String,

    /// Customer the sale was made to, if not a walk-in.
    pub customer_id: Option<String>,

    /// Sale total in cents.
    pub total_cents: i64,

    /// When the sale was completed.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Debt Entry
// =============================================================================

/// One row of the `customer-debt` view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtEntry {
    /// Business identifier of the customer (`CUST-NNN`).
    pub customer_id: String,

    /// Customer name (denormalized for display).
    pub name: String,

    /// Outstanding balance in cents.
    pub balance_cents: i64,
}

// =============================================================================
// Dashboard Summary
// =============================================================================

/// The single aggregate object behind the `dashboard-aggregate` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Total of today's completed sales, in cents.
    pub sales_today_cents: i64,

    /// Number of sales completed today.
    pub sale_count_today: u64,

    /// Number of items at or below reorder level.
    pub low_stock_count: u64,

    /// Total outstanding customer debt, in cents.
    pub total_debt_cents: i64,

    /// When the aggregate was computed.
    pub generated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # tally-store: Storage-Facing Layer for Tally POS
//!
//! This crate provides the three mechanisms every read and write in the
//! system goes through: the global allocator lock, the sequential ID
//! allocator, and the TTL cache with its invalidation triggers.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  Business module (add_customer, record_sale, ...)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tally-store (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  IdAllocator  │    │     Cache     │    │    Views     │  │   │
//! │  │   │ (allocator.rs)│    │  (cache.rs)   │    │  (views.rs)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ lock + scan   │    │ TTL entries   │    │ key + TTL +  │  │   │
//! │  │   │ max → max+1   │    │ cache-aside   │    │ invalidation │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                    │   │
//! │  └───────────┼────────────────────────────────────────────────────┘   │
//! │              ▼                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                RecordStore (collaborator trait)                 │   │
//! │  │      read_column • append_row • update_cell                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`lock`] - The named global allocator lock (bounded wait, RAII release)
//! - [`allocator`] - Sequential `PREFIX-NNN` allocation by live-column scan
//! - [`cache`] - TTL cache, cache-aside reads, stats probe
//! - [`views`] - Per-entity cached views and the invalidation trigger
//! - [`table`] - Record store collaborator trait + in-memory implementation
//! - [`service`] - `PosCore`: the assembled write path
//! - [`error`] - Store error taxonomy
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_store::service::PosCore;
//!
//! let core = PosCore::new(store);
//! let id = core
//!     .create_record("Sales", "Sale_ID", &sale_prefix, Mutation::Sale, build_row)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocator;
pub mod cache;
pub mod error;
pub mod lock;
pub mod service;
pub mod table;
pub mod views;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};

// Primary surface re-exports for convenience
pub use allocator::{AllocatorConfig, IdAllocator};
pub use cache::{Cache, CacheBackend, Clock, KeyStats, MemoryBackend, ValueShape};
pub use lock::AllocatorLock;
pub use service::PosCore;
pub use table::{Cell, MemoryStore, RecordStore};
pub use views::Views;

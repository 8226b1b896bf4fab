//! # tally-core: Pure Domain Types for Tally POS
//!
//! This crate is the shared vocabulary of Tally POS. It defines the
//! identifier scheme, the cache key namespace, the invalidation map, and the
//! record types carried by cached views - all as pure data with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        Business Modules (sales, customers, inventory, ...)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-store                                  │   │
//! │  │        ID allocator • TTL cache • invalidation triggers        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   ident   │  │   keys    │  │   types   │  │   error   │  │   │
//! │  │   │  RecordId │  │ CacheKey  │  │ Customer  │  │ CoreError │  │   │
//! │  │   │  Prefix   │  │ Mutation  │  │ Inventory │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO LOCKS • NO CACHE STATE • PURE DATA               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`ident`] - `Prefix` and `RecordId` (the `PREFIX-NNN` identifier scheme)
//! - [`keys`] - Cache key namespace, mutation categories, invalidation map
//! - [`types`] - Record types carried by cached views
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::ident::{Prefix, RecordId};
//!
//! let prefix = Prefix::new("ITEM").unwrap();
//! let id = RecordId::new(prefix.clone(), 4);
//! assert_eq!(id.to_string(), "ITEM-004");
//!
//! // Lenient parsing: malformed cells yield None, never an error
//! assert_eq!(RecordId::parse_suffix("ITEM-017", &prefix), Some(17));
//! assert_eq!(RecordId::parse_suffix("legacy-row", &prefix), None);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ident;
pub mod keys;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tally_core::RecordId` instead of
// `use tally_core::ident::RecordId`

pub use error::{CoreError, CoreResult};
pub use ident::{Prefix, RecordId};
pub use keys::{invalidation_set, CacheKey, Mutation};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minimum width of the numeric suffix in a rendered identifier.
///
/// ## Why 3?
/// `ITEM-001` sorts and reads well for small shops; the width is a minimum,
/// not a cap - once a counter passes 999 the suffix widens naturally
/// (`ITEM-1000`), and parsing is width-agnostic.
pub const MIN_SUFFIX_WIDTH: usize = 3;

/// Maximum length of an identifier prefix.
///
/// ## Business Reason
/// Prefixes are short uppercase tags (`SALE`, `CUST`, `ITEM`, `FIN`, `REF`).
/// Eight characters keeps identifiers scannable in exported reports.
pub const MAX_PREFIX_LEN: usize = 8;

/// Largest numeric suffix accepted when parsing an identifier.
///
/// ## Why a Cap?
/// Scanned columns can contain arbitrary hand-typed values, and a cell like
/// `ITEM-18446744073709551615` parses cleanly as a u64 - but treating it as
/// the live maximum would overflow the next allocation. A suffix beyond a
/// billion is junk data, not a counter, so parsing rejects it the same way
/// it rejects non-numeric cells.
pub const MAX_SUFFIX: u64 = 999_999_999;

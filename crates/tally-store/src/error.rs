//! # Store Error Types
//!
//! Error types for the lock, allocator, and record store.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StoreError Taxonomy                              │
//! │                                                                         │
//! │  Transient (retryable)              Fatal (configuration)              │
//! │  ─────────────────────              ──────────────────────             │
//! │  Busy            lock contention    TableNotFound                      │
//! │  Backing         store I/O fault    ColumnNotFound                     │
//! │                                     RowOutOfRange                      │
//! │                                     RowTooWide                         │
//! │                                                                         │
//! │  Aggregate                          Tolerated silently (NOT an error)  │
//! │  ─────────                          ─────────────────────────────────  │
//! │  RetriesExhausted                   malformed ID cells during a scan   │
//! │                                     cache serialization faults         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation Policy
//! Contention and schema errors propagate to the immediate caller as typed
//! failures; the allocator lock is always released before propagation (the
//! guard drops). Cache faults never cross the cache boundary - they are
//! logged and degraded to a miss.

use thiserror::Error;

/// Errors from the record store, the allocator lock, and the allocator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The allocator lock was not acquired within the bounded wait.
    ///
    /// ## When This Occurs
    /// - Another session is holding the lock through a long column scan
    /// - Many sessions are allocating at once
    ///
    /// ## User Message
    /// This is the "system busy, please retry shortly" case. It is
    /// transient; `allocate_with_retry` handles it automatically.
    #[error("lock '{lock}' not acquired within {waited_ms} ms: system busy, please retry shortly")]
    Busy { lock: String, waited_ms: u64 },

    /// The named table does not exist in the backing store.
    #[error("table '{table}' not found: check store setup")]
    TableNotFound { table: String },

    /// The named column does not exist in the table's header.
    ///
    /// ## When This Occurs
    /// - A module is wired with the wrong ID column name
    /// - The sheet header row was hand-edited
    ///
    /// This is a configuration problem, distinct from transient contention,
    /// and is never retried.
    #[error("column '{column}' not found in table '{table}': check store setup")]
    ColumnNotFound { table: String, column: String },

    /// A row index was outside the table's data rows.
    #[error("row {row} out of range for table '{table}' ({rows} data rows)")]
    RowOutOfRange {
        table: String,
        row: usize,
        rows: usize,
    },

    /// An appended row had more values than the table has columns.
    #[error("row with {values} values is too wide for table '{table}' ({columns} columns)")]
    RowTooWide {
        table: String,
        columns: usize,
        values: usize,
    },

    /// The backing store itself faulted (I/O, quota, corruption).
    #[error("backing store fault: {0}")]
    Backing(String),

    /// All allocation attempts failed.
    ///
    /// Produced only by `allocate_with_retry` after exhausting its budget;
    /// the last underlying failure is kept as the source.
    #[error("allocation failed after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    /// Creates a backing-store fault with a message.
    pub fn backing(message: impl Into<String>) -> Self {
        StoreError::Backing(message.into())
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// ## Classification
    /// - `Busy` and `Backing` are transient
    /// - Schema errors (missing table/column, bad row shape) are
    ///   configuration problems a retry cannot fix
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Busy { .. } | StoreError::Backing(_))
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  └── CoreError        - Identifier/prefix shape violations             │
//! │                                                                         │
//! │  tally-store errors (separate crate)                                   │
//! │  └── StoreError       - Lock contention, schema, backing faults        │
//! │                                                                         │
//! │  Flow: CoreError → StoreError → embedding application                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (the offending prefix, the limit)
//! 3. Errors are enum variants, never String
//!
//! Note what is deliberately NOT an error: a cell in a scanned ID column that
//! fails to parse as `PREFIX-NNN`. Lenient parsing is load-bearing for the
//! "derive from live data" allocation model, so malformed cells are skipped
//! via `Option`, never raised through this type.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors for identifier construction.
///
/// These represent configuration mistakes (bad prefix shapes), not runtime
/// faults. They are fatal to the calling operation and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Prefix was empty.
    ///
    /// ## When This Occurs
    /// - A caller wires an entity module with an unset prefix constant
    #[error("identifier prefix must not be empty")]
    EmptyPrefix,

    /// Prefix exceeded the maximum length.
    #[error("identifier prefix '{prefix}' is longer than {max} characters")]
    PrefixTooLong { prefix: String, max: usize },

    /// Prefix contained a character outside `A-Z0-9`.
    ///
    /// ## Why So Strict?
    /// The dash separates prefix from suffix, so a dash (or lowercase noise)
    /// inside the prefix would make `parse_suffix` ambiguous.
    #[error("identifier prefix '{prefix}' contains invalid character '{found}'")]
    InvalidPrefixChar { prefix: String, found: char },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::PrefixTooLong {
            prefix: "WAREHOUSE".to_string(),
            max: 8,
        };
        assert_eq!(
            err.to_string(),
            "identifier prefix 'WAREHOUSE' is longer than 8 characters"
        );

        let err = CoreError::InvalidPrefixChar {
            prefix: "item".to_string(),
            found: 'i',
        };
        assert_eq!(
            err.to_string(),
            "identifier prefix 'item' contains invalid character 'i'"
        );
    }
}

//! # Identifier Scheme
//!
//! Human-readable sequential identifiers of the form `PREFIX-NNN`.
//!
//! ## Anatomy of an Identifier
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SALE-042                                         │
//! │                        ────┬─┬──                                        │
//! │                            │ │                                          │
//! │   Prefix ──────────────────┘ │                                          │
//! │   Short uppercase tag        │                                          │
//! │   (SALE, CUST, ITEM, ...)    │                                          │
//! │                              │                                          │
//! │   Suffix ────────────────────┘                                          │
//! │   Decimal counter, zero-padded to ≥3 digits.                            │
//! │   042 → 043 → ... → 999 → 1000 (widens naturally, no cap)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual Identity Pattern
//! These are *business* identifiers: ordered, scannable on a printed receipt,
//! and re-derivable from the live table. The allocator in `tally-store`
//! computes the next suffix by scanning existing values - which is why
//! parsing here must be lenient (a stray header or hand-typed cell is
//! skipped, not an error).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::{MAX_PREFIX_LEN, MAX_SUFFIX, MIN_SUFFIX_WIDTH};

// =============================================================================
// Prefix
// =============================================================================

/// A validated identifier prefix (`SALE`, `CUST`, `ITEM`, `FIN`, `REF`, ...).
///
/// ## Why a Newtype?
/// A malformed prefix is a wiring mistake, not a runtime condition. Validating
/// once at construction keeps the allocator's hot path free of checks and
/// guarantees `parse_suffix` is unambiguous (no dashes inside the prefix).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prefix(String);

impl Prefix {
    /// Creates a validated prefix.
    ///
    /// ## Rules
    /// - 1 to [`MAX_PREFIX_LEN`] characters
    /// - ASCII uppercase letters and digits only
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::ident::Prefix;
    ///
    /// assert!(Prefix::new("SALE").is_ok());
    /// assert!(Prefix::new("sale").is_err());
    /// assert!(Prefix::new("").is_err());
    /// ```
    pub fn new(tag: impl Into<String>) -> CoreResult<Self> {
        let tag = tag.into();

        if tag.is_empty() {
            return Err(CoreError::EmptyPrefix);
        }
        if tag.len() > MAX_PREFIX_LEN {
            return Err(CoreError::PrefixTooLong {
                prefix: tag,
                max: MAX_PREFIX_LEN,
            });
        }
        if let Some(found) = tag
            .chars()
            .find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit()))
        {
            return Err(CoreError::InvalidPrefixChar { prefix: tag, found });
        }

        Ok(Prefix(tag))
    }

    /// Returns the prefix as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Record ID
// =============================================================================

/// A sequential record identifier: a prefix plus a numeric suffix.
///
/// ## Ordering
/// Identifiers sharing a prefix order by suffix. The allocator guarantees
/// suffixes are unique and strictly increasing *at allocation time*; if the
/// highest-numbered record is later deleted, the freed number is legitimately
/// reissued (the counter is derived from live data, never persisted).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    prefix: Prefix,
    number: u64,
}

impl RecordId {
    /// Creates an identifier from a prefix and suffix number.
    #[inline]
    pub fn new(prefix: Prefix, number: u64) -> Self {
        RecordId { prefix, number }
    }

    /// Returns the prefix.
    #[inline]
    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// Returns the numeric suffix.
    #[inline]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Attempts to extract the numeric suffix from a raw cell value.
    ///
    /// ## Lenient By Design
    /// The allocator scans a live column that may contain hand-edited rows,
    /// legacy formats, or plain junk. Anything that is not exactly
    /// `<prefix>-<decimal>` with a suffix at most [`MAX_SUFFIX`] yields
    /// `None` and is skipped by the scan - this is the documented behavior,
    /// not error swallowing.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::ident::{Prefix, RecordId};
    ///
    /// let p = Prefix::new("CUST").unwrap();
    /// assert_eq!(RecordId::parse_suffix("CUST-007", &p), Some(7));
    /// assert_eq!(RecordId::parse_suffix("CUST-1000", &p), Some(1000));
    /// assert_eq!(RecordId::parse_suffix("CUST-", &p), None);
    /// assert_eq!(RecordId::parse_suffix("CUST-x9", &p), None);
    /// assert_eq!(RecordId::parse_suffix("SALE-007", &p), None);
    /// assert_eq!(RecordId::parse_suffix("CUST-18446744073709551615", &p), None);
    /// ```
    pub fn parse_suffix(raw: &str, prefix: &Prefix) -> Option<u64> {
        raw.trim()
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|digits| digits.parse::<u64>().ok())
            .filter(|n| *n <= MAX_SUFFIX)
    }

    /// Parses a full identifier back from its rendered form.
    ///
    /// ## Returns
    /// * `Some(RecordId)` - value matched `<prefix>-<decimal>`
    /// * `None` - anything else (lenient, like [`RecordId::parse_suffix`])
    pub fn parse(raw: &str, prefix: &Prefix) -> Option<RecordId> {
        Self::parse_suffix(raw, prefix).map(|number| RecordId::new(prefix.clone(), number))
    }
}

impl fmt::Display for RecordId {
    /// Renders as `PREFIX-NNN`, zero-padded to at least
    /// [`MIN_SUFFIX_WIDTH`] digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:0width$}",
            self.prefix,
            self.number,
            width = MIN_SUFFIX_WIDTH
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Record Store
//!
//! The collaborator contract for the spreadsheet-like backing store, plus an
//! in-memory implementation used by tests and embedding applications.
//!
//! ## The Storage Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Table "Inventory"                                   │
//! │                                                                         │
//! │   columns:  Item_ID   │ Name            │ Quantity │ Reorder_Level     │
//! │   ───────────────────────────────────────────────────────────────────  │
//! │   row 0:    ITEM-001  │ Chai Patti 450g │ 24       │ 10                │
//! │   row 1:    ITEM-002  │ Surf 1kg        │ 7        │ 12                │
//! │   row 2:    ITEM-003  │ Rooh Afza       │ 0        │ 6                 │
//! │                                                                         │
//! │   read_column("Inventory", "Item_ID")                                  │
//! │       → [ITEM-001, ITEM-002, ITEM-003]   (header never included)       │
//! │                                                                         │
//! │   append_row("Inventory", [ITEM-004, "Tang 750g", 30, 8])              │
//! │   update_cell("Inventory", 1, "Quantity", 6)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why a Trait?
//! The production backing store is external (a hosted sheet). The allocator
//! and service layer only need these three operations, so they program
//! against [`RecordStore`] and tests swap in [`MemoryStore`] or a faulting
//! stub.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Cell
// =============================================================================

/// A loosely-typed cell value, as the backing store hands them over.
///
/// Sheets do not enforce column types: an ID column can contain text IDs,
/// stray numbers, and blanks side by side. Consumers pick what they can use
/// (`as_text`, `as_number`) and skip the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Text content.
    Text(String),
    /// Numeric content.
    Number(f64),
    /// Boolean content.
    Bool(bool),
    /// An empty cell.
    Empty,
}

impl Cell {
    /// Creates a text cell.
    #[inline]
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Creates a numeric cell.
    #[inline]
    pub fn number(value: f64) -> Self {
        Cell::Number(value)
    }

    /// Returns the text content, if this is a text cell.
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric content, if this is a numeric cell.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Checks whether the cell is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Empty => Ok(()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

// =============================================================================
// Record Store Trait
// =============================================================================

/// The backing-store contract the allocator and service layer depend on.
///
/// ## Semantics
/// - Row indices are 0-based over *data* rows; the header row is never
///   addressable and never returned.
/// - `read_column` returns the full column, one cell per data row, in row
///   order.
/// - `append_row` may pass fewer values than the table has columns; the
///   remainder is blank. More values than columns is a schema error.
pub trait RecordStore: Send + Sync {
    /// Reads every data cell of one column, header excluded.
    fn read_column(&self, table: &str, column: &str) -> StoreResult<Vec<Cell>>;

    /// Appends a row of values to the end of a table.
    fn append_row(&self, table: &str, values: Vec<Cell>) -> StoreResult<()>;

    /// Updates a single cell addressed by data-row index and column name.
    fn update_cell(&self, table: &str, row: usize, column: &str, value: Cell) -> StoreResult<()>;
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// An in-memory [`RecordStore`].
///
/// ## Usage
/// Drives every test in this workspace and serves as the reference
/// implementation for adapters over a real backing store.
///
/// ```rust
/// use tally_store::table::{Cell, MemoryStore, RecordStore};
///
/// let store = MemoryStore::new();
/// store.create_table("Customers", &["Customer_ID", "Name"]);
/// store
///     .append_row("Customers", vec![Cell::text("CUST-001"), Cell::text("Bilal")])
///     .unwrap();
///
/// let ids = store.read_column("Customers", "Customer_ID").unwrap();
/// assert_eq!(ids, vec![Cell::text("CUST-001")]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

#[derive(Debug)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    fn column_index(&self, table: &str, column: &str) -> StoreResult<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| StoreError::ColumnNotFound {
                table: table.to_string(),
                column: column.to_string(),
            })
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Creates (or replaces) a table with the given header columns.
    ///
    /// Bootstrap/test helper; replacing an existing table drops its rows.
    pub fn create_table(&self, name: impl Into<String>, columns: &[&str]) {
        let name = name.into();
        self.tables.write().insert(
            name,
            Table {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows: Vec::new(),
            },
        );
    }

    /// Returns the number of data rows in a table.
    pub fn row_count(&self, table: &str) -> StoreResult<usize> {
        let tables = self.tables.read();
        let t = tables.get(table).ok_or_else(|| StoreError::TableNotFound {
            table: table.to_string(),
        })?;
        Ok(t.rows.len())
    }

    /// Deletes a data row by index.
    ///
    /// Models a manual deletion in the backing sheet, which the allocator's
    /// scan-the-live-data design must tolerate.
    pub fn delete_row(&self, table: &str, row: usize) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound {
                table: table.to_string(),
            })?;
        if row >= t.rows.len() {
            return Err(StoreError::RowOutOfRange {
                table: table.to_string(),
                row,
                rows: t.rows.len(),
            });
        }
        t.rows.remove(row);
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn read_column(&self, table: &str, column: &str) -> StoreResult<Vec<Cell>> {
        let tables = self.tables.read();
        let t = tables.get(table).ok_or_else(|| StoreError::TableNotFound {
            table: table.to_string(),
        })?;
        let idx = t.column_index(table, column)?;

        Ok(t.rows
            .iter()
            .map(|row| row.get(idx).cloned().unwrap_or(Cell::Empty))
            .collect())
    }

    fn append_row(&self, table: &str, values: Vec<Cell>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound {
                table: table.to_string(),
            })?;

        if values.len() > t.columns.len() {
            return Err(StoreError::RowTooWide {
                table: table.to_string(),
                columns: t.columns.len(),
                values: values.len(),
            });
        }

        let mut row = values;
        row.resize(t.columns.len(), Cell::Empty);
        t.rows.push(row);
        Ok(())
    }

    fn update_cell(&self, table: &str, row: usize, column: &str, value: Cell) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound {
                table: table.to_string(),
            })?;
        let idx = t.column_index(table, column)?;

        let rows = t.rows.len();
        let cell = t
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(idx))
            .ok_or_else(|| StoreError::RowOutOfRange {
                table: table.to_string(),
                row,
                rows,
            })?;
        *cell = value;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! Seams to the external lock manager and row store. The cascade engine only
//! issues these requests and reacts to their outcomes; it implements no
//! locking or storage of its own.

use crate::schema::TableId;
use crate::types::{IOResult, Row, Value};
use crate::Result;

/// Outcome of a table lock request. Errors from the lock manager itself come
/// back through `Result`; would-block is an ordinary outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Acquired,
    WouldBlock,
}

pub trait TableLocks {
    fn try_lock_table(&self, table: TableId, exclusive: bool) -> Result<LockOutcome>;
}

/// The closed set of write failures that two racing cascades can legitimately
/// cause on the same descendant row. These are swallowed by the engine and
/// treated as success; anything else surfaces as a storage error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// The targeted row was already removed by another actor.
    RowVanished,
    /// The row store detected a duplicate delete of the same row.
    DuplicateDelete,
    /// The rewrite collided with a unique constraint already satisfied by a
    /// concurrent cascade's identical rewrite.
    UniqueViolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Done,
    Conflict(ConflictKind),
}

pub trait CursorSource {
    /// Create a scan cursor over `table` projecting only `projected` columns.
    /// The cursor starts unconstrained and unopened.
    fn open_scan(&self, table: TableId, projected: &[usize]) -> Result<Box<dyn FkScanCursor>>;
}

/// A constrained scan cursor over the child table, owned by the action state
/// for as long as the action lives. Dropping the cursor closes it.
///
/// Call order: `add_eq_constraint` for the non-ordered key parts, then
/// `finalize_constraints`, then `add_eq_constraint` for the ordered parts,
/// then `open`, then `fetch_next` until it yields no row. After
/// `reset_constraints(true)` the same sequence minus the cursor creation may
/// be replayed for the next parent row; the contract requires that reset
/// truly clears all prior bindings.
pub trait FkScanCursor {
    fn add_eq_constraint(&mut self, column: usize, value: Value) -> Result<()>;

    fn finalize_constraints(&mut self) -> Result<()>;

    fn open(&mut self) -> Result<()>;

    /// Fetch the next row matching the constraints. May suspend.
    fn fetch_next(&mut self) -> Result<IOResult<Option<Row>>>;

    /// Delete the row returned by the last `fetch_next`.
    fn delete_current(&mut self) -> Result<WriteOutcome>;

    /// Rewrite the row returned by the last `fetch_next`. Only the columns
    /// flagged in `selection` are touched; `values` is sized to the child
    /// row and ignored outside the selection.
    fn update_current(&mut self, values: &[Value], selection: &[bool]) -> Result<WriteOutcome>;

    /// Clear constraints and scan position. With `keep_open` the cursor
    /// stays usable for another constrain-and-open round.
    fn reset_constraints(&mut self, keep_open: bool);
}

mod assert;
mod error;
pub mod fkey;
pub mod schema;
pub mod state_machine;
pub mod types;

pub use error::{RefactionError, Result};
pub use fkey::cascade::{
    advance, check_restrict, release, ActionState, CascadeContext, CascadePhase,
};
pub use fkey::cursor::{
    ConflictKind, CursorSource, FkScanCursor, LockOutcome, TableLocks, WriteOutcome,
};
pub use fkey::plan::RowChangePlan;
pub use fkey::RowChangeRequest;
pub use schema::{ActionKind, Column, ForeignKey, KeyPart, Table, TableId};
pub use types::{IOResult, Row, Value};

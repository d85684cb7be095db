//! Referential-action enforcement: when a parent row is deleted or updated,
//! apply the foreign key's declared policy (RESTRICT / CASCADE / SET NULL /
//! SET DEFAULT) to every matching child row, without ever blocking the
//! calling thread.

pub mod cascade;
pub mod cursor;
pub mod plan;


use crate::types::Row;

/// The facts of one parent-row change, as handed to the engine by the caller.
/// `new` absent encodes a delete. `changed` is a per-column flag array sized
/// to the parent row type; it is only consulted for updates.
#[derive(Debug, Clone, Copy)]
pub struct RowChangeRequest<'a> {
    pub old: &'a Row,
    pub new: Option<&'a Row>,
    pub changed: &'a [bool],
}

impl<'a> RowChangeRequest<'a> {
    pub fn delete(old: &'a Row) -> Self {
        Self {
            old,
            new: None,
            changed: &[],
        }
    }

    pub fn update(old: &'a Row, new: &'a Row, changed: &'a [bool]) -> Self {
        Self {
            old,
            new: Some(new),
            changed,
        }
    }

    #[inline]
    pub fn is_delete(&self) -> bool {
        self.new.is_none()
    }
}

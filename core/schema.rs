use std::fmt;
use std::fmt::Display;

use crate::types::Value;

/// Opaque identifier of a table inside the catalog; handed to the lock and
/// cursor collaborators as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub u64);

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    /// Declared DEFAULT, already evaluated to a plain value. `None` means the
    /// column has no default clause.
    pub default_value: Option<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default_value: Value) -> Self {
        Self {
            name: name.into(),
            default_value: Some(default_value),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn get_column(&self, name: &str) -> Option<(usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, col)| col.name == name)
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Declared referential action of a foreign key, one per triggering
/// operation (delete and update).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::NoAction => "NO ACTION",
            ActionKind::Restrict => "RESTRICT",
            ActionKind::Cascade => "CASCADE",
            ActionKind::SetNull => "SET NULL",
            ActionKind::SetDefault => "SET DEFAULT",
        };
        write!(f, "{s}")
    }
}

/// One part of a foreign key. Most parts pair a referencing (child) column
/// with the referenced (parent) column; keys may also carry constant-valued
/// parts, which constrain the scan but are never rewritten by a cascade.
///
/// Non-ordered referencing parts are bound while the scan constraints are
/// being built; ordered parts are bound just before the cursor is opened.
#[derive(Debug, Clone)]
pub enum KeyPart {
    Ref {
        child_col: usize,
        parent_col: usize,
        ordered: bool,
    },
    Const {
        child_col: usize,
        value: Value,
    },
}

impl KeyPart {
    #[inline]
    pub fn child_col(&self) -> usize {
        match self {
            KeyPart::Ref { child_col, .. } | KeyPart::Const { child_col, .. } => *child_col,
        }
    }
}

/// An immutable foreign-key constraint definition. Owned by the catalog;
/// the cascade engine only borrows it for the lifetime of an action.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub name: String,
    pub child_table: TableId,
    pub parent_table: TableId,
    pub parts: Vec<KeyPart>,
    pub on_delete: ActionKind,
    pub on_update: ActionKind,
}

impl ForeignKey {
    /// Number of bound-value slots an action over this key needs: one per
    /// referencing (non-constant) part.
    pub fn bound_slot_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, KeyPart::Ref { .. }))
            .count()
    }

    /// Child-table columns the scan needs projected.
    pub fn projected_child_cols(&self) -> Vec<usize> {
        self.parts.iter().map(KeyPart::child_col).collect()
    }

    /// Whether an update touching the columns flagged in `changed` (sized to
    /// the parent row) affects any column this key references.
    pub fn references_changed(&self, changed: &[bool]) -> bool {
        self.parts.iter().any(|p| match p {
            KeyPart::Ref { parent_col, .. } => changed.get(*parent_col).copied().unwrap_or(false),
            KeyPart::Const { .. } => false,
        })
    }
}

//! Pure per-action-kind column policy: which child columns a pending rewrite
//! touches and what each one becomes. No I/O happens here.

use super::RowChangeRequest;
use crate::schema::{ActionKind, ForeignKey, KeyPart, Table};
use crate::types::Value;
use crate::{RefactionError, Result};

/// The rewrite to apply to one matched child row. `new_values` is sized to
/// the child row; entries outside the selection mask are placeholders and
/// must be ignored by the consumer. A plan is recomputed for every matched
/// row and discarded after the single update call that consumes it.
#[derive(Debug)]
pub struct RowChangePlan {
    pub new_values: Vec<Value>,
}

impl RowChangePlan {
    /// Compute the rewrite for `kind`, marking the touched columns in
    /// `selection` (sized to the child row, cleared first). Constant-valued
    /// key parts are never rewritten.
    pub fn compute(
        kind: ActionKind,
        fk: &ForeignKey,
        child: &Table,
        request: &RowChangeRequest<'_>,
        selection: &mut [bool],
    ) -> Result<Self> {
        selection.fill(false);
        let mut new_values = vec![Value::Null; child.column_count()];

        for part in &fk.parts {
            let KeyPart::Ref {
                child_col,
                parent_col,
                ..
            } = part
            else {
                continue;
            };
            let value = match kind {
                ActionKind::Cascade => {
                    let new_row = request.new.ok_or_else(|| {
                        RefactionError::InternalError(format!(
                            "cascading update for key {} has no new row image",
                            fk.name
                        ))
                    })?;
                    new_row.get(*parent_col).clone()
                }
                ActionKind::SetNull => Value::Null,
                // A column without a declared default degrades to NULL
                // instead of failing.
                ActionKind::SetDefault => child.columns[*child_col]
                    .default_value
                    .clone()
                    .unwrap_or(Value::Null),
                ActionKind::NoAction | ActionKind::Restrict => {
                    return Err(RefactionError::InternalError(format!(
                        "no row change plan exists for {kind}"
                    )));
                }
            };
            new_values[*child_col] = value;
            selection[*child_col] = true;
        }

        Ok(Self { new_values })
    }
}

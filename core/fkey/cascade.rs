//! The cascading-action state machine. One [`ActionState`] is the
//! continuation for one foreign key being enforced against one (or, when the
//! caller reuses it, a sequence of) parent-row change(s). The machine never
//! blocks: the table lock request and the row fetch may suspend, and the
//! caller re-invokes [`advance`] with the same state until it is done.

use tracing::Level;

use super::cursor::{CursorSource, FkScanCursor, LockOutcome, TableLocks, WriteOutcome};
use super::plan::RowChangePlan;
use super::RowChangeRequest;
use crate::schema::{ActionKind, ForeignKey, KeyPart, Table};
use crate::state_machine::{StateMachine, StateTransition, TransitionResult};
use crate::types::{IOResult, Row, Value};
use crate::{refaction_assert, RefactionError, Result};

/// Which collaborator call the action is about to make. Every suspension
/// leaves the phase naming the step to re-enter; no step can be re-entered
/// from the wrong phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadePhase {
    /// Request the shared lock on the child table.
    LockTable,
    /// Create the cursor (first time only), bind the non-ordered key values
    /// and build the scan constraints.
    Prepare,
    /// Bind the ordered key values and open the scan.
    Open,
    /// Fetch the next matching child row.
    Select,
    /// Remove the fetched row (delete cascading).
    DeleteChild,
    /// Rewrite the fetched row per the computed plan.
    UpdateChild,
    /// All matching children handled; the cursor stays open for reuse.
    Done,
    /// A fatal error was returned; the state is only good for release.
    Failed,
}

/// What the scan is for: applying the declared action, or merely proving
/// that no matching child exists (the RESTRICT / deferred NO ACTION check,
/// which the caller runs as a separate invocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionMode {
    Enforce,
    ExistenceCheck,
}

/// The saved continuation of one in-flight referential action. Created
/// lazily on the first invocation that has work to do; released exactly once
/// by the caller through [`release`], never by [`advance`] itself.
pub struct ActionState {
    phase: CascadePhase,
    mode: ActionMode,
    /// Scan cursor over the child table. Opened once in Prepare and kept
    /// open, reset between parent rows, until the state is released.
    cursor: Option<Box<dyn FkScanCursor>>,
    /// Bound key values, one slot per referencing (non-constant) key part.
    /// Sized at creation, never resized.
    bound: Vec<Value>,
    /// Selection mask for the pending rewrite, one flag per child column.
    selection: Vec<bool>,
    /// The candidate child row of the current loop iteration; dropped before
    /// every fetch.
    fetched: Option<Row>,
    finalized: bool,
}

impl ActionState {
    fn new(fk: &ForeignKey, child: &Table, mode: ActionMode) -> Self {
        Self {
            phase: CascadePhase::LockTable,
            mode,
            cursor: None,
            bound: vec![Value::Null; fk.bound_slot_count()],
            selection: vec![false; child.column_count()],
            fetched: None,
            finalized: false,
        }
    }

    #[inline]
    pub fn phase(&self) -> CascadePhase {
        self.phase
    }

    /// Re-arm a completed state for the next parent row of a bulk operation.
    /// The lock is still held and the cursor still open, so the machine
    /// re-enters at Prepare and only rebinds the key values.
    fn rearm(&mut self) {
        refaction_assert!(
            self.cursor.is_some(),
            "re-armed a cascade action that never built its cursor"
        );
        self.finalized = false;
        self.phase = CascadePhase::Prepare;
    }
}

/// Everything one invocation of the engine needs: the constraint, the child
/// table metadata, the external collaborators and the parent-row change.
/// All borrowed; the engine owns none of it.
pub struct CascadeContext<'a> {
    pub fk: &'a ForeignKey,
    pub child: &'a Table,
    pub locks: &'a dyn TableLocks,
    pub cursors: &'a dyn CursorSource,
    pub request: RowChangeRequest<'a>,
}

impl CascadeContext<'_> {
    /// The declared action for the operation that triggered us.
    #[inline]
    fn action_kind(&self) -> ActionKind {
        if self.request.is_delete() {
            self.fk.on_delete
        } else {
            self.fk.on_update
        }
    }
}

struct CascadeStep<'a> {
    state: &'a mut ActionState,
}

impl<'a> StateTransition for CascadeStep<'a> {
    type Context = CascadeContext<'a>;
    type SMResult = ();

    #[tracing::instrument(fields(phase = ?self.state.phase), skip(self, context), level = Level::TRACE)]
    fn step(&mut self, context: &CascadeContext<'a>) -> Result<TransitionResult<()>> {
        tracing::trace!("step(phase={:?})", self.state.phase);
        match self.state.phase {
            CascadePhase::LockTable => {
                match context
                    .locks
                    .try_lock_table(context.fk.child_table, false)?
                {
                    LockOutcome::Acquired => {
                        self.state.phase = CascadePhase::Prepare;
                        Ok(TransitionResult::Continue)
                    }
                    LockOutcome::WouldBlock => Ok(TransitionResult::Io),
                }
            }
            CascadePhase::Prepare => {
                if self.state.cursor.is_none() {
                    let projected = context.fk.projected_child_cols();
                    self.state.cursor = Some(
                        context
                            .cursors
                            .open_scan(context.fk.child_table, &projected)?,
                    );
                }
                let ActionState { cursor, bound, .. } = &mut *self.state;
                let cursor = cursor_mut(cursor)?;
                let mut slot = 0;
                for part in &context.fk.parts {
                    match part {
                        KeyPart::Const { child_col, value } => {
                            cursor.add_eq_constraint(*child_col, value.clone())?;
                        }
                        KeyPart::Ref {
                            child_col,
                            parent_col,
                            ordered,
                        } => {
                            if !ordered {
                                bound[slot] = context.request.old.get(*parent_col).clone();
                                cursor.add_eq_constraint(*child_col, bound[slot].clone())?;
                            }
                            slot += 1;
                        }
                    }
                }
                cursor.finalize_constraints()?;
                self.state.phase = CascadePhase::Open;
                Ok(TransitionResult::Continue)
            }
            CascadePhase::Open => {
                let ActionState { cursor, bound, .. } = &mut *self.state;
                let cursor = cursor_mut(cursor)?;
                let mut slot = 0;
                for part in &context.fk.parts {
                    if let KeyPart::Ref {
                        child_col,
                        parent_col,
                        ordered,
                    } = part
                    {
                        if *ordered {
                            bound[slot] = context.request.old.get(*parent_col).clone();
                            cursor.add_eq_constraint(*child_col, bound[slot].clone())?;
                        }
                        slot += 1;
                    }
                }
                cursor.open()?;
                self.state.phase = CascadePhase::Select;
                Ok(TransitionResult::Continue)
            }
            CascadePhase::Select => {
                // Release the previous candidate before fetching the next.
                self.state.fetched = None;
                let cursor = cursor_mut(&mut self.state.cursor)?;
                match cursor.fetch_next()? {
                    IOResult::IO => Ok(TransitionResult::Io),
                    IOResult::Done(None) => {
                        // Fully applied for this parent row. Keep the cursor
                        // open so a bulk caller can reuse the state.
                        cursor.reset_constraints(true);
                        self.state.phase = CascadePhase::Done;
                        self.finalize(context)?;
                        Ok(TransitionResult::Done(()))
                    }
                    IOResult::Done(Some(row)) => {
                        if self.state.mode == ActionMode::ExistenceCheck {
                            return Err(RefactionError::ForeignKeyViolation {
                                constraint: context.fk.name.clone(),
                            });
                        }
                        let kind = context.action_kind();
                        if kind == ActionKind::Restrict {
                            // Only reachable for updates; restrict-on-delete
                            // never builds a state.
                            return Err(RefactionError::ForeignKeyViolation {
                                constraint: context.fk.name.clone(),
                            });
                        }
                        self.state.fetched = Some(row);
                        self.state.phase =
                            if context.request.is_delete() && kind == ActionKind::Cascade {
                                CascadePhase::DeleteChild
                            } else {
                                CascadePhase::UpdateChild
                            };
                        Ok(TransitionResult::Continue)
                    }
                }
            }
            CascadePhase::DeleteChild => {
                refaction_assert!(
                    self.state.fetched.is_some(),
                    "no fetched child row in a delete phase"
                );
                let cursor = cursor_mut(&mut self.state.cursor)?;
                match cursor.delete_current()? {
                    WriteOutcome::Done => {}
                    WriteOutcome::Conflict(conflict) => {
                        // Another cascade raced us to this descendant.
                        tracing::trace!("benign conflict on cascade delete: {conflict:?}");
                    }
                }
                self.state.fetched = None;
                self.state.phase = CascadePhase::Select;
                Ok(TransitionResult::Continue)
            }
            CascadePhase::UpdateChild => {
                refaction_assert!(
                    self.state.fetched.is_some(),
                    "no fetched child row in an update phase"
                );
                let kind = context.action_kind();
                let ActionState {
                    cursor, selection, ..
                } = &mut *self.state;
                let cursor = cursor_mut(cursor)?;
                let plan = RowChangePlan::compute(
                    kind,
                    context.fk,
                    context.child,
                    &context.request,
                    selection,
                )?;
                match cursor.update_current(&plan.new_values, selection)? {
                    WriteOutcome::Done => {}
                    WriteOutcome::Conflict(conflict) => {
                        tracing::trace!("benign conflict on cascade update: {conflict:?}");
                    }
                }
                self.state.fetched = None;
                self.state.phase = CascadePhase::Select;
                Ok(TransitionResult::Continue)
            }
            CascadePhase::Done | CascadePhase::Failed => Err(RefactionError::InternalError(
                "cascade action stepped past a terminal phase".to_string(),
            )),
        }
    }

    fn finalize(&mut self, _context: &CascadeContext<'a>) -> Result<()> {
        self.state.finalized = true;
        Ok(())
    }

    fn is_finalized(&self) -> bool {
        self.state.finalized
    }
}

#[inline]
fn cursor_mut(cursor: &mut Option<Box<dyn FkScanCursor>>) -> Result<&mut dyn FkScanCursor> {
    match cursor {
        Some(cursor) => Ok(cursor.as_mut()),
        None => Err(RefactionError::InternalError(
            "cascade action has no cursor in a cursor phase".to_string(),
        )),
    }
}

/// Decide whether this invocation has any work at all. Runs before a state
/// is created and makes no collaborator calls.
fn decide_skip(ctx: &CascadeContext<'_>, mode: ActionMode) -> bool {
    match mode {
        ActionMode::Enforce => {
            let kind = ctx.action_kind();
            if kind == ActionKind::NoAction {
                return true;
            }
            // Restrict on delete is enforced by the caller through
            // check_restrict, not by the action scan.
            if ctx.request.is_delete() && kind == ActionKind::Restrict {
                return true;
            }
            !ctx.request.is_delete() && !ctx.fk.references_changed(ctx.request.changed)
        }
        ActionMode::ExistenceCheck => {
            !ctx.request.is_delete() && !ctx.fk.references_changed(ctx.request.changed)
        }
    }
}

/// Advance the referential action for one foreign key, creating the
/// continuation on first call. Returns `Done` when the action is fully
/// applied, `IO` when it suspended (re-invoke later with the same `state`),
/// or an error; in every terminal case the caller still owns `state` and
/// must hand it to [`release`].
#[tracing::instrument(skip_all, fields(constraint = %ctx.fk.name), level = Level::DEBUG)]
pub fn advance(ctx: &CascadeContext<'_>, state: &mut Option<ActionState>) -> Result<IOResult<()>> {
    advance_in_mode(ctx, state, ActionMode::Enforce)
}

/// Scan for any child row still referencing the old parent key, failing with
/// a foreign-key violation if one exists. This is the RESTRICT (and deferred
/// NO ACTION) companion to [`advance`]; it never modifies child rows.
#[tracing::instrument(skip_all, fields(constraint = %ctx.fk.name), level = Level::DEBUG)]
pub fn check_restrict(
    ctx: &CascadeContext<'_>,
    state: &mut Option<ActionState>,
) -> Result<IOResult<()>> {
    advance_in_mode(ctx, state, ActionMode::ExistenceCheck)
}

fn advance_in_mode(
    ctx: &CascadeContext<'_>,
    state: &mut Option<ActionState>,
    mode: ActionMode,
) -> Result<IOResult<()>> {
    match state.as_mut() {
        Some(st) => {
            refaction_assert!(
                st.phase != CascadePhase::Failed,
                "resumed a failed cascade action"
            );
            refaction_assert!(st.mode == mode, "resumed a cascade action in the wrong mode");
            if st.phase == CascadePhase::Done {
                // A completed state fed a fresh request: bulk reuse.
                if decide_skip(ctx, mode) {
                    return Ok(IOResult::Done(()));
                }
                st.rearm();
            }
        }
        None => {
            if decide_skip(ctx, mode) {
                return Ok(IOResult::Done(()));
            }
            *state = Some(ActionState::new(ctx.fk, ctx.child, mode));
        }
    }
    let Some(st) = state.as_mut() else {
        return Err(RefactionError::InternalError(
            "cascade action state vanished before stepping".to_string(),
        ));
    };

    let mut sm = StateMachine::new(CascadeStep { state: st });
    let result = sm.step(ctx);
    let step = sm.into_inner();
    if result.is_err() {
        step.state.phase = CascadePhase::Failed;
        step.state.finalized = true;
    }
    result
}

/// Tear down a continuation: closes the cursor and frees the bound-value and
/// selection buffers. Must be called exactly once per created state, and a
/// released state cannot be resumed (this function consumes it). Releasing a
/// suspended state is legal; an aborting caller does exactly that.
pub fn release(state: ActionState) {
    tracing::trace!("release(phase={:?})", state.phase);
    drop(state);
}

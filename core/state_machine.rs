use crate::types::IOResult;
use crate::{refaction_assert, Result};

/// Outcome of a single transition of a suspendable state machine.
#[derive(Debug)]
pub enum TransitionResult<T> {
    /// The machine moved to a new state and can be stepped again immediately.
    Continue,
    /// The machine cannot make progress without waiting; the caller must
    /// surface this and re-invoke later with the same machine.
    Io,
    /// The machine ran to completion.
    Done(T),
}

/// A resumable, non-blocking state machine. Implementors encode their phase
/// as a tagged enum and advance it one collaborator call at a time inside
/// [`StateTransition::step`], so a machine can only ever be resumed at the
/// phase it suspended in.
pub trait StateTransition {
    type Context;
    type SMResult;

    /// Advance the machine by one transition. Must not block: operations
    /// that would wait return [`TransitionResult::Io`] instead.
    fn step(&mut self, context: &Self::Context) -> Result<TransitionResult<Self::SMResult>>;

    /// Mark the machine finished. Called by the implementation itself on its
    /// terminal transition.
    fn finalize(&mut self, context: &Self::Context) -> Result<()>;

    fn is_finalized(&self) -> bool;
}

/// Driver that runs a [`StateTransition`] to its next suspension point,
/// collapsing internal `Continue` transitions into a single
/// [`IOResult::Done`]-or-[`IOResult::IO`] answer for the caller.
pub struct StateMachine<S: StateTransition> {
    sm: S,
}

impl<S: StateTransition> StateMachine<S> {
    pub fn new(sm: S) -> Self {
        Self { sm }
    }

    pub fn step(&mut self, context: &S::Context) -> Result<IOResult<S::SMResult>> {
        loop {
            refaction_assert!(
                !self.sm.is_finalized(),
                "cannot step a finalized state machine"
            );
            match self.sm.step(context)? {
                TransitionResult::Continue => {}
                TransitionResult::Io => return Ok(IOResult::IO),
                TransitionResult::Done(result) => return Ok(IOResult::Done(result)),
            }
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.sm.is_finalized()
    }

    pub fn into_inner(self) -> S {
        self.sm
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefactionError {
    /// A RESTRICT policy found surviving child rows; the enclosing statement
    /// should be aborted by the caller.
    #[error("FOREIGN KEY constraint failed: {constraint}")]
    ForeignKeyViolation { constraint: String },
    /// Non-benign failure reported by the row store or cursor collaborator.
    #[error("Storage error: {0}")]
    Storage(String),
    /// Failure reported by the lock manager (distinct from would-block,
    /// which is not an error).
    #[error("Lock error: {0}")]
    Lock(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T, E = RefactionError> = std::result::Result<T, E>;

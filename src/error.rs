//! Normalized error model of the facade
//!
//! Two kinds reach callers:
//! - [`PreconditionError`]: argument or existence validation that failed
//!   before the client was asked to do the real work
//! - [`FacadeError::Operation`]: a client failure surfaced by a fail-fast
//!   operation, tagged with the client call and carrying the original cause
//!
//! Best-effort operations return `Result<bool, PreconditionError>` so their
//! signature shows that client failures are downgraded, never raised.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::fs::ClientOp;

/// Validation failure raised before delegating to the client
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    /// A path or name argument was empty or whitespace only
    #[error("{what} must not be blank")]
    BlankArgument { what: &'static str },

    /// A list argument had no elements
    #[error("{what} must not be empty")]
    EmptyList { what: &'static str },

    /// The remote target of `op` does not exist
    #[error("{op}: path does not exist: {path}")]
    PathNotFound { op: ClientOp, path: String },

    /// The local source of an upload does not exist
    #[error("{op}: local file does not exist: {}", path.display())]
    LocalSourceNotFound { op: ClientOp, path: PathBuf },
}

/// Error returned by fail-fast operations
#[derive(Debug, Error)]
pub enum FacadeError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("{op} failed for {path}: {source}")]
    Operation {
        op: ClientOp,
        path: String,
        #[source]
        source: io::Error,
    },
}

impl FacadeError {
    pub(crate) fn operation(op: ClientOp, path: impl Into<String>, source: io::Error) -> Self {
        FacadeError::Operation {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, FacadeError::Precondition(_))
    }

    /// Client call that failed, for operation errors
    pub fn op(&self) -> Option<ClientOp> {
        match self {
            FacadeError::Operation { op, .. } => Some(*op),
            FacadeError::Precondition(PreconditionError::PathNotFound { op, .. })
            | FacadeError::Precondition(PreconditionError::LocalSourceNotFound { op, .. }) => {
                Some(*op)
            }
            FacadeError::Precondition(_) => None,
        }
    }

    /// Original client error, for operation errors
    pub fn cause(&self) -> Option<&io::Error> {
        match self {
            FacadeError::Operation { source, .. } => Some(source),
            FacadeError::Precondition(_) => None,
        }
    }
}

pub type FacadeResult<T> = Result<T, FacadeError>;

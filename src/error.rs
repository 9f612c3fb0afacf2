//! Crate-level error surface.
//!
//! Thin wrapper over the per-module errors; callers who care about a
//! specific failure match on the variant.

use thiserror::Error;

use crate::controller::ControllerError;
use crate::history::HistoryError;
use crate::service::ServiceError;

/// Crate-level convenience error.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Controller(#[from] ControllerError),
}

impl Error {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Service(e) => e.retryable(),
            Error::History(e) => e.retryable(),
            Error::Controller(_) => false,
        }
    }
}

/// A product id failed structural validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid product id: {raw:?} (must be non-empty)")]
pub struct InvalidProductId {
    pub raw: String,
}

//! Application-level error taxonomy.

use thiserror::Error;

use common::OrderId;
use domain::{OrderError, RepositoryError};

/// Broad failure classes, useful for mapping to transport status
/// codes at an outer edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    InvalidState,
    Conflict,
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error(transparent)]
    Domain(#[from] OrderError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::OrderNotFound(_) => ErrorKind::NotFound,
            AppError::Domain(err) => match err {
                OrderError::InvalidOrderState { .. } => ErrorKind::InvalidState,
                OrderError::EmptyOrder | OrderError::MissingShippingAddress => {
                    ErrorKind::InvalidState
                }
                OrderError::OrderItemNotFound { .. } => ErrorKind::NotFound,
                _ => ErrorKind::Validation,
            },
            AppError::Repository(RepositoryError::ConcurrencyConflict { .. }) => {
                ErrorKind::Conflict
            }
            AppError::Repository(_) => ErrorKind::Internal,
        }
    }
}

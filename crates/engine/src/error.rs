//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidReference`] thrown when a referenced account or category is
//!   missing or belongs to another user.
//! - [`NotFound`] thrown when the target of an operation does not exist for
//!   the caller.
//! - [`Forbidden`] thrown when the caller can see an item but may not change
//!   it (system categories, other users' categories).
//! - [`Validation`] thrown when a request is malformed. Nothing is touched.
//! - [`Persistence`] thrown when the store fails while running an operation.
//!
//!  [`InvalidReference`]: EngineError::InvalidReference
//!  [`NotFound`]: EngineError::NotFound
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`Validation`]: EngineError::Validation
//!  [`Persistence`]: EngineError::Persistence
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    InvalidReference(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("{operation} failed: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: DbErr,
    },
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Tags a raw database error with the operation that was running.
    ///
    /// Domain errors pass through untouched.
    #[must_use]
    pub fn during(self, operation: &'static str) -> Self {
        match self {
            Self::Database(source) => Self::Persistence { operation, source },
            other => other,
        }
    }

    /// `true` for failures of the underlying store.
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::Database(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidReference(a), Self::InvalidReference(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (
                Self::Persistence {
                    operation: a,
                    source: a_source,
                },
                Self::Persistence {
                    operation: b,
                    source: b_source,
                },
            ) => a == b && a_source.to_string() == b_source.to_string(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

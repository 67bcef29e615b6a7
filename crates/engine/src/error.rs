//! The module contains the error the engine can throw.
//!
//! Every variant belongs to one [`ErrorKind`], which is what callers map to
//! their own surface (HTTP status, exit code, ...):
//!
//! - [`KeyNotFound`] thrown when an item is not found.
//! - [`ExistingKey`] thrown when a unique name is already taken.
//! - [`InvalidPlanType`] thrown when a plan kind is unknown or does not match
//!   the stored plan.
//! - [`Database`] thrown when the store fails.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`InvalidPlanType`]: EngineError::InvalidPlanType
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Coarse classification of [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Conflict,
    Forbidden,
    Internal,
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid plan type: {0}")]
    InvalidPlanType(String),
    #[error("Invalid kind: {0}")]
    InvalidKind(String),
    #[error("Invalid categories: {0}")]
    InvalidCategories(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Limit reached: {0}")]
    LimitReached(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::InvalidAmount(_)
            | Self::InvalidPlanType(_)
            | Self::InvalidKind(_)
            | Self::InvalidCategories(_)
            | Self::InvalidDate(_)
            | Self::InvalidName(_)
            | Self::InvalidId(_)
            | Self::InvalidCursor(_) => ErrorKind::InvalidInput,
            Self::ExistingKey(_) | Self::LimitReached(_) => ErrorKind::Conflict,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Database(_) => ErrorKind::Internal,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidPlanType(a), Self::InvalidPlanType(b)) => a == b,
            (Self::InvalidKind(a), Self::InvalidKind(b)) => a == b,
            (Self::InvalidCategories(a), Self::InvalidCategories(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::LimitReached(a), Self::LimitReached(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_variants() {
        assert_eq!(
            EngineError::KeyNotFound("plan".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::InvalidAmount("-1".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            EngineError::InvalidPlanType("saving".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            EngineError::InvalidKind("transfer".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            EngineError::InvalidCategories("empty".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            EngineError::ExistingKey("Food".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            EngineError::Database(DbErr::Custom("boom".into())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn database_errors_compare_by_message() {
        assert_eq!(
            EngineError::Database(DbErr::Custom("x".into())),
            EngineError::Database(DbErr::Custom("x".into()))
        );
        assert_ne!(
            EngineError::KeyNotFound("x".into()),
            EngineError::ExistingKey("x".into())
        );
    }
}

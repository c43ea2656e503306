//! The module contains the errors the engine can throw.
//!
//! Every variant maps onto a stable [`ErrorKind`], which is what callers
//! (the HTTP layer, batch reports) branch on:
//!
//! - the `*NotFound` variants map to [`ErrorKind::NotFound`]
//! - [`DuplicateRecord`] is raised when a settlement already exists for a
//!   period, either by the pre-check or by the unique index
//! - [`InvalidOperation`] / [`WithdrawalStatus`] are state-machine guard
//!   failures, detected before any mutation
//! - [`Database`] always wraps the underlying [`DbErr`]
//!
//!  [`DuplicateRecord`]: EngineError::DuplicateRecord
//!  [`InvalidOperation`]: EngineError::InvalidOperation
//!  [`WithdrawalStatus`]: EngineError::WithdrawalStatus
//!  [`Database`]: EngineError::Database
use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("merchant {0} not found")]
    MerchantNotFound(String),
    #[error("distributor {0} not found")]
    DistributorNotFound(String),
    #[error("settlement {0} not found")]
    SettlementNotFound(String),
    #[error("withdrawal {0} not found")]
    WithdrawalNotFound(String),
    #[error("user {0} not found")]
    UserNotFound(String),
    #[error("\"{0}\" already present!")]
    DuplicateRecord(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Invalid withdrawal status: {0}")]
    WithdrawalStatus(String),
    #[error("Insufficient frozen funds: {0}")]
    InsufficientFrozen(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Coarse error classification, stable across engine versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    DuplicateRecord,
    InvalidOperation,
    InvalidStatus,
    InvalidInput,
    Internal,
    Database,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::DuplicateRecord => "duplicate_record",
            Self::InvalidOperation => "invalid_operation",
            Self::InvalidStatus => "invalid_status",
            Self::InvalidInput => "invalid_input",
            Self::Internal => "internal",
            Self::Database => "database",
        }
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MerchantNotFound(_)
            | Self::DistributorNotFound(_)
            | Self::SettlementNotFound(_)
            | Self::WithdrawalNotFound(_)
            | Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateRecord(_) => ErrorKind::DuplicateRecord,
            Self::InvalidOperation(_) | Self::InsufficientFrozen(_) => {
                ErrorKind::InvalidOperation
            }
            Self::WithdrawalStatus(_) => ErrorKind::InvalidStatus,
            Self::InvalidPeriod(_) | Self::InvalidValue(_) | Self::InvalidCursor(_) => {
                ErrorKind::InvalidInput
            }
            Self::Export(_) => ErrorKind::Internal,
            Self::Database(_) => ErrorKind::Database,
        }
    }

    /// Maps an insert failure, turning unique-index violations into
    /// [`EngineError::DuplicateRecord`].
    pub(crate) fn from_insert(err: DbErr, record: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::DuplicateRecord(record.into()),
            _ => Self::Database(err),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::MerchantNotFound(a), Self::MerchantNotFound(b)) => a == b,
            (Self::DistributorNotFound(a), Self::DistributorNotFound(b)) => a == b,
            (Self::SettlementNotFound(a), Self::SettlementNotFound(b)) => a == b,
            (Self::WithdrawalNotFound(a), Self::WithdrawalNotFound(b)) => a == b,
            (Self::UserNotFound(a), Self::UserNotFound(b)) => a == b,
            (Self::DuplicateRecord(a), Self::DuplicateRecord(b)) => a == b,
            (Self::InvalidOperation(a), Self::InvalidOperation(b)) => a == b,
            (Self::WithdrawalStatus(a), Self::WithdrawalStatus(b)) => a == b,
            (Self::InsufficientFrozen(a), Self::InsufficientFrozen(b)) => a == b,
            (Self::InvalidPeriod(a), Self::InvalidPeriod(b)) => a == b,
            (Self::InvalidValue(a), Self::InvalidValue(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::Export(a), Self::Export(b)) => a.to_string() == b.to_string(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

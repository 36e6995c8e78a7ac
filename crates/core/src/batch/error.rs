//! Transaction batch error types.

use coopledger_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::LedgerError;

/// Errors raised by the Transaction Batch Aggregator.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The employee already has an open batch in this branch.
    #[error("Employee {employee_user_id} already has an open transaction batch")]
    AlreadyOpen {
        /// Employee holding the open batch.
        employee_user_id: Uuid,
    },

    /// The employee has no open batch in this branch.
    #[error("No open transaction batch for employee {0}")]
    NoOpenBatch(Uuid),

    /// The batch is closed; closing is one-way.
    #[error("Transaction batch {0} is closed")]
    BatchClosed(Uuid),

    /// The batch must be closed before this action.
    #[error("Transaction batch {0} is still open")]
    StillOpen(Uuid),

    /// Batch not found in this tenant.
    #[error("Transaction batch not found: {0}")]
    NotFound(Uuid),

    /// A supervisor tried to grant a view nobody requested.
    #[error("View of transaction batch {0} was not requested")]
    ViewNotRequested(Uuid),

    /// Deposit in bank cannot be negative.
    #[error("Deposit in bank cannot be negative")]
    NegativeDeposit,

    /// Cash count quantity cannot be negative.
    #[error("Cash count quantity cannot be negative")]
    NegativeQuantity,

    /// Fundings, remittances, disbursements and bill amounts cannot be negative.
    #[error("Batch {input} amount cannot be negative")]
    NegativeAmount {
        /// Which side input carried the amount.
        input: &'static str,
    },

    /// Lock wait on the batch row exceeded the configured timeout.
    #[error("Timed out waiting for the lock on transaction batch {0}")]
    LockTimeout(Uuid),

    /// Failure from the ledger while summing batch postings.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error with the batch it occurred on.
    #[error("Database error on transaction batch {batch_id:?}: {message}")]
    Database {
        /// Batch being processed, if known.
        batch_id: Option<Uuid>,
        /// Underlying error text.
        message: String,
    },
}

impl BatchError {
    /// Wraps a storage error with the batch it occurred on.
    #[must_use]
    pub fn database(batch_id: Option<Uuid>, message: impl std::fmt::Display) -> Self {
        Self::Database {
            batch_id,
            message: message.to_string(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyOpen { .. } => "BATCH_ALREADY_OPEN",
            Self::NoOpenBatch(_) => "NO_OPEN_BATCH",
            Self::BatchClosed(_) => "BATCH_CLOSED",
            Self::StillOpen(_) => "BATCH_STILL_OPEN",
            Self::NotFound(_) => "BATCH_NOT_FOUND",
            Self::ViewNotRequested(_) => "VIEW_NOT_REQUESTED",
            Self::NegativeDeposit => "NEGATIVE_DEPOSIT",
            Self::NegativeQuantity => "NEGATIVE_QUANTITY",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::LockTimeout(_) => "LOCK_TIMEOUT",
            Self::Ledger(err) => err.error_code(),
            Self::Database { .. } => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NegativeDeposit | Self::NegativeQuantity | Self::NegativeAmount { .. } => 400,
            Self::NotFound(_) | Self::NoOpenBatch(_) => 404,
            Self::AlreadyOpen { .. }
            | Self::BatchClosed(_)
            | Self::StillOpen(_)
            | Self::ViewNotRequested(_) => 409,
            Self::LockTimeout(_) => 503,
            Self::Ledger(err) => err.http_status_code(),
            Self::Database { .. } => 500,
        }
    }

    /// Returns true if the caller may re-attempt the operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::LockTimeout(_) => true,
            Self::Ledger(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        if let BatchError::Ledger(inner) = err {
            return inner.into();
        }
        let message = err.to_string();
        match err {
            BatchError::NegativeDeposit | BatchError::NegativeQuantity | BatchError::NegativeAmount { .. } => {
                Self::Validation(message)
            }
            BatchError::NotFound(_) | BatchError::NoOpenBatch(_) => Self::NotFound(message),
            BatchError::AlreadyOpen { .. }
            | BatchError::BatchClosed(_)
            | BatchError::StillOpen(_)
            | BatchError::ViewNotRequested(_) => Self::Conflict(message),
            BatchError::LockTimeout(_) => Self::Concurrency(message),
            BatchError::Ledger(_) | BatchError::Database { .. } => Self::Database(message),
        }
    }
}

//! Voucher lifecycle error types.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use coopledger_shared::AppError;

use crate::batch::BatchError;
use crate::ledger::LedgerError;
use crate::voucher::types::{VoucherKind, VoucherStage};

/// Errors that can occur during voucher lifecycle operations.
#[derive(Debug, Error)]
pub enum VoucherError {
    /// The voucher does not exist within the organization and branch.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Document family.
        kind: VoucherKind,
        /// Voucher id.
        id: Uuid,
    },

    /// The requested transition is not allowed from the current stage.
    #[error("Invalid voucher transition from {from} to {to}")]
    InvalidTransition {
        /// Current stage.
        from: VoucherStage,
        /// Requested stage.
        to: VoucherStage,
    },

    /// Voucher entries violate the balance law.
    #[error("Voucher is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Σ entry debit.
        debit: Decimal,
        /// Σ entry credit.
        credit: Decimal,
    },

    /// Voucher has no entries to print or release.
    #[error("Voucher has no entries")]
    NoEntries,

    /// Entries cannot change once the voucher has been printed.
    #[error("Voucher entries are frozen at stage {stage}")]
    EntriesFrozen {
        /// Current stage.
        stage: VoucherStage,
    },

    /// A checkpoint would be earlier than the one before it.
    #[error("Voucher checkpoints must be monotonically ordered")]
    CheckpointOutOfOrder,

    /// Stored checkpoints skip a stage.
    #[error("Voucher checkpoints are inconsistent: {0}")]
    CorruptCheckpoints(String),

    /// A cancelled journal voucher accepts no further action.
    #[error("Voucher {0} is cancelled")]
    Cancelled(Uuid),

    /// The stored currency code is not one the ledger knows.
    #[error("Voucher {voucher_id} has unknown currency {code:?}")]
    InvalidCurrency {
        /// Voucher id.
        voucher_id: Uuid,
        /// Stored code.
        code: String,
    },

    /// Releasing requires the releasing employee to have an open batch.
    #[error("No open transaction batch for employee {0}")]
    NoOpenBatch(Uuid),

    /// Posting the released voucher failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Re-balancing the releasing employee's batch failed.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// Database error, with the voucher it occurred on.
    #[error("Database error on voucher {voucher_id}: {message}")]
    Database {
        /// Voucher id.
        voucher_id: Uuid,
        /// Underlying error text.
        message: String,
    },
}

impl VoucherError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "VOUCHER_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Unbalanced { .. } => "UNBALANCED",
            Self::NoEntries => "NO_ENTRIES",
            Self::EntriesFrozen { .. } => "ENTRIES_FROZEN",
            Self::CheckpointOutOfOrder => "CHECKPOINT_OUT_OF_ORDER",
            Self::CorruptCheckpoints(_) => "CORRUPT_CHECKPOINTS",
            Self::InvalidCurrency { .. } => "INVALID_CURRENCY",
            Self::Cancelled(_) => "VOUCHER_CANCELLED",
            Self::NoOpenBatch(_) => "NO_OPEN_BATCH",
            Self::Ledger(err) => err.error_code(),
            Self::Batch(err) => err.error_code(),
            Self::Database { .. } => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::InvalidTransition { .. }
            | Self::EntriesFrozen { .. }
            | Self::Cancelled(_)
            | Self::NoOpenBatch(_) => 409,
            Self::Unbalanced { .. } | Self::NoEntries | Self::CheckpointOutOfOrder => 400,
            Self::Ledger(err) => err.http_status_code(),
            Self::Batch(err) => err.http_status_code(),
            Self::CorruptCheckpoints(_) | Self::InvalidCurrency { .. } | Self::Database { .. } => 500,
        }
    }

    /// Returns true if the caller may re-attempt the operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Ledger(err) => err.is_retryable(),
            Self::Batch(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<VoucherError> for AppError {
    fn from(err: VoucherError) -> Self {
        let message = err.to_string();
        match err {
            VoucherError::Ledger(inner) => inner.into(),
            VoucherError::Batch(inner) => inner.into(),
            VoucherError::NotFound { .. } => Self::NotFound(message),
            VoucherError::InvalidTransition { .. }
            | VoucherError::EntriesFrozen { .. }
            | VoucherError::Cancelled(_)
            | VoucherError::NoOpenBatch(_) => Self::Conflict(message),
            VoucherError::Unbalanced { .. }
            | VoucherError::NoEntries
            | VoucherError::CheckpointOutOfOrder => Self::Validation(message),
            VoucherError::CorruptCheckpoints(_) | VoucherError::InvalidCurrency { .. } => Self::Internal(message),
            VoucherError::Database { .. } => Self::Database(message),
        }
    }
}

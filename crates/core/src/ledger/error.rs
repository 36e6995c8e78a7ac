//! Ledger error types for posting and balance resolution.
//!
//! Validation errors are raised before any write. Concurrency errors are
//! retryable. Storage errors carry the operation context they occurred in.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use coopledger_shared::AppError;

use crate::ledger::balance::BalanceScope;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// A posting must carry at least one line.
    #[error("Posting has no entries")]
    NoEntries,

    /// Σdebit and Σcredit differ after rounding to the currency scale.
    #[error("Posting is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit.
        debit: Decimal,
        /// Total credit.
        credit: Decimal,
    },

    /// Entry amounts cannot be negative.
    #[error("Entry {line} has a negative amount")]
    NegativeAmount {
        /// Zero-based line index.
        line: usize,
    },

    /// An entry carries both a debit and a credit.
    #[error("Entry {line} specifies both debit and credit")]
    DoubleSided {
        /// Zero-based line index.
        line: usize,
    },

    /// An account transaction header disagrees with the sum of its entries.
    #[error("Header totals ({header_debit}/{header_credit}) do not match entries ({entries_debit}/{entries_credit})")]
    HeaderMismatch {
        /// Header debit.
        header_debit: Decimal,
        /// Header credit.
        header_credit: Decimal,
        /// Σ entry debit.
        entries_debit: Decimal,
        /// Σ entry credit.
        entries_credit: Decimal,
    },

    // ========== Reference Errors ==========
    /// Account does not exist within the organization and branch.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Account transaction does not exist.
    #[error("Account transaction not found: {0}")]
    AccountTransactionNotFound(Uuid),

    /// General ledger line does not exist within the organization and branch.
    #[error("Ledger entry not found: {0}")]
    EntryNotFound(Uuid),

    /// Passbook print numbers are kept per member; the line has none.
    #[error("Ledger entry {0} has no member to print for")]
    NotAMemberEntry(Uuid),

    /// The branch has no cash-on-hand account configured.
    #[error("Cash-on-hand account is not configured for branch {0}")]
    CashOnHandNotConfigured(Uuid),

    /// The branch has no settings row to issue receipt numbers from.
    #[error("Branch settings not found for branch {0}")]
    BranchSettingsNotFound(Uuid),

    /// The target transaction batch is closed.
    #[error("Transaction batch {0} is closed")]
    BatchClosed(Uuid),

    /// The target transaction batch does not exist.
    #[error("Transaction batch not found: {0}")]
    BatchNotFound(Uuid),

    /// The requested entry date precedes the latest line on a scope.
    #[error("Entry date {entry_date} precedes the latest line on {scope} ({latest})")]
    Backdated {
        /// The scope that already has a later line.
        scope: String,
        /// Requested entry date.
        entry_date: chrono::DateTime<chrono::Utc>,
        /// Entry date of the scope's latest line.
        latest: chrono::DateTime<chrono::Utc>,
    },

    // ========== Concurrency Errors ==========
    /// A row lock could not be acquired within the configured bound.
    #[error("Timed out waiting for balance lock on {scope}")]
    LockTimeout {
        /// The contended scope.
        scope: String,
    },

    /// The database aborted the unit of work to keep it serializable.
    #[error("Concurrent modification detected on {scope}, please retry")]
    ConcurrentModification {
        /// The contended scope.
        scope: String,
    },

    // ========== Storage Errors ==========
    /// Database error, with the operation it occurred in.
    #[error("Database error while {context}: {message}")]
    Database {
        /// What the repository was doing.
        context: String,
        /// Underlying error text.
        message: String,
    },
}

impl LedgerError {
    /// Builds a retryable lock timeout for a scope.
    #[must_use]
    pub fn lock_timeout(scope: &BalanceScope) -> Self {
        Self::LockTimeout {
            scope: scope.to_string(),
        }
    }

    /// Wraps a storage error with the operation it occurred in.
    #[must_use]
    pub fn database(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Database {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoEntries => "NO_ENTRIES",
            Self::Unbalanced { .. } => "UNBALANCED",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::DoubleSided { .. } => "DOUBLE_SIDED_ENTRY",
            Self::HeaderMismatch { .. } => "HEADER_MISMATCH",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountTransactionNotFound(_) => "ACCOUNT_TRANSACTION_NOT_FOUND",
            Self::EntryNotFound(_) => "LEDGER_ENTRY_NOT_FOUND",
            Self::NotAMemberEntry(_) => "NOT_A_MEMBER_ENTRY",
            Self::CashOnHandNotConfigured(_) => "CASH_ON_HAND_NOT_CONFIGURED",
            Self::BranchSettingsNotFound(_) => "BRANCH_SETTINGS_NOT_FOUND",
            Self::BatchClosed(_) => "BATCH_CLOSED",
            Self::BatchNotFound(_) => "BATCH_NOT_FOUND",
            Self::Backdated { .. } => "BACKDATED_ENTRY",
            Self::LockTimeout { .. } => "LOCK_TIMEOUT",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::Database { .. } => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NoEntries
            | Self::Unbalanced { .. }
            | Self::NegativeAmount { .. }
            | Self::DoubleSided { .. }
            | Self::HeaderMismatch { .. } => 400,
            Self::AccountNotFound(_)
            | Self::AccountTransactionNotFound(_)
            | Self::EntryNotFound(_)
            | Self::BranchSettingsNotFound(_)
            | Self::BatchNotFound(_) => 404,
            Self::BatchClosed(_) | Self::Backdated { .. } => 409,
            Self::CashOnHandNotConfigured(_) | Self::NotAMemberEntry(_) => 422,
            Self::LockTimeout { .. } | Self::ConcurrentModification { .. } => 503,
            Self::Database { .. } => 500,
        }
    }

    /// Returns true if the caller may re-attempt the whole posting.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LockTimeout { .. } | Self::ConcurrentModification { .. }
        )
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::NoEntries
            | LedgerError::Unbalanced { .. }
            | LedgerError::NegativeAmount { .. }
            | LedgerError::DoubleSided { .. }
            | LedgerError::HeaderMismatch { .. } => Self::Validation(message),
            LedgerError::AccountNotFound(_)
            | LedgerError::AccountTransactionNotFound(_)
            | LedgerError::EntryNotFound(_)
            | LedgerError::BranchSettingsNotFound(_)
            | LedgerError::BatchNotFound(_) => Self::NotFound(message),
            LedgerError::BatchClosed(_) | LedgerError::Backdated { .. } => Self::Conflict(message),
            LedgerError::CashOnHandNotConfigured(_) | LedgerError::NotAMemberEntry(_) => {
                Self::BusinessRule(message)
            }
            LedgerError::LockTimeout { .. } | LedgerError::ConcurrentModification { .. } => {
                Self::Concurrency(message)
            }
            LedgerError::Database { .. } => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unbalanced_carries_both_sums() {
        let err = LedgerError::Unbalanced {
            debit: dec!(1000),
            credit: dec!(900),
        };
        assert_eq!(
            err.to_string(),
            "Posting is not balanced. Debit: 1000, Credit: 900"
        );
        assert_eq!(err.error_code(), "UNBALANCED");
        assert_eq!(err.http_status_code(), 400);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_lock_errors_are_retryable() {
        let timeout = LedgerError::LockTimeout {
            scope: "org/branch/account".into(),
        };
        let conflict = LedgerError::ConcurrentModification {
            scope: "org/branch/account".into(),
        };
        assert!(timeout.is_retryable());
        assert!(conflict.is_retryable());
        assert_eq!(timeout.http_status_code(), 503);
    }

    #[test]
    fn test_database_error_keeps_context() {
        let err = LedgerError::database("locking balance row", "connection reset");
        assert_eq!(
            err.to_string(),
            "Database error while locking balance row: connection reset"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = LedgerError::BatchClosed(Uuid::nil()).into();
        assert_eq!(app.status_code(), 409);

        let app: AppError = LedgerError::LockTimeout { scope: "s".into() }.into();
        assert!(app.is_retryable());
    }

    #[test]
    fn test_print_errors() {
        let missing = LedgerError::EntryNotFound(Uuid::nil());
        assert_eq!(missing.http_status_code(), 404);
        assert_eq!(missing.error_code(), "LEDGER_ENTRY_NOT_FOUND");

        let app: AppError = LedgerError::NotAMemberEntry(Uuid::nil()).into();
        assert_eq!(app.status_code(), 422);
    }
}

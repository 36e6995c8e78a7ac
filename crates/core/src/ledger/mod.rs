//! Double-entry general ledger logic.
//!
//! This module implements the pure half of the posting subsystem:
//! - Ledger sources, books and account classifications
//! - Posting input and posted lines
//! - Balance law validation
//! - Balance scopes and running balance arithmetic
//! - Account transaction headers
//! - Official receipt series
//! - Error types for ledger operations

pub mod balance;
pub mod book;
pub mod entry;
pub mod error;
pub mod posting;
pub mod receipt;
pub mod types;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod posting_props;

pub use balance::{
    BalanceScope, BalanceSnapshot, ContinuityBreak, MemberLedgerTotal, NormalSide, RunningBalance,
    ScopeTarget, daily_ending_balances, verify_continuity,
};
pub use book::{AccountTransactionDraft, AccountTransactionLine};
pub use entry::{LedgerEntry, PostingDocument, PostingHeader, PostingLine};
pub use error::LedgerError;
pub use posting::{DebitCredit, PostingService, PostingTotals};
pub use receipt::{IssuedReceipt, ReceiptKind, ReceiptSeries};
pub use types::{
    AccountKind, AccountTransactionSource, GeneralLedgerType, LedgerSource, NamedAccount,
    PaymentKind,
};

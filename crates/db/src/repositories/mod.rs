//! Repositories over the ledger schema.
//!
//! Each repository owns a `DatabaseConnection`; operations that lock rows open
//! their own unit of work, and the `*_within` variants run inside a caller's.

pub mod account_transaction;
pub mod batch;
pub mod cash_check_voucher;
pub mod journal_voucher;
pub mod ledger;
pub mod posting;
pub mod voucher_state;
mod voucher_store;

pub use account_transaction::{AccountTransactionRepository, AccountTransactionWithEntries};
pub use batch::{FundingInput, OpenBatchInput, RemittanceInput, TransactionBatchRepository};
pub use cash_check_voucher::{CashCheckVoucherRepository, CashCheckVoucherWithEntries, NewCashCheckVoucher};
pub use journal_voucher::{JournalVoucherRepository, JournalVoucherWithEntries, NewJournalVoucher};
pub use ledger::{LedgerFilter, LedgerRepository};
pub use posting::{PostedTransaction, PostingRepository};
pub use voucher_state::VoucherEntryInput;

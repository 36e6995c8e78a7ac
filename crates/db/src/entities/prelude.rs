//! Entity re-exports.

pub use super::account_transaction_entries::Entity as AccountTransactionEntries;
pub use super::account_transactions::Entity as AccountTransactions;
pub use super::accounts::Entity as Accounts;
pub use super::batch_fundings::Entity as BatchFundings;
pub use super::batch_remittances::Entity as BatchRemittances;
pub use super::branch_settings::Entity as BranchSettings;
pub use super::cash_check_voucher_entries::Entity as CashCheckVoucherEntries;
pub use super::cash_check_vouchers::Entity as CashCheckVouchers;
pub use super::cash_counts::Entity as CashCounts;
pub use super::disbursement_transactions::Entity as DisbursementTransactions;
pub use super::general_ledgers::Entity as GeneralLedgers;
pub use super::journal_voucher_entries::Entity as JournalVoucherEntries;
pub use super::journal_vouchers::Entity as JournalVouchers;
pub use super::transaction_batches::Entity as TransactionBatches;

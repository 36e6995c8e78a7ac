//! `SeaORM` entity definitions.
//!
//! Hand-written to match the raw-SQL schema in `migration`. Every table
//! carries `organization_id`, `branch_id` and the audit columns; repositories
//! filter on `deleted_at IS NULL` explicitly.

pub mod prelude;

pub mod account_transaction_entries;
pub mod account_transactions;
pub mod accounts;
pub mod batch_fundings;
pub mod batch_remittances;
pub mod branch_settings;
pub mod cash_check_voucher_entries;
pub mod cash_check_vouchers;
pub mod cash_counts;
pub mod disbursement_transactions;
pub mod general_ledgers;
pub mod journal_voucher_entries;
pub mod journal_vouchers;
pub mod sea_orm_active_enums;
pub mod transaction_batches;

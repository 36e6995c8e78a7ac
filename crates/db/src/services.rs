//! Repositories wired to one connection pool and one event publisher.

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

use coopledger_core::events::EventPublisher;

use crate::repositories::{
    AccountTransactionRepository, CashCheckVoucherRepository, JournalVoucherRepository, LedgerRepository,
    PostingRepository, TransactionBatchRepository,
};
use crate::unit_of_work::PostingOptions;

/// Every repository of the ledger, sharing a pool, retry bounds and publisher.
#[derive(Clone)]
pub struct LedgerServices {
    /// Balance Resolver and ledger reads.
    pub ledger: LedgerRepository,
    /// Double-Entry Poster.
    pub posting: PostingRepository,
    /// Transaction Batch Aggregator.
    pub batches: TransactionBatchRepository,
    /// Journal voucher lifecycle.
    pub journal: JournalVoucherRepository,
    /// Cash check voucher lifecycle.
    pub cash_check: CashCheckVoucherRepository,
    /// Standalone book headers.
    pub books: AccountTransactionRepository,
}

impl LedgerServices {
    /// Builds every repository over `db`.
    ///
    /// `batch_tolerance` is the remittance difference still classified as balanced.
    #[must_use]
    pub fn new(
        db: &DatabaseConnection,
        options: PostingOptions,
        batch_tolerance: Decimal,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let batches = TransactionBatchRepository::new(db.clone(), options, Arc::clone(&publisher), batch_tolerance);
        Self {
            ledger: LedgerRepository::new(db.clone()).with_options(options),
            posting: PostingRepository::new(db.clone(), options, Arc::clone(&publisher)),
            journal: JournalVoucherRepository::new(db.clone(), options, Arc::clone(&publisher), batches.clone()),
            cash_check: CashCheckVoucherRepository::new(db.clone(), options, Arc::clone(&publisher), batches.clone()),
            books: AccountTransactionRepository::new(db.clone(), options, publisher),
            batches,
        }
    }
}

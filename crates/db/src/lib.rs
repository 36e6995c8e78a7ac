//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the ledger, voucher and batch tables
//! - The Double-Entry Poster, Balance Resolver, voucher and batch repositories
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod services;
pub mod unit_of_work;

pub use repositories::{
    AccountTransactionRepository, CashCheckVoucherRepository, JournalVoucherRepository, LedgerRepository,
    PostingRepository, TransactionBatchRepository,
};
pub use services::LedgerServices;
pub use unit_of_work::{PostingOptions, UnitOfWork, with_retry};

use std::time::Duration;

use coopledger_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection sized from configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}

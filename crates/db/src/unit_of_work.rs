//! Bounded-wait units of work and scope locking.
//!
//! Every write path runs inside one `UnitOfWork`: a database transaction
//! whose first statement is `SET LOCAL lock_timeout`, so no lock wait inside
//! it can exceed the configured bound.
//!
//! # Usage
//!
//! ```ignore
//! use coopledger_db::unit_of_work::UnitOfWorkExt;
//!
//! let uow = db.unit_of_work(options.lock_timeout).await?;
//! acquire_scope_lock(uow.transaction(), &scope.lock_key()).await?;
//! // ... reads with FOR UPDATE, inserts ...
//! uow.commit().await?;
//! ```

use std::future::Future;
use std::time::Duration;

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, RuntimeErr,
    Statement, TransactionTrait,
};
use tracing::warn;
use uuid::Uuid;

use coopledger_core::batch::BatchError;
use coopledger_core::ledger::LedgerError;
use coopledger_core::voucher::VoucherError;
use coopledger_shared::config::LedgerConfig;

/// Name of the partial unique index guarding one open batch per employee.
pub const OPEN_BATCH_INDEX: &str = "uq_transaction_batches_open";

/// Name of the unique index guarding one ledger line per scope version.
pub const SCOPE_VERSION_INDEX: &str = "uq_general_ledgers_scope_version";

/// Lock and retry bounds for write paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingOptions {
    /// Upper bound on any single lock wait.
    pub lock_timeout: Duration,
    /// How many times a retryable failure is re-attempted.
    pub max_retries: u32,
    /// Base pause between attempts; attempt `n` waits `n × backoff`.
    pub backoff: Duration,
}

impl Default for PostingOptions {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for PostingOptions {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            lock_timeout: config.lock_timeout(),
            max_retries: config.max_post_retries,
            backoff: config.retry_backoff(),
        }
    }
}

/// A database transaction with a bounded lock wait.
pub struct UnitOfWork {
    txn: DatabaseTransaction,
}

impl UnitOfWork {
    /// Begins a transaction and bounds its lock waits.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the timeout
    /// cannot be set.
    pub async fn begin(db: &DatabaseConnection, lock_timeout: Duration) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        set_lock_timeout(&txn, lock_timeout).await?;
        Ok(Self { txn })
    }

    /// Returns the underlying transaction for executing queries.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

/// Extension trait for `DatabaseConnection` to open bounded units of work.
#[async_trait::async_trait]
pub trait UnitOfWorkExt {
    /// Begins a unit of work whose lock waits are bounded by `lock_timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit of work cannot be started.
    async fn unit_of_work(&self, lock_timeout: Duration) -> Result<UnitOfWork, DbErr>;
}

#[async_trait::async_trait]
impl UnitOfWorkExt for DatabaseConnection {
    async fn unit_of_work(&self, lock_timeout: Duration) -> Result<UnitOfWork, DbErr> {
        UnitOfWork::begin(self, lock_timeout).await
    }
}

/// `SET LOCAL lock_timeout` for the rest of the transaction.
fn lock_timeout_sql(lock_timeout: Duration) -> String {
    format!("SET LOCAL lock_timeout = '{}ms'", lock_timeout.as_millis().max(1))
}

/// Bounds lock waits on an existing transaction.
///
/// # Errors
///
/// Returns an error if the setting cannot be applied.
pub async fn set_lock_timeout(txn: &DatabaseTransaction, lock_timeout: Duration) -> Result<(), DbErr> {
    txn.execute_unprepared(&lock_timeout_sql(lock_timeout)).await?;
    Ok(())
}

/// Takes the transaction-scoped advisory lock for a scope key.
///
/// The lock serializes writers on a scope even before its first ledger line
/// exists, which a row lock alone cannot do. It is released at commit or
/// rollback.
///
/// # Errors
///
/// Returns the raw error; a `55P03` code means the wait exceeded the bound.
pub async fn acquire_scope_lock<C: ConnectionTrait>(conn: &C, key: &str) -> Result<(), DbErr> {
    conn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))",
        [key.into()],
    ))
    .await?;
    Ok(())
}

/// What a failed statement means to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbFailure {
    /// `55P03`: a lock wait exceeded `lock_timeout`.
    LockTimeout,
    /// `40001` / `40P01`: serialization failure or deadlock.
    Serialization,
    /// `23505`, with the violated constraint when Postgres reports it.
    UniqueViolation(Option<String>),
    /// Anything else.
    Other,
}

/// Classifies a database error by SQLSTATE.
#[must_use]
pub fn classify(err: &DbErr) -> DbFailure {
    let (DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
    | DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))) = err
    else {
        return DbFailure::Other;
    };

    match db_err.code().as_deref() {
        Some("55P03") => DbFailure::LockTimeout,
        Some("40001" | "40P01") => DbFailure::Serialization,
        Some("23505") => DbFailure::UniqueViolation(db_err.constraint().map(str::to_owned)),
        _ => DbFailure::Other,
    }
}

/// Maps a storage error raised while posting into a ledger error.
///
/// `scope` names the contended scope for retryable failures; `context` names
/// the operation for everything else.
#[must_use]
pub fn ledger_failure(err: &DbErr, context: &str, scope: &str) -> LedgerError {
    match classify(err) {
        DbFailure::LockTimeout => LedgerError::LockTimeout {
            scope: scope.to_owned(),
        },
        DbFailure::Serialization => LedgerError::ConcurrentModification {
            scope: scope.to_owned(),
        },
        DbFailure::UniqueViolation(Some(constraint)) if constraint == SCOPE_VERSION_INDEX => {
            LedgerError::ConcurrentModification {
                scope: scope.to_owned(),
            }
        }
        DbFailure::UniqueViolation(_) | DbFailure::Other => LedgerError::database(context, err),
    }
}

/// Maps a storage error raised on a batch row into a batch error.
#[must_use]
pub fn batch_failure(err: &DbErr, batch_id: Uuid) -> BatchError {
    match classify(err) {
        DbFailure::LockTimeout => BatchError::LockTimeout(batch_id),
        DbFailure::Serialization => LedgerError::ConcurrentModification {
            scope: format!("batch {batch_id}"),
        }
        .into(),
        DbFailure::UniqueViolation(_) | DbFailure::Other => BatchError::database(Some(batch_id), err),
    }
}

/// Maps a storage error raised on a voucher row into a voucher error.
#[must_use]
pub fn voucher_failure(err: &DbErr, voucher_id: Uuid) -> VoucherError {
    let scope = format!("voucher {voucher_id}");
    match classify(err) {
        DbFailure::LockTimeout => LedgerError::LockTimeout { scope }.into(),
        DbFailure::Serialization => LedgerError::ConcurrentModification { scope }.into(),
        DbFailure::UniqueViolation(_) | DbFailure::Other => VoucherError::Database {
            voucher_id,
            message: err.to_string(),
        },
    }
}

/// Errors a write path may re-attempt.
pub trait Retryable {
    /// Returns true if a fresh attempt may succeed.
    fn is_retryable(&self) -> bool;
}

impl Retryable for LedgerError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

impl Retryable for VoucherError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

impl Retryable for BatchError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

/// Runs `attempt` until it succeeds, fails for good, or the retry bound is spent.
///
/// Each attempt must open its own unit of work so a retry starts from a
/// clean transaction.
///
/// # Errors
///
/// Returns the last error once it is not retryable or `max_retries` is reached.
pub async fn with_retry<T, E, F, Fut>(options: &PostingOptions, operation: &'static str, mut attempt: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut tries: u32 = 0;
    loop {
        match attempt(tries).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && tries < options.max_retries => {
                tries += 1;
                warn!(operation, attempt = tries, error = %err, "Retrying after contention");
                tokio::time::sleep(options.backoff.saturating_mul(tries)).await;
            }
            Err(err) => return Err(err),
        }
    }
}

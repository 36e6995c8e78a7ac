//! Account transaction (daily book header) repository.

use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::info;

use coopledger_core::events::{DomainEvent, EntityKind, EntityRef, EventPublisher, publish_all};
use coopledger_core::ledger::{AccountTransactionDraft, LedgerError};
use coopledger_shared::types::{AccountTransactionId, Tenant, UserId};

use crate::entities::{account_transaction_entries, account_transactions};
use crate::repositories::posting::PostingRepository;
use crate::unit_of_work::{PostingOptions, UnitOfWork, ledger_failure};

/// An account transaction with its live entries.
#[derive(Debug, Clone)]
pub struct AccountTransactionWithEntries {
    /// Header.
    pub transaction: account_transactions::Model,
    /// Entries.
    pub entries: Vec<account_transaction_entries::Model>,
}

/// Account transaction repository.
#[derive(Clone)]
pub struct AccountTransactionRepository {
    db: DatabaseConnection,
    options: PostingOptions,
    publisher: Arc<dyn EventPublisher>,
}

impl AccountTransactionRepository {
    /// Creates a new account transaction repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, options: PostingOptions, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { db, options, publisher }
    }

    /// Writes a header and its entries.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::HeaderMismatch` if the header totals differ from
    /// the entry sums, or `LedgerError::NoEntries` for an empty draft.
    pub async fn create(
        &self,
        tenant: Tenant,
        draft: &AccountTransactionDraft,
        actor: UserId,
    ) -> Result<AccountTransactionWithEntries, LedgerError> {
        draft.validate()?;

        let scope = tenant.to_string();
        let uow = UnitOfWork::begin(&self.db, self.options.lock_timeout)
            .await
            .map_err(|e| ledger_failure(&e, "beginning account transaction", &scope))?;
        let (transaction, entries) =
            PostingRepository::insert_account_transaction(uow.transaction(), tenant, draft, actor.into_inner(), Utc::now())
                .await?;
        uow.commit()
            .await
            .map_err(|e| ledger_failure(&e, "committing account transaction", &scope))?;

        info!(account_transaction_id = %transaction.id, source = ?draft.source, "Account transaction created");
        publish_all(
            self.publisher.as_ref(),
            [DomainEvent::Created(EntityRef::new(
                EntityKind::AccountTransaction,
                transaction.id,
                tenant,
                Some(actor),
            ))],
        );
        Ok(AccountTransactionWithEntries { transaction, entries })
    }

    /// Fetches one header with its entries.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountTransactionNotFound` if it does not exist in the tenant.
    pub async fn get(
        &self,
        tenant: Tenant,
        id: AccountTransactionId,
    ) -> Result<AccountTransactionWithEntries, LedgerError> {
        let id = id.into_inner();
        let transaction = account_transactions::Entity::find_by_id(id)
            .filter(account_transactions::Column::OrganizationId.eq(tenant.organization_id.into_inner()))
            .filter(account_transactions::Column::BranchId.eq(tenant.branch_id.into_inner()))
            .filter(account_transactions::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| LedgerError::database("loading account transaction", e))?
            .ok_or(LedgerError::AccountTransactionNotFound(id))?;

        let entries = account_transaction_entries::Entity::find()
            .filter(account_transaction_entries::Column::AccountTransactionId.eq(id))
            .filter(account_transaction_entries::Column::DeletedAt.is_null())
            .order_by_asc(account_transaction_entries::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| LedgerError::database("loading account transaction entries", e))?;

        Ok(AccountTransactionWithEntries { transaction, entries })
    }

    /// Headers dated within one calendar month, oldest first.
    ///
    /// An out-of-range month yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_by_month(
        &self,
        tenant: Tenant,
        year: i32,
        month: u32,
    ) -> Result<Vec<account_transactions::Model>, LedgerError> {
        let Some((first, next)) = month_range(year, month) else {
            return Ok(Vec::new());
        };

        account_transactions::Entity::find()
            .filter(account_transactions::Column::OrganizationId.eq(tenant.organization_id.into_inner()))
            .filter(account_transactions::Column::BranchId.eq(tenant.branch_id.into_inner()))
            .filter(account_transactions::Column::DeletedAt.is_null())
            .filter(account_transactions::Column::TransactionDate.gte(first))
            .filter(account_transactions::Column::TransactionDate.lt(next))
            .order_by_asc(account_transactions::Column::TransactionDate)
            .order_by_asc(account_transactions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| LedgerError::database("listing account transactions", e))
    }
}

/// `[first day of month, first day of next month)`.
fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    debug_assert_eq!(next.day(), 1);
    Some((first, next))
}

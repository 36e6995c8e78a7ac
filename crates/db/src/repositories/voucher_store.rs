//! Persistence shared by journal and cash check vouchers.
//!
//! Both families store a header row with the same checkpoint columns and a
//! child table of entries. Row access is generated per table; the unit of
//! work, event publishing and the release posting live on [`VoucherStore`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use coopledger_core::events::{DomainEvent, EntityKind, EntityRef, EventPublisher, publish_all};
use coopledger_core::ledger::{PostingHeader, PostingLine, PostingService};
use coopledger_core::voucher::{StageFilter, VoucherError, VoucherKind};
use coopledger_shared::types::{Currency, Tenant, TransactionBatchId, UserId, round_currency};

use crate::entities::{cash_check_voucher_entries, cash_check_vouchers, journal_voucher_entries, journal_vouchers};
use crate::repositories::batch::TransactionBatchRepository;
use crate::repositories::posting::PostingRepository;
use crate::repositories::voucher_state::VoucherEntryInput;
use crate::unit_of_work::{PostingOptions, UnitOfWork, voucher_failure};

/// Connection, retry policy and collaborators of a voucher repository.
#[derive(Clone)]
pub(crate) struct VoucherStore {
    db: DatabaseConnection,
    pub(crate) options: PostingOptions,
    publisher: Arc<dyn EventPublisher>,
    batches: TransactionBatchRepository,
}

impl VoucherStore {
    pub(crate) fn new(
        db: DatabaseConnection,
        options: PostingOptions,
        publisher: Arc<dyn EventPublisher>,
        batches: TransactionBatchRepository,
    ) -> Self {
        Self {
            db,
            options,
            publisher,
            batches,
        }
    }

    pub(crate) const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub(crate) async fn begin(&self, voucher_id: Uuid) -> Result<UnitOfWork, VoucherError> {
        UnitOfWork::begin(&self.db, self.options.lock_timeout)
            .await
            .map_err(|e| voucher_failure(&e, voucher_id))
    }

    pub(crate) fn publish(&self, events: impl IntoIterator<Item = DomainEvent>) {
        publish_all(self.publisher.as_ref(), events);
    }

    /// Posts a released voucher into the releasing employee's open batch and
    /// re-balances that batch. Returns the batch id.
    ///
    /// The batch row stays locked until the caller's unit of work ends.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::NoOpenBatch` when the employee has no open
    /// batch, or the posting and re-balancing errors.
    pub(crate) async fn post_release(
        &self,
        txn: &DatabaseTransaction,
        tenant: Tenant,
        actor: UserId,
        now: DateTime<Utc>,
        lines: &[PostingLine],
        header: impl FnOnce(TransactionBatchId) -> Result<PostingHeader, VoucherError>,
        events: &mut Vec<DomainEvent>,
    ) -> Result<Uuid, VoucherError> {
        let batch = TransactionBatchRepository::current_open_within(txn, tenant, actor, true)
            .await?
            .ok_or(VoucherError::NoOpenBatch(actor.into_inner()))?;

        let header = header(TransactionBatchId::from(batch.id))?;
        let posted = PostingRepository::post_within(txn, tenant, &header, lines, now).await?;
        let batch = self.batches.rebalance_within(txn, tenant, batch, actor, now).await?;

        events.extend(posted.events(tenant, &header));
        events.push(DomainEvent::Updated(EntityRef::new(
            EntityKind::TransactionBatch,
            batch.id,
            tenant,
            Some(actor),
        )));
        Ok(batch.id)
    }
}

/// Rejects negative or double-sided entries. Balance is checked at print.
pub(crate) fn check_entries(entries: &[VoucherEntryInput]) -> Result<(), VoucherError> {
    let lines: Vec<PostingLine> = entries.iter().map(VoucherEntryInput::posting_line).collect();
    PostingService::check_lines(&lines)?;
    Ok(())
}

/// Rounded header totals of a set of entries.
pub(crate) fn totals(entries: &[VoucherEntryInput]) -> (Decimal, Decimal) {
    entries.iter().fold((Decimal::ZERO, Decimal::ZERO), |(debit, credit), entry| {
        (debit + round_currency(entry.debit), credit + round_currency(entry.credit))
    })
}

/// Parses the currency code stored on a voucher header.
///
/// # Errors
///
/// Returns `VoucherError::InvalidCurrency` for a code the ledger does not know.
pub(crate) fn stored_currency(voucher_id: Uuid, code: &str) -> Result<Currency, VoucherError> {
    code.parse().map_err(|_| VoucherError::InvalidCurrency {
        voucher_id,
        code: code.to_owned(),
    })
}

macro_rules! voucher_rows {
    ($table:ident, $kind:expr) => {
        impl $table::Entity {
            /// The live header of a voucher within the tenant.
            pub(crate) fn live(tenant: Tenant, id: Uuid) -> sea_orm::Select<Self> {
                Self::find_by_id(id)
                    .filter($table::Column::OrganizationId.eq(tenant.organization_id.into_inner()))
                    .filter($table::Column::BranchId.eq(tenant.branch_id.into_inner()))
                    .filter($table::Column::DeletedAt.is_null())
            }

            /// Loads a live header, row-locked when `for_update` is set.
            pub(crate) async fn fetch<C: ConnectionTrait>(
                conn: &C,
                tenant: Tenant,
                id: Uuid,
                for_update: bool,
            ) -> Result<$table::Model, VoucherError> {
                let mut query = Self::live(tenant, id);
                if for_update {
                    query = query.lock_exclusive();
                }
                query
                    .one(conn)
                    .await
                    .map_err(|e| voucher_failure(&e, id))?
                    .ok_or(VoucherError::NotFound { kind: $kind, id })
            }

            /// Live headers of one stage partition, oldest first.
            pub(crate) fn in_stage(tenant: Tenant, filter: StageFilter, now: DateTime<Utc>) -> sea_orm::Select<Self> {
                Self::find()
                    .filter($table::Column::OrganizationId.eq(tenant.organization_id.into_inner()))
                    .filter($table::Column::BranchId.eq(tenant.branch_id.into_inner()))
                    .filter($table::Column::DeletedAt.is_null())
                    .filter(Self::stage_condition(filter, now))
                    .order_by_asc($table::Column::CreatedAt)
            }
        }
    };
}

macro_rules! voucher_entry_rows {
    ($table:ident, $parent:ident, $parent_column:ident) => {
        impl $table::Entity {
            /// Live entries of a voucher in insertion order.
            pub(crate) async fn live_of<C: ConnectionTrait>(
                conn: &C,
                voucher_id: Uuid,
            ) -> Result<Vec<$table::Model>, VoucherError> {
                Self::find()
                    .filter($table::Column::$parent_column.eq(voucher_id))
                    .filter($table::Column::DeletedAt.is_null())
                    .order_by_asc($table::Column::CreatedAt)
                    .order_by_asc($table::Column::Id)
                    .all(conn)
                    .await
                    .map_err(|e| voucher_failure(&e, voucher_id))
            }

            /// Soft-deletes every live entry of a voucher.
            pub(crate) async fn retire_all(
                txn: &DatabaseTransaction,
                voucher_id: Uuid,
                actor: UserId,
                now: DateTimeWithTimeZone,
            ) -> Result<(), VoucherError> {
                Self::update_many()
                    .col_expr($table::Column::DeletedAt, Expr::value(now))
                    .col_expr($table::Column::DeletedBy, Expr::value(actor.into_inner()))
                    .filter($table::Column::$parent_column.eq(voucher_id))
                    .filter($table::Column::DeletedAt.is_null())
                    .exec(txn)
                    .await
                    .map_err(|e| voucher_failure(&e, voucher_id))?;
                Ok(())
            }

            /// Inserts entries under a voucher with rounded amounts.
            pub(crate) async fn insert_for(
                txn: &DatabaseTransaction,
                tenant: Tenant,
                voucher_id: Uuid,
                entries: &[VoucherEntryInput],
                actor: UserId,
                now: DateTimeWithTimeZone,
            ) -> Result<Vec<$table::Model>, VoucherError> {
                let mut inserted = Vec::with_capacity(entries.len());
                for entry in entries {
                    let model = $table::ActiveModel {
                        id: Set(Uuid::now_v7()),
                        organization_id: Set(tenant.organization_id.into_inner()),
                        branch_id: Set(tenant.branch_id.into_inner()),
                        $parent: Set(voucher_id),
                        account_id: Set(entry.account_id.into_inner()),
                        member_profile_id: Set(entry.member_profile_id.map(Into::into)),
                        employee_user_id: Set(entry.employee_user_id.map(Into::into)),
                        loan_transaction_id: Set(entry.loan_transaction_id.map(Into::into)),
                        debit: Set(round_currency(entry.debit)),
                        credit: Set(round_currency(entry.credit)),
                        description: Set(entry.description.clone()),
                        created_at: Set(now),
                        created_by: Set(Some(actor.into_inner())),
                        updated_at: Set(now),
                        updated_by: Set(Some(actor.into_inner())),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(|e| voucher_failure(&e, voucher_id))?;
                    inserted.push(model);
                }
                Ok(inserted)
            }
        }
    };
}

voucher_rows!(journal_vouchers, VoucherKind::Journal);
voucher_rows!(cash_check_vouchers, VoucherKind::CashCheck);
voucher_entry_rows!(journal_voucher_entries, journal_voucher_id, JournalVoucherId);
voucher_entry_rows!(cash_check_voucher_entries, cash_check_voucher_id, CashCheckVoucherId);

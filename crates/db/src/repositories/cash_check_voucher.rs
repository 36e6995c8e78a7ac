//! Cash check voucher persistence and lifecycle.
//!
//! The `status` column always mirrors the stage derived from the checkpoint
//! columns; both are written together under the voucher row lock.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing::info;
use uuid::Uuid;

use coopledger_core::events::{DomainEvent, EntityKind, EntityRef, EventPublisher};
use coopledger_core::ledger::{LedgerSource, PostingDocument, PostingHeader, PostingLine};
use coopledger_core::voucher::{
    Actor, CashCheckVoucherStatus as StageStatus, Signatories, Signatory, SignatoryRole, StageFilter, Transition,
    VoucherError, VoucherLifecycle, VoucherState,
};
use coopledger_shared::types::{CashCheckVoucherId, Currency, Tenant, TransactionBatchId, UserId};

use crate::entities::sea_orm_active_enums::CashCheckVoucherStatus;
use crate::entities::{cash_check_voucher_entries, cash_check_vouchers};
use crate::repositories::batch::TransactionBatchRepository;
use crate::repositories::voucher_state::VoucherEntryInput;
use crate::repositories::voucher_store::{VoucherStore, check_entries, stored_currency, totals};
use crate::unit_of_work::{PostingOptions, voucher_failure, with_retry};

/// Input for drafting a cash check voucher.
#[derive(Debug, Clone)]
pub struct NewCashCheckVoucher {
    /// Printed voucher number.
    pub voucher_number: Option<String>,
    /// Payee.
    pub pay_to: Option<String>,
    /// Check number, for check disbursements.
    pub check_number: Option<String>,
    /// Check date; also the transaction date of the posted book.
    pub check_date: Option<NaiveDate>,
    /// Description.
    pub description: Option<String>,
    /// Currency of every entry.
    pub currency: Currency,
}

/// A cash check voucher with its live entries.
#[derive(Debug, Clone)]
pub struct CashCheckVoucherWithEntries {
    /// Header.
    pub voucher: cash_check_vouchers::Model,
    /// Entries in insertion order.
    pub entries: Vec<cash_check_voucher_entries::Model>,
}

impl CashCheckVoucherWithEntries {
    /// Entries as posting lines.
    #[must_use]
    pub fn lines(&self) -> Vec<PostingLine> {
        self.entries.iter().map(cash_check_voucher_entries::Model::posting_line).collect()
    }

    /// Decoded signatory block.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored JSON is not a signatory map.
    pub fn signatories(&self) -> Result<Signatories, VoucherError> {
        decode_signatories(&self.voucher)
    }
}

/// Cash check voucher repository.
#[derive(Clone)]
pub struct CashCheckVoucherRepository {
    store: VoucherStore,
}

impl CashCheckVoucherRepository {
    /// Creates a new cash check voucher repository.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        options: PostingOptions,
        publisher: Arc<dyn EventPublisher>,
        batches: TransactionBatchRepository,
    ) -> Self {
        Self {
            store: VoucherStore::new(db, options, publisher, batches),
        }
    }

    /// Drafts a cash check voucher in `pending` status.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry is negative or double-sided.
    pub async fn create(
        &self,
        tenant: Tenant,
        input: NewCashCheckVoucher,
        entries: Vec<VoucherEntryInput>,
        actor: UserId,
    ) -> Result<CashCheckVoucherWithEntries, VoucherError> {
        check_entries(&entries)?;

        let id = Uuid::now_v7();
        let now: DateTimeWithTimeZone = Utc::now().into();
        let (total_debit, total_credit) = totals(&entries);

        let uow = self.store.begin(id).await?;
        let txn = uow.transaction();
        let voucher = cash_check_vouchers::ActiveModel {
            id: Set(id),
            organization_id: Set(tenant.organization_id.into_inner()),
            branch_id: Set(tenant.branch_id.into_inner()),
            voucher_number: Set(input.voucher_number),
            pay_to: Set(input.pay_to),
            check_number: Set(input.check_number),
            check_date: Set(input.check_date),
            description: Set(input.description),
            currency: Set(input.currency.code().to_owned()),
            status: Set(CashCheckVoucherStatus::Pending),
            print_count: Set(0),
            total_debit: Set(total_debit),
            total_credit: Set(total_credit),
            signatories: Set(serde_json::json!({})),
            created_at: Set(now),
            created_by: Set(Some(actor.into_inner())),
            updated_at: Set(now),
            updated_by: Set(Some(actor.into_inner())),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|e| voucher_failure(&e, id))?;
        let entries = cash_check_voucher_entries::Entity::insert_for(txn, tenant, id, &entries, actor, now).await?;
        uow.commit().await.map_err(|e| voucher_failure(&e, id))?;

        self.store.publish([DomainEvent::Created(entity(id, tenant, actor))]);
        Ok(CashCheckVoucherWithEntries { voucher, entries })
    }

    /// Fetches a voucher with its live entries.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::NotFound` if the voucher does not exist in the tenant.
    pub async fn get(
        &self,
        tenant: Tenant,
        id: CashCheckVoucherId,
    ) -> Result<CashCheckVoucherWithEntries, VoucherError> {
        let id = id.into_inner();
        let voucher = cash_check_vouchers::Entity::fetch(self.store.db(), tenant, id, false).await?;
        let entries = cash_check_voucher_entries::Entity::live_of(self.store.db(), id).await?;
        Ok(CashCheckVoucherWithEntries { voucher, entries })
    }

    /// Vouchers in one stage partition, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        tenant: Tenant,
        filter: StageFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<cash_check_vouchers::Model>, VoucherError> {
        cash_check_vouchers::Entity::in_stage(tenant, filter, now)
            .all(self.store.db())
            .await
            .map_err(|e| voucher_failure(&e, Uuid::nil()))
    }

    /// Replaces every entry of a pending voucher.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::EntriesFrozen` once the voucher has been printed.
    pub async fn replace_entries(
        &self,
        tenant: Tenant,
        id: CashCheckVoucherId,
        entries: Vec<VoucherEntryInput>,
        actor: UserId,
    ) -> Result<CashCheckVoucherWithEntries, VoucherError> {
        check_entries(&entries)?;

        let id = id.into_inner();
        let uow = self.store.begin(id).await?;
        let txn = uow.transaction();
        let voucher = cash_check_vouchers::Entity::fetch(txn, tenant, id, true).await?;
        VoucherLifecycle::ensure_entries_mutable(&voucher.state()?)?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        cash_check_voucher_entries::Entity::retire_all(txn, id, actor, now).await?;
        let inserted = cash_check_voucher_entries::Entity::insert_for(txn, tenant, id, &entries, actor, now).await?;

        let (total_debit, total_credit) = totals(&entries);
        let mut active: cash_check_vouchers::ActiveModel = voucher.into();
        active.total_debit = Set(total_debit);
        active.total_credit = Set(total_credit);
        active.updated_at = Set(now);
        active.updated_by = Set(Some(actor.into_inner()));
        let voucher = active.update(txn).await.map_err(|e| voucher_failure(&e, id))?;
        uow.commit().await.map_err(|e| voucher_failure(&e, id))?;

        self.store.publish([DomainEvent::Updated(entity(id, tenant, actor))]);
        Ok(CashCheckVoucherWithEntries {
            voucher,
            entries: inserted,
        })
    }

    /// Sets or clears one signatory of the printed voucher.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::NotFound` if the voucher does not exist.
    pub async fn assign_signatory(
        &self,
        tenant: Tenant,
        id: CashCheckVoucherId,
        role: SignatoryRole,
        signatory: Option<Signatory>,
        actor: UserId,
    ) -> Result<cash_check_vouchers::Model, VoucherError> {
        let id = id.into_inner();
        let uow = self.store.begin(id).await?;
        let txn = uow.transaction();
        let voucher = cash_check_vouchers::Entity::fetch(txn, tenant, id, true).await?;

        let mut signatories = decode_signatories(&voucher)?;
        match signatory {
            Some(signatory) => signatories.assign(role, signatory),
            None => {
                signatories.clear(role);
            }
        }

        let mut active: cash_check_vouchers::ActiveModel = voucher.into();
        active.signatories = Set(serde_json::to_value(&signatories).map_err(|e| VoucherError::Database {
            voucher_id: id,
            message: e.to_string(),
        })?);
        active.updated_at = Set(Utc::now().into());
        active.updated_by = Set(Some(actor.into_inner()));
        let voucher = active.update(txn).await.map_err(|e| voucher_failure(&e, id))?;
        uow.commit().await.map_err(|e| voucher_failure(&e, id))?;

        self.store.publish([DomainEvent::Updated(entity(id, tenant, actor))]);
        Ok(voucher)
    }

    /// Prints a pending voucher, or reprints a printed one.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::Unbalanced` if the first print finds the entries unbalanced.
    pub async fn print(
        &self,
        tenant: Tenant,
        id: CashCheckVoucherId,
        actor: &Actor,
    ) -> Result<CashCheckVoucherWithEntries, VoucherError> {
        self.apply(tenant, id, actor.user_id, "print_cash_check_voucher", |state, count, lines, now| {
            VoucherLifecycle::print(state, count, lines, actor, now)
        })
        .await
    }

    /// Approves a printed voucher.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::InvalidTransition` unless the voucher is printed.
    pub async fn approve(
        &self,
        tenant: Tenant,
        id: CashCheckVoucherId,
        actor: &Actor,
    ) -> Result<CashCheckVoucherWithEntries, VoucherError> {
        self.apply(tenant, id, actor.user_id, "approve_cash_check_voucher", |state, count, _, now| {
            VoucherLifecycle::approve(state, count, actor, now)
        })
        .await
    }

    /// Releases an approved voucher and posts its entries as a check voucher.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::NoOpenBatch` if the releasing employee has no
    /// open batch, `VoucherError::InvalidTransition` unless the voucher is
    /// approved, or the posting error.
    #[tracing::instrument(skip(self, actor), fields(voucher_id = %id, user_id = %actor.user_id))]
    pub async fn release(
        &self,
        tenant: Tenant,
        id: CashCheckVoucherId,
        actor: &Actor,
    ) -> Result<CashCheckVoucherWithEntries, VoucherError> {
        self.apply(tenant, id, actor.user_id, "release_cash_check_voucher", |state, count, _, now| {
            VoucherLifecycle::release(state, count, actor, now)
        })
        .await
    }

    /// Takes a printed voucher back to pending.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::InvalidTransition` unless the voucher is printed.
    pub async fn undo_print(
        &self,
        tenant: Tenant,
        id: CashCheckVoucherId,
        actor: UserId,
    ) -> Result<CashCheckVoucherWithEntries, VoucherError> {
        self.apply(tenant, id, actor, "undo_print_cash_check_voucher", |state, _, _, _| {
            VoucherLifecycle::undo_print(state)
        })
        .await
    }

    /// Takes an approved voucher back to printed.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::InvalidTransition` unless the voucher is approved.
    pub async fn undo_approve(
        &self,
        tenant: Tenant,
        id: CashCheckVoucherId,
        actor: UserId,
    ) -> Result<CashCheckVoucherWithEntries, VoucherError> {
        self.apply(tenant, id, actor, "undo_approve_cash_check_voucher", |state, count, _, _| {
            VoucherLifecycle::undo_approve(state, count)
        })
        .await
    }

    async fn apply(
        &self,
        tenant: Tenant,
        id: CashCheckVoucherId,
        actor: UserId,
        operation: &'static str,
        step: impl Fn(VoucherState, i32, &[PostingLine], DateTime<Utc>) -> Result<Transition, VoucherError>,
    ) -> Result<CashCheckVoucherWithEntries, VoucherError> {
        let id = id.into_inner();
        let step = &step;
        let (result, events) = with_retry(&self.store.options, operation, |_| async move {
            let uow = self.store.begin(id).await?;
            let txn = uow.transaction();
            let voucher = cash_check_vouchers::Entity::fetch(txn, tenant, id, true).await?;
            let entries = cash_check_voucher_entries::Entity::live_of(txn, id).await?;
            let lines: Vec<PostingLine> =
                entries.iter().map(cash_check_voucher_entries::Model::posting_line).collect();

            let now = Utc::now();
            let from = voucher.state()?.stage();
            let transition = step(voucher.state()?, voucher.print_count, &lines, now)?;
            let to = transition.state.stage();
            let mut events = vec![DomainEvent::Updated(entity(id, tenant, actor))];

            let mut active: cash_check_vouchers::ActiveModel = voucher.clone().into();
            if transition.posts_to_ledger {
                let header = |batch| release_header(&voucher, actor, batch, now);
                let batch_id = self
                    .store
                    .post_release(txn, tenant, actor, now, &lines, header, &mut events)
                    .await?;
                active.transaction_batch_id = Set(Some(batch_id));
            }
            active.set_state(transition.state);
            active.status = Set(StageStatus::from(to).into());
            active.print_count = Set(transition.print_count);
            active.updated_at = Set(now.into());
            active.updated_by = Set(Some(actor.into_inner()));
            let voucher = active.update(txn).await.map_err(|e| voucher_failure(&e, id))?;
            uow.commit().await.map_err(|e| voucher_failure(&e, id))?;

            info!(voucher_id = %id, from = %from, to = %to, print_count = voucher.print_count, "Cash check voucher {operation}");
            Ok::<_, VoucherError>((CashCheckVoucherWithEntries { voucher, entries }, events))
        })
        .await?;

        self.store.publish(events);
        Ok(result)
    }
}

/// Header of the check voucher posting made at release.
fn release_header(
    voucher: &cash_check_vouchers::Model,
    actor: UserId,
    batch: TransactionBatchId,
    now: DateTime<Utc>,
) -> Result<PostingHeader, VoucherError> {
    let transaction_date = voucher.check_date.unwrap_or_else(|| now.date_naive());
    let mut header = PostingHeader::new(LedgerSource::CheckVoucher, transaction_date, actor).in_batch(batch);
    header.jv_number.clone_from(&voucher.voucher_number);
    header.description = voucher.description.clone().or_else(|| voucher.pay_to.clone());
    header.currency = stored_currency(voucher.id, &voucher.currency)?;
    header.document = Some(PostingDocument::CashCheckVoucher(CashCheckVoucherId::from(voucher.id)));
    Ok(header)
}

fn decode_signatories(voucher: &cash_check_vouchers::Model) -> Result<Signatories, VoucherError> {
    serde_json::from_value(voucher.signatories.clone()).map_err(|e| VoucherError::Database {
        voucher_id: voucher.id,
        message: e.to_string(),
    })
}

fn entity(id: Uuid, tenant: Tenant, actor: UserId) -> EntityRef {
    EntityRef::new(EntityKind::CashCheckVoucher, id, tenant, Some(actor))
}

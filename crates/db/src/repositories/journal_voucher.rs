//! Journal voucher persistence and lifecycle.
//!
//! Every lifecycle action locks the voucher row, rebuilds its state from the
//! checkpoint columns, applies the pure transition and writes the result back
//! in one unit of work. Release additionally posts the entries to the general
//! ledger under the releasing employee's open batch.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, Set};
use tracing::info;
use uuid::Uuid;

use coopledger_core::events::{DomainEvent, EntityKind, EntityRef, EventPublisher};
use coopledger_core::ledger::{LedgerSource, PostingDocument, PostingHeader, PostingLine};
use coopledger_core::voucher::{Actor, StageFilter, Transition, VoucherError, VoucherLifecycle, VoucherState};
use coopledger_shared::types::{Currency, JournalVoucherId, Tenant, TransactionBatchId, UserId};

use crate::entities::sea_orm_active_enums::JournalVoucherStatus;
use crate::entities::{journal_voucher_entries, journal_vouchers};
use crate::repositories::batch::TransactionBatchRepository;
use crate::repositories::voucher_state::VoucherEntryInput;
use crate::repositories::voucher_store::{VoucherStore, check_entries, stored_currency, totals};
use crate::unit_of_work::{PostingOptions, voucher_failure, with_retry};

/// Input for drafting a journal voucher.
#[derive(Debug, Clone)]
pub struct NewJournalVoucher {
    /// Printed voucher number; also the JV number of the posted book.
    pub voucher_number: Option<String>,
    /// Accounting date.
    pub voucher_date: NaiveDate,
    /// Description.
    pub description: Option<String>,
    /// External reference.
    pub reference: Option<String>,
    /// Currency of every entry.
    pub currency: Currency,
}

/// A journal voucher with its live entries.
#[derive(Debug, Clone)]
pub struct JournalVoucherWithEntries {
    /// Header.
    pub voucher: journal_vouchers::Model,
    /// Entries in insertion order.
    pub entries: Vec<journal_voucher_entries::Model>,
}

impl JournalVoucherWithEntries {
    /// Lifecycle state of the header.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored checkpoints are inconsistent.
    pub fn state(&self) -> Result<VoucherState, VoucherError> {
        self.voucher.state()
    }

    /// Entries as posting lines.
    #[must_use]
    pub fn lines(&self) -> Vec<PostingLine> {
        self.entries.iter().map(journal_voucher_entries::Model::posting_line).collect()
    }
}

/// Journal voucher repository.
#[derive(Clone)]
pub struct JournalVoucherRepository {
    store: VoucherStore,
}

impl JournalVoucherRepository {
    /// Creates a new journal voucher repository.
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

    /// Drafts a journal voucher with its entries.
    ///
    /// Entries may be unbalanced while drafting; the balance law is checked at print.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry is negative or double-sided.
    pub async fn create(
        &self,
        tenant: Tenant,
        input: NewJournalVoucher,
        entries: Vec<VoucherEntryInput>,
        actor: UserId,
    ) -> Result<JournalVoucherWithEntries, VoucherError> {
        check_entries(&entries)?;

        let id = Uuid::now_v7();
        let now: DateTimeWithTimeZone = Utc::now().into();
        let (total_debit, total_credit) = totals(&entries);

        let uow = self.store.begin(id).await?;
        let txn = uow.transaction();
        let voucher = journal_vouchers::ActiveModel {
            id: Set(id),
            organization_id: Set(tenant.organization_id.into_inner()),
            branch_id: Set(tenant.branch_id.into_inner()),
            voucher_number: Set(input.voucher_number),
            voucher_date: Set(input.voucher_date),
            description: Set(input.description),
            reference: Set(input.reference),
            currency: Set(input.currency.code().to_owned()),
            status: Set(JournalVoucherStatus::Draft),
            print_count: Set(0),
            total_debit: Set(total_debit),
            total_credit: Set(total_credit),
            created_at: Set(now),
            created_by: Set(Some(actor.into_inner())),
            updated_at: Set(now),
            updated_by: Set(Some(actor.into_inner())),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|e| voucher_failure(&e, id))?;
        let entries = journal_voucher_entries::Entity::insert_for(txn, tenant, id, &entries, actor, now).await?;
        uow.commit().await.map_err(|e| voucher_failure(&e, id))?;

        self.store.publish([DomainEvent::Created(entity(id, tenant, actor))]);
        Ok(JournalVoucherWithEntries { voucher, entries })
    }

    /// Fetches a voucher with its live entries.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::NotFound` if the voucher does not exist in the tenant.
    pub async fn get(&self, tenant: Tenant, id: JournalVoucherId) -> Result<JournalVoucherWithEntries, VoucherError> {
        let id = id.into_inner();
        let voucher = journal_vouchers::Entity::fetch(self.store.db(), tenant, id, false).await?;
        let entries = journal_voucher_entries::Entity::live_of(self.store.db(), id).await?;
        Ok(JournalVoucherWithEntries { voucher, entries })
    }

    /// Vouchers in one stage partition, oldest first. Cancelled vouchers are excluded.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        tenant: Tenant,
        filter: StageFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<journal_vouchers::Model>, VoucherError> {
        journal_vouchers::Entity::in_stage(tenant, filter, now)
            .filter(journal_vouchers::Column::Status.ne(JournalVoucherStatus::Cancelled))
            .all(self.store.db())
            .await
            .map_err(|e| voucher_failure(&e, Uuid::nil()))
    }

    /// Replaces every entry of a draft voucher.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::EntriesFrozen` once the voucher has been printed.
    pub async fn replace_entries(
        &self,
        tenant: Tenant,
        id: JournalVoucherId,
        entries: Vec<VoucherEntryInput>,
        actor: UserId,
    ) -> Result<JournalVoucherWithEntries, VoucherError> {
        check_entries(&entries)?;

        let id = id.into_inner();
        let uow = self.store.begin(id).await?;
        let txn = uow.transaction();
        let voucher = journal_vouchers::Entity::fetch(txn, tenant, id, true).await?;
        ensure_not_cancelled(&voucher)?;
        VoucherLifecycle::ensure_entries_mutable(&voucher.state()?)?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        journal_voucher_entries::Entity::retire_all(txn, id, actor, now).await?;
        let inserted = journal_voucher_entries::Entity::insert_for(txn, tenant, id, &entries, actor, now).await?;

        let (total_debit, total_credit) = totals(&entries);
        let mut active: journal_vouchers::ActiveModel = voucher.into();
        active.total_debit = Set(total_debit);
        active.total_credit = Set(total_credit);
        active.updated_at = Set(now);
        active.updated_by = Set(Some(actor.into_inner()));
        let voucher = active.update(txn).await.map_err(|e| voucher_failure(&e, id))?;
        uow.commit().await.map_err(|e| voucher_failure(&e, id))?;

        self.store.publish([DomainEvent::Updated(entity(id, tenant, actor))]);
        Ok(JournalVoucherWithEntries {
            voucher,
            entries: inserted,
        })
    }

    /// Prints a draft voucher, or reprints a printed one.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::Unbalanced` if the first print finds the entries unbalanced.
    pub async fn print(
        &self,
        tenant: Tenant,
        id: JournalVoucherId,
        actor: &Actor,
    ) -> Result<JournalVoucherWithEntries, VoucherError> {
        self.apply(tenant, id, actor.user_id, "print_journal_voucher", |state, count, lines, now| {
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
        id: JournalVoucherId,
        actor: &Actor,
    ) -> Result<JournalVoucherWithEntries, VoucherError> {
        self.apply(tenant, id, actor.user_id, "approve_journal_voucher", |state, count, _, now| {
            VoucherLifecycle::approve(state, count, actor, now)
        })
        .await
    }

    /// Releases an approved voucher and posts its entries.
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
        id: JournalVoucherId,
        actor: &Actor,
    ) -> Result<JournalVoucherWithEntries, VoucherError> {
        self.apply(tenant, id, actor.user_id, "release_journal_voucher", |state, count, _, now| {
            VoucherLifecycle::release(state, count, actor, now)
        })
        .await
    }

    /// Takes a printed voucher back to draft.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::InvalidTransition` unless the voucher is printed.
    pub async fn undo_print(
        &self,
        tenant: Tenant,
        id: JournalVoucherId,
        actor: UserId,
    ) -> Result<JournalVoucherWithEntries, VoucherError> {
        self.apply(tenant, id, actor, "undo_print_journal_voucher", |state, _, _, _| {
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
        id: JournalVoucherId,
        actor: UserId,
    ) -> Result<JournalVoucherWithEntries, VoucherError> {
        self.apply(tenant, id, actor, "undo_approve_journal_voucher", |state, count, _, _| {
            VoucherLifecycle::undo_approve(state, count)
        })
        .await
    }

    /// Cancels a draft voucher. Cancelling twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::EntriesFrozen` once the voucher has been printed.
    pub async fn cancel(
        &self,
        tenant: Tenant,
        id: JournalVoucherId,
        actor: UserId,
    ) -> Result<journal_vouchers::Model, VoucherError> {
        let id = id.into_inner();
        let uow = self.store.begin(id).await?;
        let txn = uow.transaction();
        let voucher = journal_vouchers::Entity::fetch(txn, tenant, id, true).await?;
        if voucher.status == JournalVoucherStatus::Cancelled {
            return Ok(voucher);
        }
        VoucherLifecycle::ensure_entries_mutable(&voucher.state()?)?;

        let mut active: journal_vouchers::ActiveModel = voucher.into();
        active.status = Set(JournalVoucherStatus::Cancelled);
        active.updated_at = Set(Utc::now().into());
        active.updated_by = Set(Some(actor.into_inner()));
        let voucher = active.update(txn).await.map_err(|e| voucher_failure(&e, id))?;
        uow.commit().await.map_err(|e| voucher_failure(&e, id))?;

        self.store.publish([DomainEvent::Updated(entity(id, tenant, actor))]);
        Ok(voucher)
    }

    /// Runs one lifecycle step under the voucher row lock.
    async fn apply(
        &self,
        tenant: Tenant,
        id: JournalVoucherId,
        actor: UserId,
        operation: &'static str,
        step: impl Fn(VoucherState, i32, &[PostingLine], DateTime<Utc>) -> Result<Transition, VoucherError>,
    ) -> Result<JournalVoucherWithEntries, VoucherError> {
        let id = id.into_inner();
        let step = &step;
        let (result, events) = with_retry(&self.store.options, operation, |_| async move {
            let uow = self.store.begin(id).await?;
            let txn = uow.transaction();
            let voucher = journal_vouchers::Entity::fetch(txn, tenant, id, true).await?;
            ensure_not_cancelled(&voucher)?;
            let entries = journal_voucher_entries::Entity::live_of(txn, id).await?;
            let lines: Vec<PostingLine> = entries.iter().map(journal_voucher_entries::Model::posting_line).collect();

            let now = Utc::now();
            let from = voucher.state()?.stage();
            let transition = step(voucher.state()?, voucher.print_count, &lines, now)?;
            let mut events = vec![DomainEvent::Updated(entity(id, tenant, actor))];

            let mut active: journal_vouchers::ActiveModel = voucher.clone().into();
            if transition.posts_to_ledger {
                let header = |batch| release_header(&voucher, actor, batch);
                let batch_id = self
                    .store
                    .post_release(txn, tenant, actor, now, &lines, header, &mut events)
                    .await?;
                active.status = Set(JournalVoucherStatus::Posted);
                active.transaction_batch_id = Set(Some(batch_id));
            }
            let to = transition.state.stage();
            active.set_state(transition.state);
            active.print_count = Set(transition.print_count);
            active.updated_at = Set(now.into());
            active.updated_by = Set(Some(actor.into_inner()));
            let voucher = active.update(txn).await.map_err(|e| voucher_failure(&e, id))?;
            uow.commit().await.map_err(|e| voucher_failure(&e, id))?;

            info!(voucher_id = %id, from = %from, to = %to, print_count = voucher.print_count, "Journal voucher {operation}");
            Ok::<_, VoucherError>((JournalVoucherWithEntries { voucher, entries }, events))
        })
        .await?;

        self.store.publish(events);
        Ok(result)
    }
}

/// Header of the general journal posting made at release.
fn release_header(
    voucher: &journal_vouchers::Model,
    actor: UserId,
    batch: TransactionBatchId,
) -> Result<PostingHeader, VoucherError> {
    let mut header = PostingHeader::new(LedgerSource::JournalVoucher, voucher.voucher_date, actor).in_batch(batch);
    header.jv_number.clone_from(&voucher.voucher_number);
    header.description.clone_from(&voucher.description);
    header.currency = stored_currency(voucher.id, &voucher.currency)?;
    header.document = Some(PostingDocument::JournalVoucher(JournalVoucherId::from(voucher.id)));
    Ok(header)
}

fn ensure_not_cancelled(voucher: &journal_vouchers::Model) -> Result<(), VoucherError> {
    if voucher.status == JournalVoucherStatus::Cancelled {
        Err(VoucherError::Cancelled(voucher.id))
    } else {
        Ok(())
    }
}

fn entity(id: Uuid, tenant: Tenant, actor: UserId) -> EntityRef {
    EntityRef::new(EntityKind::JournalVoucher, id, tenant, Some(actor))
}

//! Transaction Batch Aggregator.
//!
//! A batch is one employee's working session. Opening is guarded by the
//! partial unique index on open batches; every side input and every voucher
//! release re-balances the batch under its row lock; closing recomputes the
//! figures from the ledger and is one-way.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info};
use uuid::Uuid;

use coopledger_core::batch::{
    BatchAggregator, BatchError, BatchInputs, BatchSignOff, BatchTotals, BatchView, CashCount, ViewGate,
    non_negative, source_turnover,
};
use coopledger_core::events::{DomainEvent, EntityKind, EntityRef, EventPublisher, publish_all};
use coopledger_core::ledger::{LedgerError, LedgerSource};
use coopledger_core::voucher::{Signatories, Signatory, SignatoryRole, utc_day_window};
use coopledger_shared::types::{Currency, Tenant, TransactionBatchId, UserId, round_currency};

use crate::entities::sea_orm_active_enums::RemittanceKind;
use crate::entities::{batch_fundings, batch_remittances, cash_counts, disbursement_transactions, transaction_batches};
use crate::repositories::ledger::LedgerRepository;
use crate::unit_of_work::{
    DbFailure, OPEN_BATCH_INDEX, PostingOptions, UnitOfWork, batch_failure, classify, with_retry,
};

/// Input for opening a batch.
#[derive(Debug, Clone)]
pub struct OpenBatchInput {
    /// Employee the batch belongs to.
    pub employee_user_id: UserId,
    /// Short label.
    pub batch_name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Currency the batch is counted in.
    pub currency: Currency,
}

/// Input for adding a funding to a batch.
#[derive(Debug, Clone)]
pub struct FundingInput {
    /// Who handed over the cash.
    pub provided_by_user_id: Option<UserId>,
    /// Label.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Amount funded.
    pub amount: Decimal,
}

/// Input for adding a check or online remittance.
#[derive(Debug, Clone)]
pub struct RemittanceInput {
    /// Check or online.
    pub kind: RemittanceKind,
    /// Check number or transfer reference.
    pub reference_number: Option<String>,
    /// Amount remitted.
    pub amount: Decimal,
}

/// Transaction batch repository.
#[derive(Clone)]
pub struct TransactionBatchRepository {
    db: DatabaseConnection,
    options: PostingOptions,
    publisher: Arc<dyn EventPublisher>,
    tolerance: Decimal,
}

impl TransactionBatchRepository {
    /// Creates a new batch repository; `tolerance` bounds a balanced comparison.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        options: PostingOptions,
        publisher: Arc<dyn EventPublisher>,
        tolerance: Decimal,
    ) -> Self {
        Self {
            db,
            options,
            publisher,
            tolerance,
        }
    }

    /// Opens a batch for an employee.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::AlreadyOpen` if the employee already has an open
    /// batch in this branch.
    #[tracing::instrument(skip(self, input), fields(employee_user_id = %input.employee_user_id))]
    pub async fn open(
        &self,
        tenant: Tenant,
        input: OpenBatchInput,
        actor: UserId,
    ) -> Result<transaction_batches::Model, BatchError> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let employee = input.employee_user_id.into_inner();
        let batch = transaction_batches::ActiveModel {
            id: Set(Uuid::now_v7()),
            organization_id: Set(tenant.organization_id.into_inner()),
            branch_id: Set(tenant.branch_id.into_inner()),
            employee_user_id: Set(employee),
            batch_name: Set(input.batch_name),
            currency: Set(input.currency.code().to_owned()),
            description: Set(input.description),
            created_at: Set(now),
            created_by: Set(Some(actor.into_inner())),
            updated_at: Set(now),
            updated_by: Set(Some(actor.into_inner())),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| match classify(&e) {
            DbFailure::UniqueViolation(Some(constraint)) if constraint == OPEN_BATCH_INDEX => BatchError::AlreadyOpen {
                employee_user_id: employee,
            },
            _ => BatchError::database(None, e),
        })?;

        info!(batch_id = %batch.id, "Transaction batch opened");
        self.publish(tenant, actor, DomainEvent::Created, batch.id);
        Ok(batch)
    }

    /// The employee's open batch, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn current(
        &self,
        tenant: Tenant,
        employee_user_id: UserId,
    ) -> Result<Option<transaction_batches::Model>, BatchError> {
        Self::current_open_within(&self.db, tenant, employee_user_id, false).await
    }

    /// The employee's open batch, optionally locked for update.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the lock wait times out.
    pub async fn current_open_within<C: ConnectionTrait>(
        conn: &C,
        tenant: Tenant,
        employee_user_id: UserId,
        for_update: bool,
    ) -> Result<Option<transaction_batches::Model>, BatchError> {
        let mut query = transaction_batches::Entity::find()
            .filter(batch_condition(tenant))
            .filter(transaction_batches::Column::EmployeeUserId.eq(employee_user_id.into_inner()))
            .filter(transaction_batches::Column::IsClosed.eq(false))
            .order_by_desc(transaction_batches::Column::UpdatedAt);
        if for_update {
            query = query.lock_exclusive();
        }
        query.one(conn).await.map_err(|e| match classify(&e) {
            DbFailure::LockTimeout => LedgerError::LockTimeout {
                scope: format!("open batch of employee {employee_user_id}"),
            }
            .into(),
            _ => BatchError::database(None, e),
        })
    }

    /// The employee's open batch, or `BatchError::NoOpenBatch`.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no open batch or the query fails.
    pub async fn ensure_open(
        &self,
        tenant: Tenant,
        employee_user_id: UserId,
    ) -> Result<transaction_batches::Model, BatchError> {
        self.current(tenant, employee_user_id)
            .await?
            .ok_or(BatchError::NoOpenBatch(employee_user_id.into_inner()))
    }

    /// Fetches a batch.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::NotFound` if the batch does not exist in the tenant.
    pub async fn get(
        &self,
        tenant: Tenant,
        batch_id: TransactionBatchId,
    ) -> Result<transaction_batches::Model, BatchError> {
        let id = batch_id.into_inner();
        transaction_batches::Entity::find_by_id(id)
            .filter(batch_condition(tenant))
            .one(&self.db)
            .await
            .map_err(|e| batch_failure(&e, id))?
            .ok_or(BatchError::NotFound(id))
    }

    /// Adds a funding (beginning balance) to an open batch.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::NegativeAmount` for a negative amount and
    /// `BatchError::BatchClosed` if the batch is closed.
    pub async fn add_funding(
        &self,
        tenant: Tenant,
        batch_id: TransactionBatchId,
        input: FundingInput,
        actor: UserId,
    ) -> Result<transaction_batches::Model, BatchError> {
        non_negative("funding", input.amount)?;
        self.mutate_open(tenant, batch_id, actor, "add_funding", &SideInput::Funding(input))
            .await
    }

    /// Records one bill denomination of the drawer count.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::NegativeQuantity` for a negative quantity,
    /// `BatchError::NegativeAmount` for a negative bill amount and
    /// `BatchError::BatchClosed` if the batch is closed.
    pub async fn add_cash_count(
        &self,
        tenant: Tenant,
        batch_id: TransactionBatchId,
        count: CashCount,
        actor: UserId,
    ) -> Result<transaction_batches::Model, BatchError> {
        count.total()?;
        self.mutate_open(tenant, batch_id, actor, "add_cash_count", &SideInput::CashCount(count))
            .await
    }

    /// Records a check or online remittance.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::NegativeAmount` for a negative amount and
    /// `BatchError::BatchClosed` if the batch is closed.
    pub async fn add_remittance(
        &self,
        tenant: Tenant,
        batch_id: TransactionBatchId,
        input: RemittanceInput,
        actor: UserId,
    ) -> Result<transaction_batches::Model, BatchError> {
        non_negative("remittance", input.amount)?;
        self.mutate_open(tenant, batch_id, actor, "add_remittance", &SideInput::Remittance(input))
            .await
    }

    /// Records a petty cash disbursement.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::NegativeAmount` for a negative amount and
    /// `BatchError::BatchClosed` if the batch is closed.
    pub async fn add_disbursement(
        &self,
        tenant: Tenant,
        batch_id: TransactionBatchId,
        description: Option<String>,
        amount: Decimal,
        actor: UserId,
    ) -> Result<transaction_batches::Model, BatchError> {
        let amount = non_negative("disbursement", amount)?;
        let input = SideInput::Disbursement { description, amount };
        self.mutate_open(tenant, batch_id, actor, "add_disbursement", &input).await
    }

    /// Sets the deposit in bank of an open batch.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::NegativeDeposit` for a negative amount and
    /// `BatchError::BatchClosed` if the batch is closed.
    pub async fn record_deposit_in_bank(
        &self,
        tenant: Tenant,
        batch_id: TransactionBatchId,
        amount: Decimal,
        actor: UserId,
    ) -> Result<transaction_batches::Model, BatchError> {
        if amount < Decimal::ZERO {
            return Err(BatchError::NegativeDeposit);
        }
        let input = SideInput::DepositInBank(round_currency(amount));
        self.mutate_open(tenant, batch_id, actor, "record_deposit_in_bank", &input)
            .await
    }

    /// Recomputes and stores the figures of an open batch.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::BatchClosed` if the batch is closed.
    pub async fn rebalance(
        &self,
        tenant: Tenant,
        batch_id: TransactionBatchId,
        actor: UserId,
    ) -> Result<transaction_batches::Model, BatchError> {
        self.mutate_open(tenant, batch_id, actor, "rebalance", &SideInput::Nothing)
            .await
    }

    /// Recomputes a locked batch inside the caller's transaction and stores the figures.
    ///
    /// # Errors
    ///
    /// Returns an error if cash-on-hand is not configured or a write fails.
    pub async fn rebalance_within(
        &self,
        txn: &DatabaseTransaction,
        tenant: Tenant,
        batch: transaction_batches::Model,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<transaction_batches::Model, BatchError> {
        let totals = self.totals_within(txn, tenant, &batch).await?;
        let batch_id = batch.id;

        let mut active: transaction_batches::ActiveModel = batch.into();
        apply_totals(&mut active, &totals);
        active.updated_at = Set(now.into());
        active.updated_by = Set(Some(actor.into_inner()));
        let batch = active.update(txn).await.map_err(|e| batch_failure(&e, batch_id))?;

        debug!(
            batch_id = %batch_id,
            comparison = %totals.batch.total_actual_supposed_comparison,
            status = %totals.batch.balance_status,
            "Batch rebalanced"
        );
        Ok(batch)
    }

    /// Figures of a batch as the ledger currently supports them, without writing.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::NotFound` if the batch does not exist.
    pub async fn recompute(&self, tenant: Tenant, batch_id: TransactionBatchId) -> Result<BatchTotals, BatchError> {
        let batch = self.get(tenant, batch_id).await?;
        Ok(self.totals_within(&self.db, tenant, &batch).await?.batch)
    }

    /// Closes a batch: recomputes every figure from the ledger, stamps the
    /// employee sign-off and `ended_at`.
    ///
    /// Postings into the batch hold a shared lock on its row, so closing
    /// waits for them and later postings see the batch closed.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::BatchClosed` if the batch is already closed.
    #[tracing::instrument(skip(self, sign_off), fields(batch_id = %batch_id))]
    pub async fn close(
        &self,
        tenant: Tenant,
        batch_id: TransactionBatchId,
        sign_off: BatchSignOff,
        actor: UserId,
    ) -> Result<transaction_batches::Model, BatchError> {
        let id = batch_id.into_inner();
        let sign_off = &sign_off;
        let batch = with_retry(&self.options, "close_batch", |_| async move {
            let uow = self.begin(id).await?;
            let txn = uow.transaction();
            let batch = Self::lock(txn, tenant, id).await?;
            if batch.is_closed {
                return Err(BatchError::BatchClosed(id));
            }

            let now = Utc::now();
            let totals = self.totals_within(txn, tenant, &batch).await?;
            let mut active: transaction_batches::ActiveModel = batch.into();
            apply_totals(&mut active, &totals);
            active.is_closed = Set(true);
            active.ended_at = Set(Some(now.into()));
            active.employee_by_name = Set(Some(sign_off.name.clone()));
            active.employee_by_position = Set(Some(sign_off.position.clone()));
            active.employee_by_signature_media_id = Set(sign_off.signature_media_id);
            active.updated_at = Set(now.into());
            active.updated_by = Set(Some(actor.into_inner()));
            let batch = active.update(txn).await.map_err(|e| batch_failure(&e, id))?;

            uow.commit().await.map_err(|e| batch_failure(&e, id))?;
            Ok(batch)
        })
        .await?;

        if let Some(status) = batch.balance_status {
            info!(status = ?status, comparison = %batch.total_actual_supposed_comparison, "Transaction batch closed");
        }
        self.publish(tenant, actor, DomainEvent::Updated, batch.id);
        Ok(batch)
    }

    /// Employee asks for supervisor review of a closed batch.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::StillOpen` if the batch is not closed yet.
    pub async fn request_view(
        &self,
        tenant: Tenant,
        batch_id: TransactionBatchId,
        actor: UserId,
    ) -> Result<transaction_batches::Model, BatchError> {
        self.set_view(tenant, batch_id, actor, |id, gate, is_closed| {
            if is_closed {
                Ok(BatchView::request(gate))
            } else {
                Err(BatchError::StillOpen(id))
            }
        })
        .await
    }

    /// Supervisor grants visibility of a requested batch.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::ViewNotRequested` if no view was requested.
    pub async fn grant_view(
        &self,
        tenant: Tenant,
        batch_id: TransactionBatchId,
        actor: UserId,
    ) -> Result<transaction_batches::Model, BatchError> {
        self.set_view(tenant, batch_id, actor, |id, gate, _| BatchView::grant(id, gate))
            .await
    }

    /// Batches waiting for a supervisor to grant a view.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn pending_view(&self, tenant: Tenant) -> Result<Vec<transaction_batches::Model>, BatchError> {
        transaction_batches::Entity::find()
            .filter(batch_condition(tenant))
            .filter(transaction_batches::Column::RequestView.eq(true))
            .filter(transaction_batches::Column::CanView.eq(false))
            .order_by_asc(transaction_batches::Column::UpdatedAt)
            .all(&self.db)
            .await
            .map_err(|e| BatchError::database(None, e))
    }

    /// Batches closed within the UTC day of `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn closed_today(
        &self,
        tenant: Tenant,
        now: DateTime<Utc>,
    ) -> Result<Vec<transaction_batches::Model>, BatchError> {
        let (start, end) = utc_day_window(now);
        transaction_batches::Entity::find()
            .filter(batch_condition(tenant))
            .filter(transaction_batches::Column::IsClosed.eq(true))
            .filter(transaction_batches::Column::EndedAt.gte(start))
            .filter(transaction_batches::Column::EndedAt.lt(end))
            .order_by_asc(transaction_batches::Column::EndedAt)
            .all(&self.db)
            .await
            .map_err(|e| BatchError::database(None, e))
    }

    /// Fills or clears one signatory slot of a batch report.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::NotFound` if the batch does not exist.
    pub async fn assign_signatory(
        &self,
        tenant: Tenant,
        batch_id: TransactionBatchId,
        role: SignatoryRole,
        signatory: Option<Signatory>,
        actor: UserId,
    ) -> Result<transaction_batches::Model, BatchError> {
        let id = batch_id.into_inner();
        let uow = self.begin(id).await?;
        let txn = uow.transaction();
        let batch = Self::lock(txn, tenant, id).await?;

        let mut signatories: Signatories =
            serde_json::from_value(batch.signatories.clone()).map_err(|e| BatchError::database(Some(id), e))?;
        match signatory {
            Some(signatory) => signatories.assign(role, signatory),
            None => {
                signatories.clear(role);
            }
        }

        let mut active: transaction_batches::ActiveModel = batch.into();
        active.signatories = Set(serde_json::to_value(&signatories).map_err(|e| BatchError::database(Some(id), e))?);
        active.updated_at = Set(Utc::now().into());
        active.updated_by = Set(Some(actor.into_inner()));
        let batch = active.update(txn).await.map_err(|e| batch_failure(&e, id))?;
        uow.commit().await.map_err(|e| batch_failure(&e, id))?;

        self.publish(tenant, actor, DomainEvent::Updated, batch.id);
        Ok(batch)
    }

    /// Locks an open batch, writes one side input, re-balances and commits.
    async fn mutate_open(
        &self,
        tenant: Tenant,
        batch_id: TransactionBatchId,
        actor: UserId,
        operation: &'static str,
        input: &SideInput,
    ) -> Result<transaction_batches::Model, BatchError> {
        let id = batch_id.into_inner();
        let batch = with_retry(&self.options, operation, |_| async move {
            let uow = self.begin(id).await?;
            let txn = uow.transaction();
            let batch = Self::lock(txn, tenant, id).await?;
            if batch.is_closed {
                return Err(BatchError::BatchClosed(id));
            }

            let now = Utc::now();
            let batch = input.write(txn, batch, actor, now.into()).await?;
            let batch = self.rebalance_within(txn, tenant, batch, actor, now).await?;
            uow.commit().await.map_err(|e| batch_failure(&e, id))?;
            Ok(batch)
        })
        .await?;

        self.publish(tenant, actor, DomainEvent::Updated, batch.id);
        Ok(batch)
    }

    async fn set_view(
        &self,
        tenant: Tenant,
        batch_id: TransactionBatchId,
        actor: UserId,
        next: impl FnOnce(Uuid, ViewGate, bool) -> Result<ViewGate, BatchError>,
    ) -> Result<transaction_batches::Model, BatchError> {
        let id = batch_id.into_inner();
        let uow = self.begin(id).await?;
        let txn = uow.transaction();
        let batch = Self::lock(txn, tenant, id).await?;

        let gate = next(id, ViewGate::from_flags(batch.request_view, batch.can_view), batch.is_closed)?;
        let (request_view, can_view) = gate.flags();

        let mut active: transaction_batches::ActiveModel = batch.into();
        active.request_view = Set(request_view);
        active.can_view = Set(can_view);
        active.updated_at = Set(Utc::now().into());
        active.updated_by = Set(Some(actor.into_inner()));
        let batch = active.update(txn).await.map_err(|e| batch_failure(&e, id))?;
        uow.commit().await.map_err(|e| batch_failure(&e, id))?;

        debug!(batch_id = %id, gate = ?gate, "Batch view gate changed");
        self.publish(tenant, actor, DomainEvent::Updated, batch.id);
        Ok(batch)
    }

    async fn begin(&self, batch_id: Uuid) -> Result<UnitOfWork, BatchError> {
        UnitOfWork::begin(&self.db, self.options.lock_timeout)
            .await
            .map_err(|e| batch_failure(&e, batch_id))
    }

    async fn lock(
        txn: &DatabaseTransaction,
        tenant: Tenant,
        batch_id: Uuid,
    ) -> Result<transaction_batches::Model, BatchError> {
        transaction_batches::Entity::find_by_id(batch_id)
            .filter(batch_condition(tenant))
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(|e| batch_failure(&e, batch_id))?
            .ok_or(BatchError::NotFound(batch_id))
    }

    /// Gathers the inputs of a batch and computes its figures.
    async fn totals_within<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant: Tenant,
        batch: &transaction_batches::Model,
    ) -> Result<StoredTotals, BatchError> {
        let inputs = Self::inputs_within(conn, tenant, batch).await?;
        let totals = BatchAggregator::compute(&inputs, self.tolerance)?;
        Ok(StoredTotals {
            cash_check_voucher_total: -source_turnover(&inputs.ledger_lines, LedgerSource::CheckVoucher),
            batch: totals,
        })
    }

    async fn inputs_within<C: ConnectionTrait>(
        conn: &C,
        tenant: Tenant,
        batch: &transaction_batches::Model,
    ) -> Result<BatchInputs, BatchError> {
        let id = batch.id;
        let cash_on_hand = LedgerRepository::cash_on_hand_account(conn, tenant).await?;
        let ledger_lines = LedgerRepository::batch_lines(conn, tenant, TransactionBatchId::from(id), cash_on_hand).await?;

        let fundings = batch_fundings::Entity::find()
            .filter(batch_fundings::Column::TransactionBatchId.eq(id))
            .filter(batch_fundings::Column::DeletedAt.is_null())
            .all(conn)
            .await
            .map_err(|e| batch_failure(&e, id))?;
        let counts = cash_counts::Entity::find()
            .filter(cash_counts::Column::TransactionBatchId.eq(id))
            .filter(cash_counts::Column::DeletedAt.is_null())
            .all(conn)
            .await
            .map_err(|e| batch_failure(&e, id))?;
        let remittances = batch_remittances::Entity::find()
            .filter(batch_remittances::Column::TransactionBatchId.eq(id))
            .filter(batch_remittances::Column::DeletedAt.is_null())
            .all(conn)
            .await
            .map_err(|e| batch_failure(&e, id))?;
        let disbursements = disbursement_transactions::Entity::find()
            .filter(disbursement_transactions::Column::TransactionBatchId.eq(id))
            .filter(disbursement_transactions::Column::DeletedAt.is_null())
            .all(conn)
            .await
            .map_err(|e| batch_failure(&e, id))?;

        let (checks, online): (Vec<_>, Vec<_>) =
            remittances.into_iter().partition(|r| r.kind == RemittanceKind::Check);

        Ok(BatchInputs {
            ledger_lines,
            fundings: fundings.into_iter().map(|f| f.amount).collect(),
            cash_counts: counts
                .into_iter()
                .map(|c| CashCount {
                    bill_amount: c.bill_amount,
                    quantity: c.quantity,
                })
                .collect(),
            check_remittances: checks.into_iter().map(|r| r.amount).collect(),
            online_remittances: online.into_iter().map(|r| r.amount).collect(),
            petty_cash_disbursements: disbursements.into_iter().map(|d| d.amount).collect(),
            deposit_in_bank: batch.deposit_in_bank,
        })
    }

    fn publish(&self, tenant: Tenant, actor: UserId, event: fn(EntityRef) -> DomainEvent, batch_id: Uuid) {
        publish_all(
            self.publisher.as_ref(),
            [event(EntityRef::new(EntityKind::TransactionBatch, batch_id, tenant, Some(actor)))],
        );
    }
}

/// One change to an open batch's inputs.
enum SideInput {
    Funding(FundingInput),
    CashCount(CashCount),
    Remittance(RemittanceInput),
    Disbursement { description: Option<String>, amount: Decimal },
    DepositInBank(Decimal),
    Nothing,
}

impl SideInput {
    /// Writes the input against a locked batch and returns the batch row to re-balance.
    async fn write(
        &self,
        txn: &DatabaseTransaction,
        batch: transaction_batches::Model,
        actor: UserId,
        now: DateTimeWithTimeZone,
    ) -> Result<transaction_batches::Model, BatchError> {
        let id = batch.id;
        let (organization_id, branch_id) = (batch.organization_id, batch.branch_id);
        let by = Some(actor.into_inner());

        let written = match self {
            Self::Funding(input) => batch_fundings::ActiveModel {
                id: Set(Uuid::now_v7()),
                organization_id: Set(organization_id),
                branch_id: Set(branch_id),
                transaction_batch_id: Set(id),
                provided_by_user_id: Set(input.provided_by_user_id.map(Into::into)),
                name: Set(input.name.clone()),
                description: Set(input.description.clone()),
                amount: Set(round_currency(input.amount)),
                created_at: Set(now),
                created_by: Set(by),
                updated_at: Set(now),
                updated_by: Set(by),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map(|_| ()),
            Self::CashCount(count) => cash_counts::ActiveModel {
                id: Set(Uuid::now_v7()),
                organization_id: Set(organization_id),
                branch_id: Set(branch_id),
                transaction_batch_id: Set(id),
                bill_amount: Set(round_currency(count.bill_amount)),
                quantity: Set(count.quantity),
                created_at: Set(now),
                created_by: Set(by),
                updated_at: Set(now),
                updated_by: Set(by),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map(|_| ()),
            Self::Remittance(input) => batch_remittances::ActiveModel {
                id: Set(Uuid::now_v7()),
                organization_id: Set(organization_id),
                branch_id: Set(branch_id),
                transaction_batch_id: Set(id),
                kind: Set(input.kind),
                reference_number: Set(input.reference_number.clone()),
                amount: Set(round_currency(input.amount)),
                created_at: Set(now),
                created_by: Set(by),
                updated_at: Set(now),
                updated_by: Set(by),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map(|_| ()),
            Self::Disbursement { description, amount } => disbursement_transactions::ActiveModel {
                id: Set(Uuid::now_v7()),
                organization_id: Set(organization_id),
                branch_id: Set(branch_id),
                transaction_batch_id: Set(id),
                description: Set(description.clone()),
                amount: Set(round_currency(*amount)),
                created_at: Set(now),
                created_by: Set(by),
                updated_at: Set(now),
                updated_by: Set(by),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map(|_| ()),
            Self::DepositInBank(amount) => {
                let mut active: transaction_batches::ActiveModel = batch.into();
                active.deposit_in_bank = Set(*amount);
                return active.update(txn).await.map_err(|e| batch_failure(&e, id));
            }
            Self::Nothing => Ok(()),
        };

        written.map_err(|e| batch_failure(&e, id))?;
        Ok(batch)
    }
}

/// Aggregator output plus the figures only the batch row carries.
struct StoredTotals {
    batch: BatchTotals,
    cash_check_voucher_total: Decimal,
}

fn apply_totals(active: &mut transaction_batches::ActiveModel, totals: &StoredTotals) {
    let t = &totals.batch;
    active.total_cash_collection = Set(t.total_cash_collection);
    active.total_deposit_entry = Set(t.total_deposit_entry);
    active.beginning_balance = Set(t.beginning_balance);
    active.deposit_in_bank = Set(t.deposit_in_bank);
    active.cash_count_total = Set(t.cash_count_total);
    active.grand_total = Set(t.grand_total);
    active.petty_cash = Set(t.petty_cash);
    active.loan_releases = Set(t.loan_releases);
    active.savings_withdrawal = Set(t.savings_withdrawal);
    active.cash_check_voucher_total = Set(totals.cash_check_voucher_total);
    active.total_cash_handled = Set(t.total_cash_handled);
    active.total_supposed_remittance = Set(t.total_supposed_remittance);
    active.total_cash_on_hand = Set(t.total_cash_on_hand);
    active.total_check_remittance = Set(t.total_check_remittance);
    active.total_online_remittance = Set(t.total_online_remittance);
    active.total_deposit_in_bank = Set(t.total_deposit_in_bank);
    active.total_actual_remittance = Set(t.total_actual_remittance);
    active.total_actual_supposed_comparison = Set(t.total_actual_supposed_comparison);
    active.balance_status = Set(Some(t.balance_status.into()));
}

/// Live batches of one tenant.
fn batch_condition(tenant: Tenant) -> Condition {
    Condition::all()
        .add(transaction_batches::Column::OrganizationId.eq(tenant.organization_id.into_inner()))
        .add(transaction_batches::Column::BranchId.eq(tenant.branch_id.into_inner()))
        .add(transaction_batches::Column::DeletedAt.is_null())
}

//! Double-Entry Poster.
//!
//! One posting is one unit of work: validate, check the batch, issue the
//! receipt, write the account transaction, then lock each balance scope in
//! key order and append one general ledger line per entry carrying the
//! scope's new running balance. Nothing is written when any step fails.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    QuerySelect, Set,
};
use tracing::{debug, info};
use uuid::Uuid;

use coopledger_core::events::{DomainEvent, EntityKind, EntityRef, EventPublisher, publish_all};
use coopledger_core::ledger::{
    AccountTransactionDraft, BalanceScope, IssuedReceipt, LedgerError, NormalSide, PostingDocument,
    PostingHeader, PostingLine, PostingService, ReceiptKind, RunningBalance,
};
use coopledger_shared::types::{AccountId, Tenant, round_currency};

use crate::entities::{
    account_transaction_entries, account_transactions, accounts, branch_settings, general_ledgers,
    sea_orm_active_enums, transaction_batches,
};
use crate::repositories::ledger::LedgerRepository;
use crate::unit_of_work::{PostingOptions, UnitOfWork, ledger_failure, with_retry};

/// A committed posting.
#[derive(Debug, Clone)]
pub struct PostedTransaction {
    /// Book header.
    pub account_transaction: account_transactions::Model,
    /// Book entries.
    pub book_entries: Vec<account_transaction_entries::Model>,
    /// General ledger lines, in input order.
    pub entries: Vec<general_ledgers::Model>,
    /// Receipt number issued for the posting, if one was requested.
    pub receipt: Option<IssuedReceipt>,
}

impl PostedTransaction {
    /// Created events for the header and every line.
    #[must_use]
    pub fn events(&self, tenant: Tenant, header: &PostingHeader) -> Vec<DomainEvent> {
        let user = Some(header.posted_by);
        std::iter::once(DomainEvent::Created(EntityRef::new(
            EntityKind::AccountTransaction,
            self.account_transaction.id,
            tenant,
            user,
        )))
        .chain(self.entries.iter().map(|line| {
            DomainEvent::Created(EntityRef::new(EntityKind::GeneralLedger, line.id, tenant, user))
        }))
        .collect()
    }
}

/// Resolved account data needed to apply a line.
struct AccountInfo {
    side: NormalSide,
    kind: coopledger_core::ledger::AccountKind,
}

/// Latest state of a scope while a posting is being applied.
struct ScopeState {
    running: Option<RunningBalance>,
    latest_at: Option<DateTime<Utc>>,
    latest_created: Option<DateTime<Utc>>,
}

/// Double-Entry Poster backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PostingRepository {
    db: DatabaseConnection,
    options: PostingOptions,
    publisher: Arc<dyn EventPublisher>,
}

impl PostingRepository {
    /// Creates a new posting repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, options: PostingOptions, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            db,
            options,
            publisher,
        }
    }

    /// Posts a balanced set of lines under one header.
    ///
    /// Retryable failures (lock timeout, serialization failure) are
    /// re-attempted up to `max_retries` times, each in a fresh unit of work.
    /// Domain events are published after commit.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The lines are empty, malformed or unbalanced (nothing is written)
    /// - An account does not exist in the tenant
    /// - The target batch is closed or missing
    /// - A lock wait times out on every attempt
    #[tracing::instrument(
        skip(self, header, lines),
        fields(organization_id = %tenant.organization_id, branch_id = %tenant.branch_id, source = %header.source)
    )]
    pub async fn post(
        &self,
        tenant: Tenant,
        header: PostingHeader,
        lines: Vec<PostingLine>,
    ) -> Result<PostedTransaction, LedgerError> {
        PostingService::validate(&lines)?;

        let (header, lines) = (&header, &lines);
        let posted = with_retry(&self.options, "post", |_| async move {
            let uow = UnitOfWork::begin(&self.db, self.options.lock_timeout)
                .await
                .map_err(|e| ledger_failure(&e, "beginning posting", &tenant.to_string()))?;
            let posted = Self::post_within(uow.transaction(), tenant, header, lines, Utc::now()).await?;
            uow.commit()
                .await
                .map_err(|e| ledger_failure(&e, "committing posting", &tenant.to_string()))?;
            Ok::<_, LedgerError>(posted)
        })
        .await?;

        info!(
            account_transaction_id = %posted.account_transaction.id,
            lines = posted.entries.len(),
            "Posting committed"
        );
        publish_all(self.publisher.as_ref(), posted.events(tenant, header));
        Ok(posted)
    }

    /// Posts inside a caller-owned transaction; the caller commits and publishes.
    ///
    /// `now` stamps the receipt and the book header. Ledger lines without a
    /// header entry date are stamped after their scopes are locked.
    ///
    /// # Errors
    ///
    /// Same as [`Self::post`], without retrying.
    pub async fn post_within(
        txn: &DatabaseTransaction,
        tenant: Tenant,
        header: &PostingHeader,
        lines: &[PostingLine],
        now: DateTime<Utc>,
    ) -> Result<PostedTransaction, LedgerError> {
        PostingService::validate(lines)?;

        if let Some(batch_id) = header.transaction_batch_id {
            Self::ensure_batch_open(txn, tenant, batch_id.into_inner()).await?;
        }

        let receipt = match header.receipt {
            Some(kind) => Some(Self::issue_receipt(txn, tenant, kind, header.posted_by.into_inner(), now).await?),
            None => None,
        };

        let draft = AccountTransactionDraft::for_posting(header, lines);
        draft.validate()?;
        let (account_transaction, book_entries) =
            Self::insert_account_transaction(txn, tenant, &draft, header.posted_by.into_inner(), now).await?;

        let entries = Self::insert_entries(
            txn,
            tenant,
            header,
            lines,
            account_transaction.id,
            receipt.map(|r| r.reference()),
        )
        .await?;

        Ok(PostedTransaction {
            account_transaction,
            book_entries,
            entries,
            receipt,
        })
    }

    /// Rejects postings into a closed batch; the shared row lock keeps the
    /// batch from closing until this unit of work ends.
    async fn ensure_batch_open(txn: &DatabaseTransaction, tenant: Tenant, batch_id: Uuid) -> Result<(), LedgerError> {
        let scope = format!("batch {batch_id}");
        let batch = transaction_batches::Entity::find_by_id(batch_id)
            .filter(transaction_batches::Column::OrganizationId.eq(tenant.organization_id.into_inner()))
            .filter(transaction_batches::Column::BranchId.eq(tenant.branch_id.into_inner()))
            .filter(transaction_batches::Column::DeletedAt.is_null())
            .lock_shared()
            .one(txn)
            .await
            .map_err(|e| ledger_failure(&e, "checking transaction batch", &scope))?
            .ok_or(LedgerError::BatchNotFound(batch_id))?;

        if batch.is_closed {
            return Err(LedgerError::BatchClosed(batch_id));
        }
        Ok(())
    }

    /// Issues the next number of a branch receipt series under a row lock.
    async fn issue_receipt(
        txn: &DatabaseTransaction,
        tenant: Tenant,
        kind: ReceiptKind,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<IssuedReceipt, LedgerError> {
        let scope = format!("receipt series of branch {}", tenant.branch_id);
        let settings = branch_settings::Entity::find()
            .filter(branch_settings::Column::OrganizationId.eq(tenant.organization_id.into_inner()))
            .filter(branch_settings::Column::BranchId.eq(tenant.branch_id.into_inner()))
            .filter(branch_settings::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(|e| ledger_failure(&e, "locking branch settings", &scope))?
            .ok_or(LedgerError::BranchSettingsNotFound(tenant.branch_id.into_inner()))?;

        let mut series = settings.series(kind);
        let issued = series.issue();

        let mut active: branch_settings::ActiveModel = settings.into();
        active.set_series(kind, series);
        active.updated_at = Set(DateTimeWithTimeZone::from(now));
        active.updated_by = Set(Some(user_id));
        active
            .update(txn)
            .await
            .map_err(|e| ledger_failure(&e, "advancing receipt series", &scope))?;

        debug!(number = issued.number, iteration = issued.iteration, "Receipt issued");
        Ok(issued)
    }

    /// Inserts the book header and its entries.
    pub(crate) async fn insert_account_transaction(
        txn: &DatabaseTransaction,
        tenant: Tenant,
        draft: &AccountTransactionDraft,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(account_transactions::Model, Vec<account_transaction_entries::Model>), LedgerError> {
        let now: DateTimeWithTimeZone = now.into();
        let header = account_transactions::ActiveModel {
            id: Set(Uuid::now_v7()),
            organization_id: Set(tenant.organization_id.into_inner()),
            branch_id: Set(tenant.branch_id.into_inner()),
            source: Set(draft.source.into()),
            transaction_date: Set(draft.date),
            jv_number: Set(draft.jv_number.clone()),
            description: Set(draft.description.clone()),
            debit: Set(draft.debit),
            credit: Set(draft.credit),
            created_at: Set(now),
            created_by: Set(Some(user_id)),
            updated_at: Set(now),
            updated_by: Set(Some(user_id)),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|e| LedgerError::database("inserting account transaction", e))?;

        let mut entries = Vec::with_capacity(draft.entries.len());
        for line in &draft.entries {
            let entry = account_transaction_entries::ActiveModel {
                id: Set(Uuid::now_v7()),
                organization_id: Set(tenant.organization_id.into_inner()),
                branch_id: Set(tenant.branch_id.into_inner()),
                account_transaction_id: Set(header.id),
                account_id: Set(line.account_id.into_inner()),
                debit: Set(round_currency(line.debit)),
                credit: Set(round_currency(line.credit)),
                description: Set(line.description.clone()),
                created_at: Set(now),
                created_by: Set(Some(user_id)),
                updated_at: Set(now),
                updated_by: Set(Some(user_id)),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map_err(|e| LedgerError::database("inserting account transaction entry", e))?;
            entries.push(entry);
        }

        Ok((header, entries))
    }

    /// Locks every touched scope and appends one ledger line per input line.
    ///
    /// Scopes are locked in ascending key order so two postings touching the
    /// same scopes in opposite line order cannot deadlock.
    async fn insert_entries(
        txn: &DatabaseTransaction,
        tenant: Tenant,
        header: &PostingHeader,
        lines: &[PostingLine],
        account_transaction_id: Uuid,
        reference_number: Option<String>,
    ) -> Result<Vec<general_ledgers::Model>, LedgerError> {
        let accounts = Self::load_accounts(txn, tenant, lines).await?;

        let mut scopes: Vec<BalanceScope> = Vec::with_capacity(lines.len());
        for line in lines {
            let info = accounts
                .get(&line.account_id)
                .ok_or(LedgerError::AccountNotFound(line.account_id.into_inner()))?;
            scopes.push(BalanceScope::for_line(tenant, line.account_id, info.kind, line.member_profile_id));
        }

        // Track balance changes per scope within this posting
        let ordered: BTreeMap<String, BalanceScope> =
            scopes.iter().map(|scope| (scope.lock_key(), *scope)).collect();
        let mut states: HashMap<String, ScopeState> = HashMap::with_capacity(ordered.len());
        for (key, scope) in &ordered {
            let latest = LedgerRepository::current_balance_for_update(txn, scope).await?;
            let state = ScopeState {
                running: latest.as_ref().map(|line| RunningBalance {
                    version: line.balance_version,
                    previous_balance: line.balance,
                    current_balance: line.balance,
                }),
                latest_at: latest.as_ref().map(general_ledgers::Model::effective_at),
                latest_created: latest.as_ref().map(|line| line.created_at.to_utc()),
            };
            states.insert(key.clone(), state);
        }

        // Stamped only once every scope is held, never earlier than a line
        // already written to one of them.
        let stamped = states
            .values()
            .flat_map(|state| [state.latest_at, state.latest_created])
            .flatten()
            .fold(Utc::now(), DateTime::max);
        let entry_date = header.entry_date.unwrap_or(stamped);
        let (journal_voucher_id, cash_check_voucher_id) = match header.document {
            Some(PostingDocument::JournalVoucher(id)) => (Some(id.into_inner()), None),
            Some(PostingDocument::CashCheckVoucher(id)) => (None, Some(id.into_inner())),
            None => (None, None),
        };
        let user_id = header.posted_by.into_inner();
        let created_at: DateTimeWithTimeZone = stamped.into();

        let mut inserted = Vec::with_capacity(lines.len());
        for (line, scope) in lines.iter().zip(&scopes) {
            let key = scope.lock_key();
            let scope_name = scope.to_string();
            let state = states
                .get_mut(&key)
                .ok_or_else(|| LedgerError::database("applying line", format!("scope {scope_name} was not locked")))?;

            if let Some(latest) = state
                .latest_at
                .filter(|latest| header.entry_date.is_some() && *latest > entry_date)
            {
                return Err(LedgerError::Backdated {
                    scope: scope_name,
                    entry_date,
                    latest,
                });
            }

            let debit = round_currency(line.debit);
            let credit = round_currency(line.credit);
            let info = accounts
                .get(&line.account_id)
                .ok_or(LedgerError::AccountNotFound(line.account_id.into_inner()))?;
            let running = RunningBalance::apply(state.running.as_ref(), info.side.balance_change(debit, credit));

            let model = general_ledgers::ActiveModel {
                id: Set(Uuid::now_v7()),
                organization_id: Set(tenant.organization_id.into_inner()),
                branch_id: Set(tenant.branch_id.into_inner()),
                account_id: Set(line.account_id.into_inner()),
                member_profile_id: Set(line.member_profile_id.map(Into::into)),
                member_joint_account_id: Set(line.member_joint_account_id.map(Into::into)),
                scope_member_profile_id: Set(scope.member_profile_id().map(Into::into)),
                transaction_id: Set(header.transaction_id.map(Into::into)),
                transaction_batch_id: Set(header.transaction_batch_id.map(Into::into)),
                account_transaction_id: Set(Some(account_transaction_id)),
                journal_voucher_id: Set(journal_voucher_id),
                cash_check_voucher_id: Set(cash_check_voucher_id),
                loan_transaction_id: Set(line.loan_transaction_id.map(Into::into)),
                employee_user_id: Set(line.employee_user_id.map(Into::into)),
                payment_type_id: Set(header.payment_type_id.map(Into::into)),
                source: Set(header.source.into()),
                payment_kind: Set(header.payment_kind.map(sea_orm_active_enums::PaymentKind::from)),
                reference_number: Set(reference_number.clone()),
                description: Set(line.description.clone().or_else(|| header.description.clone())),
                currency: Set(header.currency.code().to_owned()),
                debit: Set(debit),
                credit: Set(credit),
                balance: Set(running.current_balance),
                balance_version: Set(running.version),
                entry_date: Set(Some(DateTimeWithTimeZone::from(entry_date))),
                print_number: Set(0),
                created_at: Set(created_at),
                created_by: Set(Some(user_id)),
                updated_at: Set(created_at),
                updated_by: Set(Some(user_id)),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map_err(|e| ledger_failure(&e, "inserting ledger line", &scope_name))?;

            debug!(
                account_id = %line.account_id,
                version = running.version,
                balance = %running.current_balance,
                "Ledger line written"
            );

            state.running = Some(running);
            state.latest_at = Some(entry_date);
            state.latest_created = Some(stamped);
            inserted.push(model);
        }

        Ok(inserted)
    }

    /// Loads the distinct accounts of a posting within the tenant.
    async fn load_accounts(
        txn: &DatabaseTransaction,
        tenant: Tenant,
        lines: &[PostingLine],
    ) -> Result<HashMap<AccountId, AccountInfo>, LedgerError> {
        let ids: Vec<Uuid> = lines.iter().map(|line| line.account_id.into_inner()).collect();
        let found = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(ids))
            .filter(accounts::Column::OrganizationId.eq(tenant.organization_id.into_inner()))
            .filter(accounts::Column::BranchId.eq(tenant.branch_id.into_inner()))
            .filter(accounts::Column::DeletedAt.is_null())
            .all(txn)
            .await
            .map_err(|e| LedgerError::database("loading accounts", e))?;

        let map: HashMap<AccountId, AccountInfo> = found
            .into_iter()
            .map(|account| {
                (
                    AccountId::from(account.id),
                    AccountInfo {
                        side: NormalSide::for_type(account.general_ledger_type.map(Into::into)),
                        kind: account.account_kind.into(),
                    },
                )
            })
            .collect();

        if let Some(missing) = lines.iter().find(|line| !map.contains_key(&line.account_id)) {
            return Err(LedgerError::AccountNotFound(missing.account_id.into_inner()));
        }
        Ok(map)
    }
}

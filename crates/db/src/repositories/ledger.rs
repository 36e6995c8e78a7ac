//! Balance Resolver: running balance lookups and general ledger read paths.
//!
//! The latest line of a scope is the row ordered first by
//! `(entry_date DESC NULLS LAST, created_at DESC, balance_version DESC)`.
//! "No line yet" is `Ok(None)`, never an error.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, NullOrdering};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    Order, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::info;

use coopledger_core::batch::BatchLedgerLine;
use coopledger_core::ledger::{
    AccountTransactionSource, BalanceScope, BalanceSnapshot, ContinuityBreak, LedgerEntry, LedgerError, LedgerSource,
    MemberLedgerTotal, NormalSide, PaymentKind, daily_ending_balances, verify_continuity,
};
use coopledger_core::voucher::utc_day_window;
use coopledger_shared::types::{
    AccountId, LedgerEntryId, MemberProfileId, PaymentTypeId, Tenant, TransactionBatchId,
};

use crate::entities::{accounts, branch_settings, general_ledgers, sea_orm_active_enums};
use crate::unit_of_work::{PostingOptions, UnitOfWork, acquire_scope_lock, ledger_failure, with_retry};

/// Filter options for listing general ledger lines.
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    /// Only lines on this account.
    pub account_id: Option<AccountId>,
    /// Only lines of this member.
    pub member_profile_id: Option<MemberProfileId>,
    /// Only lines produced by one of these sources.
    pub sources: Vec<LedgerSource>,
    /// Only lines paid this way.
    pub payment_kind: Option<PaymentKind>,
    /// Only lines with this payment type.
    pub payment_type_id: Option<PaymentTypeId>,
    /// Only lines attached to this batch.
    pub transaction_batch_id: Option<TransactionBatchId>,
    /// Leave out lines on the branch's cash-on-hand account.
    pub exclude_cash_on_hand: bool,
    /// Lines created at or after this instant.
    pub created_from: Option<DateTime<Utc>>,
    /// Lines created before this instant.
    pub created_before: Option<DateTime<Utc>>,
}

/// Balance Resolver and general ledger queries.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
    options: PostingOptions,
}

impl LedgerRepository {
    /// Creates a new ledger repository with default lock and retry bounds.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            options: PostingOptions::default(),
        }
    }

    /// Replaces the lock and retry bounds used by print numbering.
    #[must_use]
    pub fn with_options(mut self, options: PostingOptions) -> Self {
        self.options = options;
        self
    }

    // ========================================================================
    // Balance resolution
    // ========================================================================

    /// Latest line of a scope, optionally row-locked.
    ///
    /// With `for_update` the row is read `FOR UPDATE`; callers that need to
    /// serialize on a scope with no lines yet take the advisory scope lock
    /// first (see [`Self::current_balance_for_update`]).
    ///
    /// # Errors
    ///
    /// Returns a retryable error on lock timeout, a database error otherwise.
    pub async fn current_balance<C: ConnectionTrait>(
        conn: &C,
        scope: &BalanceScope,
        for_update: bool,
    ) -> Result<Option<general_ledgers::Model>, LedgerError> {
        let mut query = general_ledgers::Entity::find()
            .filter(scope_condition(scope))
            .order_by_with_nulls(general_ledgers::Column::EntryDate, Order::Desc, NullOrdering::Last)
            .order_by_desc(general_ledgers::Column::CreatedAt)
            .order_by_desc(general_ledgers::Column::BalanceVersion)
            .limit(1);
        if for_update {
            query = query.lock_exclusive();
        }

        query
            .one(conn)
            .await
            .map_err(|e| ledger_failure(&e, "resolving current balance", &scope.to_string()))
    }

    /// Serializes on a scope and returns its latest line.
    ///
    /// Holds the scope's advisory lock and the latest row's lock until the
    /// enclosing transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::LockTimeout` when the wait exceeds the unit of
    /// work's bound.
    pub async fn current_balance_for_update(
        txn: &DatabaseTransaction,
        scope: &BalanceScope,
    ) -> Result<Option<general_ledgers::Model>, LedgerError> {
        acquire_scope_lock(txn, &scope.lock_key())
            .await
            .map_err(|e| ledger_failure(&e, "locking balance scope", &scope.to_string()))?;
        Self::current_balance(txn, scope, true).await
    }

    /// Latest line of a scope, without locking.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn current_balance_for_read(
        &self,
        scope: &BalanceScope,
    ) -> Result<Option<general_ledgers::Model>, LedgerError> {
        Self::current_balance(&self.db, scope, false).await
    }

    /// The account holding the branch's cash-on-hand role.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::CashOnHandNotConfigured` when the branch has no
    /// settings row or the row names no account.
    pub async fn cash_on_hand_account<C: ConnectionTrait>(
        conn: &C,
        tenant: Tenant,
    ) -> Result<AccountId, LedgerError> {
        let settings = branch_settings::Entity::find()
            .filter(branch_settings::Column::OrganizationId.eq(tenant.organization_id.into_inner()))
            .filter(branch_settings::Column::BranchId.eq(tenant.branch_id.into_inner()))
            .filter(branch_settings::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(|e| LedgerError::database("loading branch settings", e))?;

        settings
            .and_then(|s| s.cash_on_hand_account_id)
            .map(AccountId::from)
            .ok_or_else(|| LedgerError::CashOnHandNotConfigured(tenant.branch_id.into_inner()))
    }

    /// Scope of the branch's cash-on-hand account.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::CashOnHandNotConfigured` when no account holds the role.
    pub async fn cash_on_hand_scope(&self, tenant: Tenant) -> Result<BalanceScope, LedgerError> {
        let account_id = Self::cash_on_hand_account(&self.db, tenant).await?;
        Ok(BalanceScope::cash_on_hand(tenant, account_id))
    }

    // ========================================================================
    // Read paths
    // ========================================================================

    /// Lists lines matching a filter, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the cash-on-hand account is needed but not
    /// configured, or the query fails.
    pub async fn list_entries(
        &self,
        tenant: Tenant,
        filter: LedgerFilter,
    ) -> Result<Vec<general_ledgers::Model>, LedgerError> {
        let mut query = general_ledgers::Entity::find().filter(tenant_condition(tenant));

        if let Some(account_id) = filter.account_id {
            query = query.filter(general_ledgers::Column::AccountId.eq(account_id.into_inner()));
        }
        if let Some(member) = filter.member_profile_id {
            query = query.filter(general_ledgers::Column::MemberProfileId.eq(member.into_inner()));
        }
        if !filter.sources.is_empty() {
            let sources: Vec<sea_orm_active_enums::LedgerSource> =
                filter.sources.iter().copied().map(Into::into).collect();
            query = query.filter(general_ledgers::Column::Source.is_in(sources));
        }
        if let Some(kind) = filter.payment_kind {
            query = query.filter(
                general_ledgers::Column::PaymentKind.eq(sea_orm_active_enums::PaymentKind::from(kind)),
            );
        }
        if let Some(payment_type_id) = filter.payment_type_id {
            query = query.filter(general_ledgers::Column::PaymentTypeId.eq(payment_type_id.into_inner()));
        }
        if let Some(batch_id) = filter.transaction_batch_id {
            query = query.filter(general_ledgers::Column::TransactionBatchId.eq(batch_id.into_inner()));
        }
        if filter.exclude_cash_on_hand {
            let cash_on_hand = Self::cash_on_hand_account(&self.db, tenant).await?;
            query = query.filter(general_ledgers::Column::AccountId.ne(cash_on_hand.into_inner()));
        }
        if let Some(from) = filter.created_from {
            query = query.filter(general_ledgers::Column::CreatedAt.gte(from));
        }
        if let Some(before) = filter.created_before {
            query = query.filter(general_ledgers::Column::CreatedAt.lt(before));
        }

        query
            .order_by_asc(general_ledgers::Column::CreatedAt)
            .order_by_asc(general_ledgers::Column::BalanceVersion)
            .all(&self.db)
            .await
            .map_err(|e| LedgerError::database("listing ledger lines", e))
    }

    /// A member's lines, leaving out the cash-on-hand side of each posting.
    ///
    /// # Errors
    ///
    /// Returns an error if the cash-on-hand account is not configured or the
    /// query fails.
    pub async fn member_statement(
        &self,
        tenant: Tenant,
        member_profile_id: MemberProfileId,
        account_id: Option<AccountId>,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let lines = self
            .list_entries(
                tenant,
                LedgerFilter {
                    account_id,
                    member_profile_id: Some(member_profile_id),
                    exclude_cash_on_hand: true,
                    ..LedgerFilter::default()
                },
            )
            .await?;
        Ok(lines.iter().map(general_ledgers::Model::entry).collect())
    }

    /// Highest passbook print number used for a member on an account; 0 when none.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn max_print_number(
        &self,
        tenant: Tenant,
        member_profile_id: MemberProfileId,
        account_id: AccountId,
    ) -> Result<i32, LedgerError> {
        Self::max_print_number_on(&self.db, tenant, member_profile_id, account_id).await
    }

    async fn max_print_number_on<C: ConnectionTrait>(
        conn: &C,
        tenant: Tenant,
        member_profile_id: MemberProfileId,
        account_id: AccountId,
    ) -> Result<i32, LedgerError> {
        let max: Option<Option<i32>> = general_ledgers::Entity::find()
            .select_only()
            .column_as(Expr::col(general_ledgers::Column::PrintNumber).max(), "max_print_number")
            .filter(tenant_condition(tenant))
            .filter(general_ledgers::Column::MemberProfileId.eq(member_profile_id.into_inner()))
            .filter(general_ledgers::Column::AccountId.eq(account_id.into_inner()))
            .into_tuple()
            .one(conn)
            .await
            .map_err(|e| LedgerError::database("reading max print number", e))?;

        Ok(max.flatten().unwrap_or(0))
    }

    /// Stamps a member's ledger line with the next passbook print number.
    ///
    /// Numbers run per member and account. Every call issues a fresh number,
    /// so reprinting a line moves it to the end of the sequence.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::EntryNotFound` for an unknown line,
    /// `LedgerError::NotAMemberEntry` for a line without a member, or a lock
    /// timeout once retries run out.
    #[tracing::instrument(
        skip(self),
        fields(organization_id = %tenant.organization_id, branch_id = %tenant.branch_id)
    )]
    pub async fn assign_print_number(&self, tenant: Tenant, line_id: LedgerEntryId) -> Result<i32, LedgerError> {
        let id = line_id.into_inner();
        let scope = format!("ledger entry {id}");
        let scope = scope.as_str();
        let number = with_retry(&self.options, "assign_print_number", |_| async move {
            let uow = UnitOfWork::begin(&self.db, self.options.lock_timeout)
                .await
                .map_err(|e| ledger_failure(&e, "beginning print numbering", scope))?;
            let txn = uow.transaction();

            let line = general_ledgers::Entity::find_by_id(id)
                .filter(tenant_condition(tenant))
                .one(txn)
                .await
                .map_err(|e| ledger_failure(&e, "loading ledger entry", scope))?
                .ok_or(LedgerError::EntryNotFound(id))?;
            let member = line
                .member_profile_id
                .map(MemberProfileId::from)
                .ok_or(LedgerError::NotAMemberEntry(id))?;
            let account = AccountId::from(line.account_id);

            // Serializes numbering per member and account without blocking postings.
            let passbook = BalanceScope::member(tenant, account, member);
            acquire_scope_lock(txn, &format!("passbook:{}", passbook.lock_key()))
                .await
                .map_err(|e| ledger_failure(&e, "locking passbook numbering", scope))?;

            let next = Self::max_print_number_on(txn, tenant, member, account).await? + 1;
            let now: DateTimeWithTimeZone = Utc::now().into();
            general_ledgers::Entity::update_many()
                .col_expr(general_ledgers::Column::PrintNumber, Expr::value(next))
                .col_expr(general_ledgers::Column::UpdatedAt, Expr::value(now))
                .filter(general_ledgers::Column::Id.eq(id))
                .exec(txn)
                .await
                .map_err(|e| ledger_failure(&e, "writing print number", scope))?;

            uow.commit()
                .await
                .map_err(|e| ledger_failure(&e, "committing print number", scope))?;
            Ok::<_, LedgerError>(next)
        })
        .await?;

        info!(ledger_entry_id = %id, print_number = number, "Print number assigned");
        Ok(number)
    }

    /// Lines of one daily book created within the UTC day around `day`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn daily_book(
        &self,
        tenant: Tenant,
        book: AccountTransactionSource,
        day: DateTime<Utc>,
    ) -> Result<Vec<general_ledgers::Model>, LedgerError> {
        let (start, end) = utc_day_window(day);
        self.list_entries(
            tenant,
            LedgerFilter {
                sources: book.sources(),
                created_from: Some(start),
                created_before: Some(end),
                ..LedgerFilter::default()
            },
        )
        .await
    }

    /// Every line of a scope in version order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn scope_history(&self, scope: &BalanceScope) -> Result<Vec<general_ledgers::Model>, LedgerError> {
        general_ledgers::Entity::find()
            .filter(scope_condition(scope))
            .order_by_asc(general_ledgers::Column::BalanceVersion)
            .all(&self.db)
            .await
            .map_err(|e| LedgerError::database(format!("reading history of {scope}"), e))
    }

    /// Checks that every stored balance of a scope follows from its predecessor.
    ///
    /// # Errors
    ///
    /// The outer error is a lookup failure; the inner one is the first break.
    pub async fn verify_scope(
        &self,
        scope: &BalanceScope,
    ) -> Result<Result<(), ContinuityBreak>, LedgerError> {
        let side = self.normal_side(scope.account_id()).await?;
        let lines: Vec<BalanceSnapshot> = self
            .scope_history(scope)
            .await?
            .iter()
            .map(general_ledgers::Model::snapshot)
            .collect();
        Ok(verify_continuity(side, &lines))
    }

    /// Balance, Σdebit and Σcredit of a member on an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn member_totals(
        &self,
        tenant: Tenant,
        member_profile_id: MemberProfileId,
        account_id: AccountId,
    ) -> Result<MemberLedgerTotal, LedgerError> {
        let scope = BalanceScope::member(tenant, account_id, member_profile_id);
        let lines: Vec<BalanceSnapshot> = self
            .scope_history(&scope)
            .await?
            .iter()
            .map(general_ledgers::Model::snapshot)
            .collect();
        Ok(MemberLedgerTotal::from_lines(&lines))
    }

    /// Ending balance of a scope for each UTC day in `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn daily_balances(
        &self,
        scope: &BalanceScope,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, Decimal)>, LedgerError> {
        let window_start = from.and_time(NaiveTime::MIN).and_utc();
        let history = self.scope_history(scope).await?;

        let opening = history
            .iter()
            .filter(|line| line.effective_at() < window_start)
            .max_by_key(|line| line.balance_version)
            .map_or(Decimal::ZERO, |line| line.balance);
        let lines: Vec<BalanceSnapshot> = history
            .iter()
            .filter(|line| line.effective_at() >= window_start)
            .map(general_ledgers::Model::snapshot)
            .collect();

        Ok(daily_ending_balances(opening, &lines, from, to))
    }

    /// Cash-on-hand lines stamped with a batch, as the batch aggregator reads them.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn batch_lines<C: ConnectionTrait>(
        conn: &C,
        tenant: Tenant,
        batch_id: TransactionBatchId,
        cash_on_hand: AccountId,
    ) -> Result<Vec<BatchLedgerLine>, LedgerError> {
        let lines = general_ledgers::Entity::find()
            .filter(tenant_condition(tenant))
            .filter(general_ledgers::Column::TransactionBatchId.eq(batch_id.into_inner()))
            .filter(general_ledgers::Column::AccountId.eq(cash_on_hand.into_inner()))
            .all(conn)
            .await
            .map_err(|e| LedgerError::database(format!("reading lines of batch {batch_id}"), e))?;

        Ok(lines
            .into_iter()
            .map(|line| BatchLedgerLine {
                source: line.source.into(),
                debit: line.debit,
                credit: line.credit,
            })
            .collect())
    }

    async fn normal_side(&self, account_id: AccountId) -> Result<NormalSide, LedgerError> {
        let account = accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| LedgerError::database("loading account", e))?
            .ok_or(LedgerError::AccountNotFound(account_id.into_inner()))?;
        Ok(NormalSide::for_type(account.general_ledger_type.map(Into::into)))
    }
}

/// Live rows of one tenant.
pub(crate) fn tenant_condition(tenant: Tenant) -> Condition {
    Condition::all()
        .add(general_ledgers::Column::OrganizationId.eq(tenant.organization_id.into_inner()))
        .add(general_ledgers::Column::BranchId.eq(tenant.branch_id.into_inner()))
        .add(general_ledgers::Column::DeletedAt.is_null())
}

/// Live rows of one balance scope.
///
/// Subsidiary and named scopes match only lines that did not update a member scope.
pub(crate) fn scope_condition(scope: &BalanceScope) -> Condition {
    let member = match scope.member_profile_id() {
        Some(member) => general_ledgers::Column::ScopeMemberProfileId.eq(member.into_inner()),
        None => general_ledgers::Column::ScopeMemberProfileId.is_null(),
    };
    tenant_condition(scope.tenant)
        .add(general_ledgers::Column::AccountId.eq(scope.account_id().into_inner()))
        .add(member)
}

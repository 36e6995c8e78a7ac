//! `SeaORM` Entity for general_ledgers table.
//!
//! One row per posted line. `balance` is the running balance of the line's
//! scope right after the line; `scope_member_profile_id` is set only when the
//! line updates a member-account scope.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use coopledger_core::ledger::{BalanceSnapshot, LedgerEntry};
use coopledger_shared::types::{BranchId, OrganizationId, RecordStatus, Tenant, UserId};

use super::sea_orm_active_enums::{LedgerSource, PaymentKind};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "general_ledgers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub account_id: Uuid,
    pub member_profile_id: Option<Uuid>,
    pub member_joint_account_id: Option<Uuid>,
    pub scope_member_profile_id: Option<Uuid>,
    pub transaction_id: Option<Uuid>,
    pub transaction_batch_id: Option<Uuid>,
    pub account_transaction_id: Option<Uuid>,
    pub journal_voucher_id: Option<Uuid>,
    pub cash_check_voucher_id: Option<Uuid>,
    pub loan_transaction_id: Option<Uuid>,
    pub employee_user_id: Option<Uuid>,
    pub payment_type_id: Option<Uuid>,
    pub source: LedgerSource,
    pub payment_kind: Option<PaymentKind>,
    pub reference_number: Option<String>,
    pub description: Option<String>,
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub debit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub credit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub balance: Decimal,
    pub balance_version: i64,
    pub entry_date: Option<DateTimeWithTimeZone>,
    pub print_number: i32,
    pub created_at: DateTimeWithTimeZone,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTimeWithTimeZone,
    pub updated_by: Option<Uuid>,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub deleted_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::transaction_batches::Entity",
        from = "Column::TransactionBatchId",
        to = "super::transaction_batches::Column::Id"
    )]
    TransactionBatches,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::transaction_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionBatches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Effective instant of the line; rows without an entry date fall back to insertion time.
    #[must_use]
    pub fn effective_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.entry_date.unwrap_or(self.created_at).to_utc()
    }

    /// The line as seen by continuity checks and balance reports.
    #[must_use]
    pub fn snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot {
            entry_date: self.effective_at(),
            version: self.balance_version,
            debit: self.debit,
            credit: self.credit,
            balance: self.balance,
        }
    }

    /// The stored row as a domain ledger entry.
    #[must_use]
    pub fn entry(&self) -> LedgerEntry {
        LedgerEntry {
            id: self.id.into(),
            tenant: Tenant::new(
                OrganizationId::from_uuid(self.organization_id),
                BranchId::from_uuid(self.branch_id),
            ),
            account_id: self.account_id.into(),
            member_profile_id: self.member_profile_id.map(Into::into),
            source: self.source.into(),
            description: self.description.clone(),
            debit: self.debit,
            credit: self.credit,
            balance: self.balance,
            balance_version: self.balance_version,
            entry_date: self.effective_at(),
            transaction_batch_id: self.transaction_batch_id.map(Into::into),
            reference_number: self.reference_number.clone(),
            print_number: self.print_number,
            status: RecordStatus::from_columns(
                self.deleted_at.map(|at| at.to_utc()),
                self.deleted_by.map(UserId::from_uuid),
            ),
        }
    }
}

//! `SeaORM` Entity for transaction_batches table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::BatchBalanceStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub employee_user_id: Uuid,
    pub batch_name: Option<String>,
    pub currency: String,
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_cash_collection: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_deposit_entry: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub beginning_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub deposit_in_bank: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub cash_count_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub grand_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub petty_cash: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub loan_releases: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub time_deposit_withdrawal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub savings_withdrawal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub cash_check_voucher_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_cash_handled: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_supposed_remittance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_cash_on_hand: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_check_remittance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_online_remittance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_deposit_in_bank: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_actual_remittance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_actual_supposed_comparison: Decimal,
    pub balance_status: Option<BatchBalanceStatus>,
    pub is_closed: bool,
    pub request_view: bool,
    pub can_view: bool,
    pub ended_at: Option<DateTimeWithTimeZone>,
    pub employee_by_name: Option<String>,
    pub employee_by_position: Option<String>,
    pub employee_by_signature_media_id: Option<Uuid>,
    #[sea_orm(column_type = "JsonBinary")]
    pub signatories: Json,
    pub created_at: DateTimeWithTimeZone,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTimeWithTimeZone,
    pub updated_by: Option<Uuid>,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub deleted_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::batch_fundings::Entity")]
    BatchFundings,
    #[sea_orm(has_many = "super::cash_counts::Entity")]
    CashCounts,
    #[sea_orm(has_many = "super::batch_remittances::Entity")]
    BatchRemittances,
    #[sea_orm(has_many = "super::disbursement_transactions::Entity")]
    DisbursementTransactions,
    #[sea_orm(has_many = "super::general_ledgers::Entity")]
    GeneralLedgers,
}

impl Related<super::batch_fundings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchFundings.def()
    }
}

impl Related<super::cash_counts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashCounts.def()
    }
}

impl Related<super::batch_remittances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchRemittances.def()
    }
}

impl Related<super::disbursement_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DisbursementTransactions.def()
    }
}

impl Related<super::general_ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GeneralLedgers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

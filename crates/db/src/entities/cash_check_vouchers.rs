//! `SeaORM` Entity for cash_check_vouchers table.
//!
//! `status` is the canonical lifecycle stage; the checkpoint column groups
//! are kept in step with it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::CashCheckVoucherStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_check_vouchers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub voucher_number: Option<String>,
    pub pay_to: Option<String>,
    pub check_number: Option<String>,
    pub check_date: Option<Date>,
    pub description: Option<String>,
    pub currency: String,
    pub status: CashCheckVoucherStatus,
    pub print_count: i32,
    pub transaction_batch_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_debit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_credit: Decimal,
    #[sea_orm(column_type = "JsonBinary")]
    pub signatories: Json,
    pub printed_by: Option<Uuid>,
    pub printed_by_name: Option<String>,
    pub printed_by_position: Option<String>,
    pub printed_by_signature_media_id: Option<Uuid>,
    pub printed_date: Option<DateTimeWithTimeZone>,
    pub approved_by: Option<Uuid>,
    pub approved_by_name: Option<String>,
    pub approved_by_position: Option<String>,
    pub approved_by_signature_media_id: Option<Uuid>,
    pub approved_date: Option<DateTimeWithTimeZone>,
    pub released_by: Option<Uuid>,
    pub released_by_name: Option<String>,
    pub released_by_position: Option<String>,
    pub released_by_signature_media_id: Option<Uuid>,
    pub released_date: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTimeWithTimeZone,
    pub updated_by: Option<Uuid>,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub deleted_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cash_check_voucher_entries::Entity")]
    CashCheckVoucherEntries,
}

impl Related<super::cash_check_voucher_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashCheckVoucherEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

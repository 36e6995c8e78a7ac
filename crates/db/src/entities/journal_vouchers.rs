//! `SeaORM` Entity for journal_vouchers table.
//!
//! The lifecycle stage is carried by the three nullable checkpoint column
//! groups (`printed_*`, `approved_*`, `released_*`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::JournalVoucherStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "journal_vouchers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub voucher_number: Option<String>,
    pub voucher_date: Date,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub currency: String,
    pub status: JournalVoucherStatus,
    pub print_count: i32,
    pub transaction_batch_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_debit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_credit: Decimal,
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
    #[sea_orm(has_many = "super::journal_voucher_entries::Entity")]
    JournalVoucherEntries,
}

impl Related<super::journal_voucher_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalVoucherEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for branch_settings table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use coopledger_core::ledger::{ReceiptKind, ReceiptSeries};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "branch_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub cash_on_hand_account_id: Option<Uuid>,
    pub withdraw_or_start: i64,
    pub withdraw_or_current: i64,
    pub withdraw_or_end: i64,
    pub withdraw_or_iteration: i64,
    pub deposit_or_start: i64,
    pub deposit_or_current: i64,
    pub deposit_or_end: i64,
    pub deposit_or_iteration: i64,
    pub loan_or_start: i64,
    pub loan_or_current: i64,
    pub loan_or_end: i64,
    pub loan_or_iteration: i64,
    pub check_voucher_or_start: i64,
    pub check_voucher_or_current: i64,
    pub check_voucher_or_end: i64,
    pub check_voucher_or_iteration: i64,
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
        from = "Column::CashOnHandAccountId",
        to = "super::accounts::Column::Id"
    )]
    CashOnHandAccount,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The receipt series of one kind.
    #[must_use]
    pub const fn series(&self, kind: ReceiptKind) -> ReceiptSeries {
        let (start, current, end, iteration) = match kind {
            ReceiptKind::Withdraw => (
                self.withdraw_or_start,
                self.withdraw_or_current,
                self.withdraw_or_end,
                self.withdraw_or_iteration,
            ),
            ReceiptKind::Deposit => (
                self.deposit_or_start,
                self.deposit_or_current,
                self.deposit_or_end,
                self.deposit_or_iteration,
            ),
            ReceiptKind::Loan => (
                self.loan_or_start,
                self.loan_or_current,
                self.loan_or_end,
                self.loan_or_iteration,
            ),
            ReceiptKind::CheckVoucher => (
                self.check_voucher_or_start,
                self.check_voucher_or_current,
                self.check_voucher_or_end,
                self.check_voucher_or_iteration,
            ),
        };
        ReceiptSeries {
            start,
            current,
            end,
            iteration,
        }
    }
}

impl ActiveModel {
    /// Writes back the advanced counters of one receipt series.
    pub fn set_series(&mut self, kind: ReceiptKind, series: ReceiptSeries) {
        use sea_orm::Set;

        match kind {
            ReceiptKind::Withdraw => {
                self.withdraw_or_current = Set(series.current);
                self.withdraw_or_iteration = Set(series.iteration);
            }
            ReceiptKind::Deposit => {
                self.deposit_or_current = Set(series.current);
                self.deposit_or_iteration = Set(series.iteration);
            }
            ReceiptKind::Loan => {
                self.loan_or_current = Set(series.current);
                self.loan_or_iteration = Set(series.iteration);
            }
            ReceiptKind::CheckVoucher => {
                self.check_voucher_or_current = Set(series.current);
                self.check_voucher_or_iteration = Set(series.iteration);
            }
        }
    }
}

//! Mapping between `VoucherState` and the checkpoint columns both voucher
//! tables share (`printed_*`, `approved_*`, `released_*`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ColumnTrait, Condition};
use uuid::Uuid;

use coopledger_core::ledger::PostingLine;
use coopledger_core::voucher::{Checkpoint, StageFilter, VoucherError, VoucherStage};
use coopledger_shared::types::{AccountId, LoanTransactionId, MemberProfileId, UserId};

use crate::entities::{cash_check_voucher_entries, cash_check_vouchers, journal_voucher_entries, journal_vouchers};

/// One entry submitted while drafting a voucher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoucherEntryInput {
    /// Account.
    pub account_id: AccountId,
    /// Member, for member-scoped accounts.
    pub member_profile_id: Option<MemberProfileId>,
    /// Employee the entry is attributed to.
    pub employee_user_id: Option<UserId>,
    /// Loan transaction the entry settles.
    pub loan_transaction_id: Option<LoanTransactionId>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Description.
    pub description: Option<String>,
}

impl VoucherEntryInput {
    /// The entry as a posting line.
    #[must_use]
    pub fn posting_line(&self) -> PostingLine {
        PostingLine {
            account_id: self.account_id,
            member_profile_id: self.member_profile_id,
            member_joint_account_id: None,
            loan_transaction_id: self.loan_transaction_id,
            employee_user_id: self.employee_user_id,
            debit: self.debit,
            credit: self.credit,
            description: self.description.clone(),
        }
    }
}

/// The five columns of one checkpoint group.
#[derive(Debug, Default)]
struct CheckpointColumns {
    by: Option<Uuid>,
    name: Option<String>,
    position: Option<String>,
    signature_media_id: Option<Uuid>,
    date: Option<DateTimeWithTimeZone>,
}

impl From<Option<Checkpoint>> for CheckpointColumns {
    fn from(checkpoint: Option<Checkpoint>) -> Self {
        checkpoint.map_or_else(Self::default, |c| Self {
            by: Some(c.by.into_inner()),
            name: c.name,
            position: c.position,
            signature_media_id: c.signature_media_id.map(Into::into),
            date: Some(c.at.into()),
        })
    }
}

fn checkpoint(
    stage: VoucherStage,
    by: Option<Uuid>,
    name: Option<&String>,
    position: Option<&String>,
    signature_media_id: Option<Uuid>,
    date: Option<DateTimeWithTimeZone>,
) -> Result<Option<Checkpoint>, VoucherError> {
    match (by, date) {
        (Some(by), Some(at)) => Ok(Some(Checkpoint {
            by: UserId::from(by),
            name: name.cloned(),
            position: position.cloned(),
            signature_media_id: signature_media_id.map(Into::into),
            at: at.to_utc(),
        })),
        (None, None) => Ok(None),
        _ => Err(VoucherError::CorruptCheckpoints(format!(
            "{stage} actor and date must be set together"
        ))),
    }
}

/// Rows of one stage partition, given the three checkpoint date columns.
fn stage_condition<C: ColumnTrait>(
    filter: StageFilter,
    now: DateTime<Utc>,
    printed: C,
    approved: C,
    released: C,
) -> Condition {
    let stage = match filter.stage() {
        VoucherStage::Draft => Condition::all()
            .add(printed.is_null())
            .add(approved.is_null())
            .add(released.is_null()),
        VoucherStage::Printed => Condition::all()
            .add(printed.is_not_null())
            .add(approved.is_null())
            .add(released.is_null()),
        VoucherStage::Approved => Condition::all()
            .add(printed.is_not_null())
            .add(approved.is_not_null())
            .add(released.is_null()),
        VoucherStage::Released => Condition::all()
            .add(printed.is_not_null())
            .add(approved.is_not_null())
            .add(released.is_not_null()),
    };
    match filter.release_window(now) {
        Some((start, end)) => stage.add(released.gte(start)).add(released.lt(end)),
        None => stage,
    }
}

macro_rules! voucher_checkpoints {
    ($table:ident) => {
        impl $table::Model {
            /// Lifecycle state rebuilt from the checkpoint columns.
            ///
            /// # Errors
            ///
            /// Returns an error if the stored checkpoints skip a stage or go backwards.
            pub fn state(&self) -> Result<coopledger_core::voucher::VoucherState, VoucherError> {
                coopledger_core::voucher::VoucherState::from_checkpoints(
                    checkpoint(
                        VoucherStage::Printed,
                        self.printed_by,
                        self.printed_by_name.as_ref(),
                        self.printed_by_position.as_ref(),
                        self.printed_by_signature_media_id,
                        self.printed_date,
                    )?,
                    checkpoint(
                        VoucherStage::Approved,
                        self.approved_by,
                        self.approved_by_name.as_ref(),
                        self.approved_by_position.as_ref(),
                        self.approved_by_signature_media_id,
                        self.approved_date,
                    )?,
                    checkpoint(
                        VoucherStage::Released,
                        self.released_by,
                        self.released_by_name.as_ref(),
                        self.released_by_position.as_ref(),
                        self.released_by_signature_media_id,
                        self.released_date,
                    )?,
                )
            }
        }

        impl $table::ActiveModel {
            /// Writes a lifecycle state into the checkpoint columns.
            pub fn set_state(&mut self, state: coopledger_core::voucher::VoucherState) {
                let (printed, approved, released) = state.into_checkpoints();

                let printed = CheckpointColumns::from(printed);
                self.printed_by = sea_orm::Set(printed.by);
                self.printed_by_name = sea_orm::Set(printed.name);
                self.printed_by_position = sea_orm::Set(printed.position);
                self.printed_by_signature_media_id = sea_orm::Set(printed.signature_media_id);
                self.printed_date = sea_orm::Set(printed.date);

                let approved = CheckpointColumns::from(approved);
                self.approved_by = sea_orm::Set(approved.by);
                self.approved_by_name = sea_orm::Set(approved.name);
                self.approved_by_position = sea_orm::Set(approved.position);
                self.approved_by_signature_media_id = sea_orm::Set(approved.signature_media_id);
                self.approved_date = sea_orm::Set(approved.date);

                let released = CheckpointColumns::from(released);
                self.released_by = sea_orm::Set(released.by);
                self.released_by_name = sea_orm::Set(released.name);
                self.released_by_position = sea_orm::Set(released.position);
                self.released_by_signature_media_id = sea_orm::Set(released.signature_media_id);
                self.released_date = sea_orm::Set(released.date);
            }
        }

        impl $table::Entity {
            /// Rows in one stage partition at instant `now`.
            #[must_use]
            pub fn stage_condition(filter: StageFilter, now: DateTime<Utc>) -> Condition {
                stage_condition(
                    filter,
                    now,
                    $table::Column::PrintedDate,
                    $table::Column::ApprovedDate,
                    $table::Column::ReleasedDate,
                )
            }
        }
    };
}

macro_rules! voucher_entry_lines {
    ($table:ident) => {
        impl $table::Model {
            /// The stored entry as a posting line.
            #[must_use]
            pub fn posting_line(&self) -> PostingLine {
                PostingLine {
                    account_id: AccountId::from(self.account_id),
                    member_profile_id: self.member_profile_id.map(MemberProfileId::from),
                    member_joint_account_id: None,
                    loan_transaction_id: self.loan_transaction_id.map(LoanTransactionId::from),
                    employee_user_id: self.employee_user_id.map(UserId::from),
                    debit: self.debit,
                    credit: self.credit,
                    description: self.description.clone(),
                }
            }
        }
    };
}

voucher_checkpoints!(journal_vouchers);
voucher_checkpoints!(cash_check_vouchers);
voucher_entry_lines!(journal_voucher_entries);
voucher_entry_lines!(cash_check_voucher_entries);

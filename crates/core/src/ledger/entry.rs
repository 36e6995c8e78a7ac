//! Posting input and posted general ledger lines.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use coopledger_shared::types::{
    AccountId, CashCheckVoucherId, Currency, JournalVoucherId, LedgerEntryId, LoanTransactionId,
    MemberJointAccountId, MemberProfileId, PaymentTypeId, RecordStatus, Tenant, TransactionBatchId,
    TransactionId, UserId,
};

use crate::ledger::receipt::ReceiptKind;
use crate::ledger::types::{LedgerSource, PaymentKind};

/// One debit or credit line submitted for posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLine {
    /// Account the line posts to.
    pub account_id: AccountId,
    /// Member the line belongs to, for member-scoped accounts.
    pub member_profile_id: Option<MemberProfileId>,
    /// Joint account the line was made through.
    pub member_joint_account_id: Option<MemberJointAccountId>,
    /// Loan transaction the line settles or releases.
    pub loan_transaction_id: Option<LoanTransactionId>,
    /// Employee the line is attributed to.
    pub employee_user_id: Option<UserId>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Free-form line description.
    pub description: Option<String>,
}

impl PostingLine {
    /// A debit line on an account.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self::new(account_id, amount, Decimal::ZERO)
    }

    /// A credit line on an account.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self::new(account_id, Decimal::ZERO, amount)
    }

    fn new(account_id: AccountId, debit: Decimal, credit: Decimal) -> Self {
        Self {
            account_id,
            member_profile_id: None,
            member_joint_account_id: None,
            loan_transaction_id: None,
            employee_user_id: None,
            debit,
            credit,
            description: None,
        }
    }

    /// Narrows the line to a member.
    #[must_use]
    pub fn for_member(mut self, member_profile_id: MemberProfileId) -> Self {
        self.member_profile_id = Some(member_profile_id);
        self
    }

    /// Attaches a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The voucher document a posting settles, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PostingDocument {
    /// A released journal voucher.
    JournalVoucher(JournalVoucherId),
    /// A released cash check voucher.
    CashCheckVoucher(CashCheckVoucherId),
}

/// Header describing the economic event a set of lines belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingHeader {
    /// Business event that produced the lines.
    pub source: LedgerSource,
    /// Accounting date of the event.
    pub transaction_date: NaiveDate,
    /// Instant the lines take effect; defaults to the posting instant.
    pub entry_date: Option<DateTime<Utc>>,
    /// Journal voucher number printed on the book.
    pub jv_number: Option<String>,
    /// Description of the event.
    pub description: Option<String>,
    /// Currency of every line.
    pub currency: Currency,
    /// Teller transaction the lines belong to.
    pub transaction_id: Option<TransactionId>,
    /// Batch the lines are attached to; rejected when the batch is closed.
    pub transaction_batch_id: Option<TransactionBatchId>,
    /// Voucher settled by this posting.
    pub document: Option<PostingDocument>,
    /// How the event was paid.
    pub payment_kind: Option<PaymentKind>,
    /// Payment type reference.
    pub payment_type_id: Option<PaymentTypeId>,
    /// Issue an official receipt number from this branch series.
    pub receipt: Option<ReceiptKind>,
    /// Acting user.
    pub posted_by: UserId,
}

impl PostingHeader {
    /// Header with only the mandatory fields set.
    #[must_use]
    pub fn new(source: LedgerSource, transaction_date: NaiveDate, posted_by: UserId) -> Self {
        Self {
            source,
            transaction_date,
            entry_date: None,
            jv_number: None,
            description: None,
            currency: Currency::default(),
            transaction_id: None,
            transaction_batch_id: None,
            document: None,
            payment_kind: None,
            payment_type_id: None,
            receipt: None,
            posted_by,
        }
    }

    /// Attaches the posting to a batch.
    #[must_use]
    pub fn in_batch(mut self, batch_id: TransactionBatchId) -> Self {
        self.transaction_batch_id = Some(batch_id);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A posted general ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Line id.
    pub id: LedgerEntryId,
    /// Owning organization and branch.
    pub tenant: Tenant,
    /// Account.
    pub account_id: AccountId,
    /// Member, when member-scoped.
    pub member_profile_id: Option<MemberProfileId>,
    /// Source event.
    pub source: LedgerSource,
    /// Line narrative.
    pub description: Option<String>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Scope balance after the line.
    pub balance: Decimal,
    /// Per-scope version of the line.
    pub balance_version: i64,
    /// Effective instant.
    pub entry_date: DateTime<Utc>,
    /// Batch the line is attached to.
    pub transaction_batch_id: Option<TransactionBatchId>,
    /// Official receipt number stamped on the line.
    pub reference_number: Option<String>,
    /// Passbook print counter.
    pub print_number: i32,
    /// Soft-delete status.
    pub status: RecordStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_builders() {
        let account = AccountId::new();
        let member = MemberProfileId::new();
        let line = PostingLine::debit(account, dec!(250))
            .for_member(member)
            .with_description("savings deposit");
        assert_eq!(line.debit, dec!(250));
        assert_eq!(line.credit, Decimal::ZERO);
        assert_eq!(line.member_profile_id, Some(member));
        assert_eq!(line.description.as_deref(), Some("savings deposit"));

        let line = PostingLine::credit(account, dec!(250));
        assert_eq!(line.debit, Decimal::ZERO);
        assert_eq!(line.credit, dec!(250));
    }

    #[test]
    fn test_header_defaults() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let batch = TransactionBatchId::new();
        let header = PostingHeader::new(LedgerSource::Deposit, date, UserId::new()).in_batch(batch);
        assert_eq!(header.transaction_batch_id, Some(batch));
        assert_eq!(header.currency, Currency::Php);
        assert!(header.receipt.is_none());
        assert!(header.document.is_none());
    }
}

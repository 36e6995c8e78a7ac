//! Account transactions: the book-level header over a posting.
//!
//! The header's debit and credit must equal the sums of its child entries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use coopledger_shared::types::{AccountId, amounts_equal};

use crate::ledger::entry::{PostingHeader, PostingLine};
use crate::ledger::error::LedgerError;
use crate::ledger::posting::{DebitCredit, PostingTotals};
use crate::ledger::types::AccountTransactionSource;

/// One child entry of an account transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTransactionLine {
    /// Account.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Line description.
    pub description: Option<String>,
}

impl DebitCredit for AccountTransactionLine {
    fn debit(&self) -> Decimal {
        self.debit
    }

    fn credit(&self) -> Decimal {
        self.credit
    }
}

/// An account transaction ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTransactionDraft {
    /// Book the transaction is reported under.
    pub source: AccountTransactionSource,
    /// Accounting date.
    pub date: NaiveDate,
    /// Journal voucher number.
    pub jv_number: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Header debit.
    pub debit: Decimal,
    /// Header credit.
    pub credit: Decimal,
    /// Child entries.
    pub entries: Vec<AccountTransactionLine>,
}

impl AccountTransactionDraft {
    /// Builds the book header for a posting, deriving totals from its lines.
    ///
    /// Sources without a daily book are filed under the general journal.
    #[must_use]
    pub fn for_posting(header: &PostingHeader, lines: &[PostingLine]) -> Self {
        let totals = PostingTotals::of(lines);
        Self {
            source: header
                .source
                .book()
                .unwrap_or(AccountTransactionSource::GeneralJournal),
            date: header.transaction_date,
            jv_number: header.jv_number.clone(),
            description: header.description.clone(),
            debit: totals.debit,
            credit: totals.credit,
            entries: lines
                .iter()
                .map(|line| AccountTransactionLine {
                    account_id: line.account_id,
                    debit: line.debit,
                    credit: line.credit,
                    description: line.description.clone(),
                })
                .collect(),
        }
    }

    /// Checks the header agrees with its entries.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.entries.is_empty() {
            return Err(LedgerError::NoEntries);
        }
        let totals = PostingTotals::of(&self.entries);
        if amounts_equal(self.debit, totals.debit) && amounts_equal(self.credit, totals.credit) {
            Ok(())
        } else {
            Err(LedgerError::HeaderMismatch {
                header_debit: self.debit,
                header_credit: self.credit,
                entries_debit: totals.debit,
                entries_credit: totals.credit,
            })
        }
    }
}

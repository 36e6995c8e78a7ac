//! Double-entry validation.
//!
//! Every posting is checked here before anything is written: it must carry at
//! least one line, no negative or double-sided lines, and Σdebit must equal
//! Σcredit once both are rounded to the currency scale.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use coopledger_shared::types::round_currency;

use crate::ledger::entry::PostingLine;
use crate::ledger::error::LedgerError;

/// Anything carrying a debit and a credit amount.
pub trait DebitCredit {
    /// Debit amount.
    fn debit(&self) -> Decimal;
    /// Credit amount.
    fn credit(&self) -> Decimal;
}

impl DebitCredit for PostingLine {
    fn debit(&self) -> Decimal {
        self.debit
    }

    fn credit(&self) -> Decimal {
        self.credit
    }
}

impl<T: DebitCredit> DebitCredit for &T {
    fn debit(&self) -> Decimal {
        (*self).debit()
    }

    fn credit(&self) -> Decimal {
        (*self).credit()
    }
}

/// Rounded debit and credit sums of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingTotals {
    /// Σdebit, rounded to the currency scale.
    pub debit: Decimal,
    /// Σcredit, rounded to the currency scale.
    pub credit: Decimal,
}

impl PostingTotals {
    /// Sums and rounds the lines.
    #[must_use]
    pub fn of<L: DebitCredit>(lines: &[L]) -> Self {
        let debit: Decimal = lines.iter().map(DebitCredit::debit).sum();
        let credit: Decimal = lines.iter().map(DebitCredit::credit).sum();
        Self {
            debit: round_currency(debit),
            credit: round_currency(credit),
        }
    }

    /// Returns true when both sums agree.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }

    /// Σdebit - Σcredit.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Stateless validator for postings.
pub struct PostingService;

impl PostingService {
    /// Validates shape and balance law of a posting.
    ///
    /// # Returns
    ///
    /// * `Ok(PostingTotals)` if the lines may be written
    /// * `Err(LedgerError::NoEntries)` if there are no lines
    /// * `Err(LedgerError::NegativeAmount)` / `Err(LedgerError::DoubleSided)` for a malformed line
    /// * `Err(LedgerError::Unbalanced)` with both sums if Σdebit != Σcredit
    pub fn validate<L: DebitCredit>(lines: &[L]) -> Result<PostingTotals, LedgerError> {
        if lines.is_empty() {
            return Err(LedgerError::NoEntries);
        }
        Self::check_lines(lines)?;
        Self::ensure_balanced(lines)
    }

    /// Checks each line's shape without the balance law; drafts may be unbalanced.
    pub fn check_lines<L: DebitCredit>(lines: &[L]) -> Result<(), LedgerError> {
        for (index, line) in lines.iter().enumerate() {
            let (debit, credit) = (line.debit(), line.credit());
            if debit < Decimal::ZERO || credit < Decimal::ZERO {
                return Err(LedgerError::NegativeAmount { line: index });
            }
            if debit > Decimal::ZERO && credit > Decimal::ZERO {
                return Err(LedgerError::DoubleSided { line: index });
            }
        }
        Ok(())
    }

    /// Checks only the balance law.
    pub fn ensure_balanced<L: DebitCredit>(lines: &[L]) -> Result<PostingTotals, LedgerError> {
        let totals = PostingTotals::of(lines);
        if totals.is_balanced() {
            Ok(totals)
        } else {
            Err(LedgerError::Unbalanced {
                debit: totals.debit,
                credit: totals.credit,
            })
        }
    }
}

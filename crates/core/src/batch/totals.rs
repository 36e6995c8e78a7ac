//! Batch totals and reconciliation.
//!
//! The same computation backs the live rebalance after every posting and the
//! authoritative figures written by close. Ledger turnover is measured on the
//! branch's cash-on-hand account: money coming into the drawer is a debit,
//! money leaving it is a credit.

use coopledger_shared::types::round_currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::batch::error::BatchError;
use crate::batch::types::BalanceStatus;
use crate::ledger::{DebitCredit, LedgerSource};

/// One cash-on-hand ledger line tagged with the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLedgerLine {
    /// Business event that produced the line.
    pub source: LedgerSource,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

impl DebitCredit for BatchLedgerLine {
    fn debit(&self) -> Decimal {
        self.debit
    }

    fn credit(&self) -> Decimal {
        self.credit
    }
}

/// One bill denomination counted in the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashCount {
    /// Face value of the bill or coin.
    pub bill_amount: Decimal,
    /// Number of pieces.
    pub quantity: i32,
}

impl CashCount {
    /// Value of the counted pieces.
    pub fn total(&self) -> Result<Decimal, BatchError> {
        if self.quantity < 0 {
            return Err(BatchError::NegativeQuantity);
        }
        let bill_amount = non_negative("cash count bill", self.bill_amount)?;
        Ok(bill_amount * Decimal::from(self.quantity))
    }
}

/// Passes `amount` through unless it is below zero.
///
/// `input` names the side input in the error.
pub fn non_negative(input: &'static str, amount: Decimal) -> Result<Decimal, BatchError> {
    if amount < Decimal::ZERO {
        Err(BatchError::NegativeAmount { input })
    } else {
        Ok(amount)
    }
}

/// Everything the aggregator reads for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInputs {
    /// Cash-on-hand ledger lines stamped with the batch id.
    pub ledger_lines: Vec<BatchLedgerLine>,
    /// Batch funding amounts (the beginning balance).
    pub fundings: Vec<Decimal>,
    /// Drawer count.
    pub cash_counts: Vec<CashCount>,
    /// Check remittance amounts.
    pub check_remittances: Vec<Decimal>,
    /// Online remittance amounts.
    pub online_remittances: Vec<Decimal>,
    /// Petty cash disbursement amounts.
    pub petty_cash_disbursements: Vec<Decimal>,
    /// Deposit in bank recorded on the batch header.
    pub deposit_in_bank: Decimal,
}

/// Computed batch figures, as persisted on the batch row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTotals {
    /// Σ payment-source turnover.
    pub total_cash_collection: Decimal,
    /// Σ deposit-source turnover.
    pub total_deposit_entry: Decimal,
    /// Σ fundings.
    pub beginning_balance: Decimal,
    /// Deposit in bank from the header.
    pub deposit_in_bank: Decimal,
    /// Σ bill × quantity.
    pub cash_count_total: Decimal,
    /// Cash on hand + deposit in bank + beginning balance.
    pub grand_total: Decimal,
    /// Σ petty cash disbursements.
    pub petty_cash: Decimal,
    /// Cash paid out for loan releases.
    pub loan_releases: Decimal,
    /// Cash paid out for savings withdrawals.
    pub savings_withdrawal: Decimal,
    /// Beginning balance + deposit in bank + cash collection.
    pub total_cash_handled: Decimal,
    /// Cash handled − (savings withdrawal + petty cash).
    pub total_supposed_remittance: Decimal,
    /// Drawer count.
    pub total_cash_on_hand: Decimal,
    /// Σ check remittances.
    pub total_check_remittance: Decimal,
    /// Σ online remittances.
    pub total_online_remittance: Decimal,
    /// Deposit in bank counted as remitted.
    pub total_deposit_in_bank: Decimal,
    /// Check + online + cash on hand + deposit in bank.
    pub total_actual_remittance: Decimal,
    /// Actual − supposed.
    pub total_actual_supposed_comparison: Decimal,
    /// Classification of the comparison.
    pub balance_status: BalanceStatus,
}

/// Stateless batch totals calculator.
pub struct BatchAggregator;

impl BatchAggregator {
    /// Computes every batch figure from its inputs.
    ///
    /// Amounts are rounded to currency scale before they are combined, so the
    /// stored figures always satisfy the formula exactly.
    pub fn compute(inputs: &BatchInputs, tolerance: Decimal) -> Result<BatchTotals, BatchError> {
        if inputs.deposit_in_bank < Decimal::ZERO {
            return Err(BatchError::NegativeDeposit);
        }
        for (input, amounts) in [
            ("funding", &inputs.fundings),
            ("check remittance", &inputs.check_remittances),
            ("online remittance", &inputs.online_remittances),
            ("disbursement", &inputs.petty_cash_disbursements),
        ] {
            for amount in amounts {
                non_negative(input, *amount)?;
            }
        }

        let total_cash_collection = source_turnover(&inputs.ledger_lines, LedgerSource::Payment);
        let total_deposit_entry = source_turnover(&inputs.ledger_lines, LedgerSource::Deposit);
        let savings_withdrawal = -source_turnover(&inputs.ledger_lines, LedgerSource::Withdraw);
        let loan_releases = -source_turnover(&inputs.ledger_lines, LedgerSource::Loan);

        let beginning_balance = sum(&inputs.fundings);
        let petty_cash = sum(&inputs.petty_cash_disbursements);
        let total_check_remittance = sum(&inputs.check_remittances);
        let total_online_remittance = sum(&inputs.online_remittances);
        let deposit_in_bank = round_currency(inputs.deposit_in_bank);

        let mut cash_count_total = Decimal::ZERO;
        for count in &inputs.cash_counts {
            cash_count_total += count.total()?;
        }
        let cash_count_total = round_currency(cash_count_total);

        let total_cash_handled = beginning_balance + deposit_in_bank + total_cash_collection;
        let total_supposed_remittance = total_cash_handled - (savings_withdrawal + petty_cash);
        let total_actual_remittance =
            total_check_remittance + total_online_remittance + cash_count_total + deposit_in_bank;
        let grand_total = cash_count_total + deposit_in_bank + beginning_balance;
        let comparison = total_actual_remittance - total_supposed_remittance;

        Ok(BatchTotals {
            total_cash_collection,
            total_deposit_entry,
            beginning_balance,
            deposit_in_bank,
            cash_count_total,
            grand_total,
            petty_cash,
            loan_releases,
            savings_withdrawal,
            total_cash_handled,
            total_supposed_remittance,
            total_cash_on_hand: cash_count_total,
            total_check_remittance,
            total_online_remittance,
            total_deposit_in_bank: deposit_in_bank,
            total_actual_remittance,
            total_actual_supposed_comparison: comparison,
            balance_status: BalanceStatus::classify(comparison, tolerance),
        })
    }
}

/// Σ(debit − credit) of the lines from one source, rounded.
#[must_use]
pub fn source_turnover(lines: &[BatchLedgerLine], source: LedgerSource) -> Decimal {
    round_currency(
        lines
            .iter()
            .filter(|line| line.source == source)
            .map(|line| line.debit() - line.credit())
            .sum(),
    )
}

fn sum(amounts: &[Decimal]) -> Decimal {
    round_currency(amounts.iter().copied().sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn line(source: LedgerSource, debit: Decimal, credit: Decimal) -> BatchLedgerLine {
        BatchLedgerLine { source, debit, credit }
    }

    fn teller_day() -> BatchInputs {
        BatchInputs {
            ledger_lines: vec![
                line(LedgerSource::Payment, dec!(1500), dec!(0)),
                line(LedgerSource::Payment, dec!(500), dec!(0)),
                line(LedgerSource::Deposit, dec!(3000), dec!(0)),
                line(LedgerSource::Withdraw, dec!(0), dec!(800)),
                line(LedgerSource::Loan, dec!(0), dec!(10000)),
                line(LedgerSource::JournalVoucher, dec!(250), dec!(0)),
            ],
            fundings: vec![dec!(5000)],
            cash_counts: vec![
                CashCount { bill_amount: dec!(1000), quantity: 5 },
                CashCount { bill_amount: dec!(100), quantity: 10 },
                CashCount { bill_amount: dec!(50), quantity: 4 },
            ],
            check_remittances: vec![dec!(300)],
            online_remittances: vec![dec!(200)],
            petty_cash_disbursements: vec![dec!(100)],
            deposit_in_bank: dec!(0),
        }
    }

    #[test]
    fn test_compute_teller_day() {
        let totals = BatchAggregator::compute(&teller_day(), dec!(0)).unwrap();

        assert_eq!(totals.total_cash_collection, dec!(2000));
        assert_eq!(totals.total_deposit_entry, dec!(3000));
        assert_eq!(totals.beginning_balance, dec!(5000));
        assert_eq!(totals.savings_withdrawal, dec!(800));
        assert_eq!(totals.loan_releases, dec!(10000));
        assert_eq!(totals.petty_cash, dec!(100));
        assert_eq!(totals.total_cash_handled, dec!(7000));
        assert_eq!(totals.total_supposed_remittance, dec!(6100));
        assert_eq!(totals.cash_count_total, dec!(6200));
        assert_eq!(totals.total_actual_remittance, dec!(6700));
        assert_eq!(totals.grand_total, dec!(11200));
        assert_eq!(totals.total_actual_supposed_comparison, dec!(600));
        assert_eq!(totals.balance_status, BalanceStatus::Overage);
    }

    #[test]
    fn test_exact_remittance_is_balanced() {
        let mut inputs = teller_day();
        inputs.cash_counts = vec![CashCount { bill_amount: dec!(100), quantity: 56 }];
        let totals = BatchAggregator::compute(&inputs, dec!(0)).unwrap();

        assert_eq!(totals.total_actual_remittance, totals.total_supposed_remittance);
        assert_eq!(totals.balance_status, BalanceStatus::Balanced);
    }

    #[test]
    fn test_tolerance_absorbs_small_shortage() {
        let mut inputs = teller_day();
        inputs.cash_counts = vec![
            CashCount { bill_amount: dec!(100), quantity: 55 },
            CashCount { bill_amount: dec!(0.25), quantity: 399 },
        ];
        let strict = BatchAggregator::compute(&inputs, dec!(0)).unwrap();
        let lenient = BatchAggregator::compute(&inputs, dec!(1.00)).unwrap();

        assert_eq!(strict.total_actual_supposed_comparison, dec!(-0.25));
        assert_eq!(strict.balance_status, BalanceStatus::Shortage);
        assert_eq!(lenient.balance_status, BalanceStatus::Balanced);
    }

    #[test]
    fn test_deposit_in_bank_counts_on_both_sides() {
        let mut inputs = teller_day();
        inputs.deposit_in_bank = dec!(2500);
        let base = BatchAggregator::compute(&teller_day(), dec!(0)).unwrap();
        let totals = BatchAggregator::compute(&inputs, dec!(0)).unwrap();

        assert_eq!(totals.total_deposit_in_bank, dec!(2500));
        assert_eq!(totals.total_cash_handled, base.total_cash_handled + dec!(2500));
        assert_eq!(totals.total_actual_remittance, base.total_actual_remittance + dec!(2500));
        assert_eq!(
            totals.total_actual_supposed_comparison,
            base.total_actual_supposed_comparison
        );
    }

    #[test]
    fn test_empty_batch_is_balanced() {
        let totals = BatchAggregator::compute(&BatchInputs::default(), dec!(0)).unwrap();
        assert_eq!(totals.grand_total, Decimal::ZERO);
        assert_eq!(totals.balance_status, BalanceStatus::Balanced);
    }

    #[test]
    fn test_rejects_negative_inputs() {
        let mut inputs = teller_day();
        inputs.deposit_in_bank = dec!(-1);
        assert!(matches!(
            BatchAggregator::compute(&inputs, dec!(0)),
            Err(BatchError::NegativeDeposit)
        ));

        let mut inputs = teller_day();
        inputs.cash_counts.push(CashCount { bill_amount: dec!(20), quantity: -1 });
        assert!(matches!(
            BatchAggregator::compute(&inputs, dec!(0)),
            Err(BatchError::NegativeQuantity)
        ));
    }

    #[rstest]
    #[case::funding("funding")]
    #[case::check_remittance("check remittance")]
    #[case::online_remittance("online remittance")]
    #[case::disbursement("disbursement")]
    fn test_rejects_negative_side_inputs(#[case] input: &'static str) {
        let mut inputs = teller_day();
        let target = match input {
            "funding" => &mut inputs.fundings,
            "check remittance" => &mut inputs.check_remittances,
            "online remittance" => &mut inputs.online_remittances,
            _ => &mut inputs.petty_cash_disbursements,
        };
        target.push(dec!(-0.01));

        let err = BatchAggregator::compute(&inputs, dec!(0)).unwrap_err();
        assert!(matches!(err, BatchError::NegativeAmount { input: named } if named == input));
    }

    #[test]
    fn test_negative_bill_amount_rejected() {
        let count = CashCount { bill_amount: dec!(-100), quantity: 2 };
        assert!(matches!(
            count.total(),
            Err(BatchError::NegativeAmount { input: "cash count bill" })
        ));
        assert_eq!(non_negative("funding", dec!(0)).unwrap(), dec!(0));
    }

    #[test]
    fn test_source_turnover_ignores_other_sources() {
        let lines = teller_day().ledger_lines;
        assert_eq!(source_turnover(&lines, LedgerSource::JournalVoucher), dec!(250));
        assert_eq!(source_turnover(&lines, LedgerSource::Adjustment), dec!(0));
    }
}

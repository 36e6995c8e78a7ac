//! Property-based tests for batch totals.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::totals::{BatchAggregator, BatchInputs, BatchLedgerLine, CashCount};
use super::types::BalanceStatus;
use crate::ledger::LedgerSource;

fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn source() -> impl Strategy<Value = LedgerSource> {
    prop::sample::select(LedgerSource::ALL.to_vec())
}

fn ledger_line() -> impl Strategy<Value = BatchLedgerLine> {
    (source(), amount(), any::<bool>()).prop_map(|(source, value, is_debit)| BatchLedgerLine {
        source,
        debit: if is_debit { value } else { Decimal::ZERO },
        credit: if is_debit { Decimal::ZERO } else { value },
    })
}

fn cash_count() -> impl Strategy<Value = CashCount> {
    (prop::sample::select(vec![1i64, 5, 10, 20, 50, 100, 200, 500, 1000]), 0i32..500)
        .prop_map(|(bill, quantity)| CashCount {
            bill_amount: Decimal::from(bill),
            quantity,
        })
}

fn inputs() -> impl Strategy<Value = BatchInputs> {
    (
        prop::collection::vec(ledger_line(), 0..30),
        prop::collection::vec(amount(), 0..3),
        prop::collection::vec(cash_count(), 0..9),
        prop::collection::vec(amount(), 0..5),
        prop::collection::vec(amount(), 0..5),
        prop::collection::vec(amount(), 0..5),
        amount(),
    )
        .prop_map(
            |(ledger_lines, fundings, cash_counts, checks, online, petty, deposit_in_bank)| {
                BatchInputs {
                    ledger_lines,
                    fundings,
                    cash_counts,
                    check_remittances: checks,
                    online_remittances: online,
                    petty_cash_disbursements: petty,
                    deposit_in_bank,
                }
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* batch inputs, the stored figures SHALL satisfy the
    /// reconciliation identities exactly.
    #[test]
    fn prop_totals_satisfy_formula(inputs in inputs()) {
        let t = BatchAggregator::compute(&inputs, Decimal::ZERO).unwrap();

        prop_assert_eq!(
            t.total_cash_handled,
            t.beginning_balance + t.deposit_in_bank + t.total_cash_collection
        );
        prop_assert_eq!(
            t.total_supposed_remittance,
            t.total_cash_handled - (t.savings_withdrawal + t.petty_cash)
        );
        prop_assert_eq!(
            t.total_actual_remittance,
            t.total_check_remittance + t.total_online_remittance + t.total_cash_on_hand + t.total_deposit_in_bank
        );
        prop_assert_eq!(
            t.grand_total,
            t.total_cash_on_hand + t.deposit_in_bank + t.beginning_balance
        );
        prop_assert_eq!(
            t.total_actual_supposed_comparison,
            t.total_actual_remittance - t.total_supposed_remittance
        );
    }

    /// *For any* inputs and tolerance, the status SHALL agree with the sign of
    /// the comparison outside the tolerance band.
    #[test]
    fn prop_status_matches_comparison(inputs in inputs(), tolerance in amount()) {
        let t = BatchAggregator::compute(&inputs, tolerance).unwrap();
        let comparison = t.total_actual_supposed_comparison;

        let expected = if comparison.abs() <= tolerance {
            BalanceStatus::Balanced
        } else if comparison > Decimal::ZERO {
            BalanceStatus::Overage
        } else {
            BalanceStatus::Shortage
        };
        prop_assert_eq!(t.balance_status, expected);
    }

    /// *For any* inputs, computing twice SHALL yield identical totals, so a
    /// close after a rebalance never drifts.
    #[test]
    fn prop_compute_is_deterministic(inputs in inputs()) {
        let first = BatchAggregator::compute(&inputs, Decimal::ZERO).unwrap();
        let second = BatchAggregator::compute(&inputs, Decimal::ZERO).unwrap();
        prop_assert_eq!(first, second);
    }
}

//! Property-based tests for the balance law.
//!
//! Every accepted posting has Σdebit == Σcredit after rounding; every
//! rejected one reports the sums it saw.

use proptest::prelude::*;
use rust_decimal::Decimal;
use coopledger_shared::types::{AccountId, round_currency};

use super::entry::PostingLine;
use super::error::LedgerError;
use super::posting::{PostingService, PostingTotals};

/// Strategy to generate a positive amount with cent precision (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to split a total into one to six debit lines plus one balancing credit.
fn balanced_lines() -> impl Strategy<Value = Vec<PostingLine>> {
    prop::collection::vec(positive_amount(), 1..=6).prop_map(|debits| {
        let total: Decimal = debits.iter().copied().sum();
        let mut lines: Vec<PostingLine> = debits
            .into_iter()
            .map(|amount| PostingLine::debit(AccountId::new(), amount))
            .collect();
        lines.push(PostingLine::credit(AccountId::new(), total));
        lines
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* set of debits balanced by one credit, validation SHALL accept it
    /// and report equal totals.
    #[test]
    fn prop_balanced_postings_accepted(lines in balanced_lines()) {
        let totals = PostingService::validate(&lines);
        prop_assert!(totals.is_ok());
        let totals = totals.unwrap();
        prop_assert_eq!(totals.debit, totals.credit);
        prop_assert_eq!(totals.difference(), Decimal::ZERO);
    }

    /// *For any* balanced posting, skewing one credit by at least a cent SHALL
    /// be rejected with the skewed sums.
    #[test]
    fn prop_skewed_postings_rejected(
        mut lines in balanced_lines(),
        skew in positive_amount(),
    ) {
        let last = lines.len() - 1;
        lines[last].credit += skew;

        let expected = PostingTotals::of(&lines);
        match PostingService::validate(&lines) {
            Err(LedgerError::Unbalanced { debit, credit }) => {
                prop_assert_eq!(debit, expected.debit);
                prop_assert_eq!(credit, expected.credit);
                prop_assert!(credit > debit);
            }
            other => prop_assert!(false, "expected Unbalanced, got {:?}", other),
        }
    }

    /// *For any* posting, the reported totals SHALL already be at currency scale.
    #[test]
    fn prop_totals_are_rounded(
        amounts in prop::collection::vec(1i64..10_000_000i64, 1..=5),
    ) {
        let lines: Vec<PostingLine> = amounts
            .into_iter()
            .map(|mills| PostingLine::debit(AccountId::new(), Decimal::new(mills, 3)))
            .collect();
        let totals = PostingTotals::of(&lines);
        prop_assert_eq!(totals.debit, round_currency(totals.debit));
        prop_assert_eq!(totals.credit, Decimal::ZERO);
    }
}

//! Property-based tests for running balance continuity.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::{
    BalanceSnapshot, MemberLedgerTotal, NormalSide, RunningBalance, verify_continuity,
};

/// Strategy for a (debit, credit) pair where exactly one side is set.
fn line_amounts() -> impl Strategy<Value = (Decimal, Decimal)> {
    (1i64..1_000_000i64, any::<bool>()).prop_map(|(cents, is_debit)| {
        let amount = Decimal::new(cents, 2);
        if is_debit {
            (amount, Decimal::ZERO)
        } else {
            (Decimal::ZERO, amount)
        }
    })
}

fn side() -> impl Strategy<Value = NormalSide> {
    prop_oneof![Just(NormalSide::DebitNormal), Just(NormalSide::CreditNormal)]
}

/// Posts the amounts through `RunningBalance` the way the poster does.
fn post_chain(side: NormalSide, amounts: &[(Decimal, Decimal)]) -> Vec<BalanceSnapshot> {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
    let mut prior: Option<RunningBalance> = None;
    let mut lines = Vec::with_capacity(amounts.len());
    for (index, (debit, credit)) in amounts.iter().enumerate() {
        let running = RunningBalance::apply(prior.as_ref(), side.balance_change(*debit, *credit));
        lines.push(BalanceSnapshot {
            entry_date: start + Duration::minutes(i64::try_from(index).unwrap_or(0)),
            version: running.version,
            debit: *debit,
            credit: *credit,
            balance: running.current_balance,
        });
        prior = Some(running);
    }
    lines
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* chain built by the poster, each stored balance SHALL equal the
    /// previous balance plus the line's signed change.
    #[test]
    fn prop_posted_chain_is_continuous(
        side in side(),
        amounts in prop::collection::vec(line_amounts(), 1..40),
    ) {
        let lines = post_chain(side, &amounts);
        prop_assert!(verify_continuity(side, &lines).is_ok());
    }

    /// *For any* chain, tampering with one stored balance SHALL be reported at
    /// that line's version.
    #[test]
    fn prop_tampered_chain_is_detected(
        side in side(),
        amounts in prop::collection::vec(line_amounts(), 1..40),
        index in any::<prop::sample::Index>(),
    ) {
        let mut lines = post_chain(side, &amounts);
        let target = index.index(lines.len());
        lines[target].balance += Decimal::new(1, 2);

        let err = verify_continuity(side, &lines).unwrap_err();
        prop_assert_eq!(err.version, lines[target].version);
    }

    /// *For any* debit-normal chain, the member total balance SHALL equal
    /// Σdebit - Σcredit.
    #[test]
    fn prop_member_total_matches_turnover(
        amounts in prop::collection::vec(line_amounts(), 1..40),
    ) {
        let lines = post_chain(NormalSide::DebitNormal, &amounts);
        let total = MemberLedgerTotal::from_lines(&lines);
        prop_assert_eq!(total.balance, total.total_debit - total.total_credit);
    }

    /// *For any* chain, versions SHALL form the contiguous sequence [1, 2, ..., N].
    #[test]
    fn prop_versions_contiguous(
        side in side(),
        amounts in prop::collection::vec(line_amounts(), 1..40),
    ) {
        let lines = post_chain(side, &amounts);
        let versions: Vec<i64> = lines.iter().map(|line| line.version).collect();
        let expected: Vec<i64> = (1..=i64::try_from(amounts.len()).unwrap_or(0)).collect();
        prop_assert_eq!(versions, expected);
    }
}

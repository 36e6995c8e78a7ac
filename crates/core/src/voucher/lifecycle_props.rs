//! Property-based tests for the voucher state machine.
//!
//! Random action sequences must never produce out-of-order checkpoints, and
//! reprints must never move a voucher backwards.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use coopledger_shared::types::{AccountId, UserId};

use super::error::VoucherError;
use super::lifecycle::VoucherLifecycle;
use super::types::{Actor, VoucherStage, VoucherState};
use crate::ledger::PostingLine;

#[derive(Debug, Clone, Copy)]
enum Action {
    Print,
    Approve,
    Release,
    UndoPrint,
    UndoApprove,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Print),
        Just(Action::Approve),
        Just(Action::Release),
        Just(Action::UndoPrint),
        Just(Action::UndoApprove),
    ]
}

fn entries(amount: Decimal) -> Vec<PostingLine> {
    vec![
        PostingLine::debit(AccountId::new(), amount),
        PostingLine::credit(AccountId::new(), amount),
    ]
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap()
}

fn apply(
    action: Action,
    state: VoucherState,
    print_count: i32,
    lines: &[PostingLine],
    at: DateTime<Utc>,
) -> Result<(VoucherState, i32), VoucherError> {
    let actor = Actor::user(UserId::new());
    let transition = match action {
        Action::Print => VoucherLifecycle::print(state, print_count, lines, &actor, at)?,
        Action::Approve => VoucherLifecycle::approve(state, print_count, &actor, at)?,
        Action::Release => VoucherLifecycle::release(state, print_count, &actor, at)?,
        Action::UndoPrint => VoucherLifecycle::undo_print(state)?,
        Action::UndoApprove => VoucherLifecycle::undo_approve(state, print_count)?,
    };
    Ok((transition.state, transition.print_count))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* sequence of actions at non-decreasing instants, the resulting
    /// checkpoints SHALL be ordered printed ≤ approved ≤ released and decode
    /// back into the same state.
    #[test]
    fn prop_checkpoints_stay_monotonic(
        actions in prop::collection::vec(action(), 1..30),
        cents in 1i64..10_000_000i64,
    ) {
        let lines = entries(Decimal::new(cents, 2));
        let mut state = VoucherState::Draft;
        let mut print_count = 0;

        for (step, action) in actions.into_iter().enumerate() {
            let at = base_time() + Duration::minutes(i64::try_from(step).unwrap_or(0));
            if let Ok((next, count)) = apply(action, state.clone(), print_count, &lines, at) {
                state = next;
                print_count = count;
            }

            let (printed, approved, released) = state.clone().into_checkpoints();
            if let (Some(p), Some(a)) = (&printed, &approved) {
                prop_assert!(p.at <= a.at);
            }
            if let (Some(a), Some(r)) = (&approved, &released) {
                prop_assert!(a.at <= r.at);
            }
            let decoded = VoucherState::from_checkpoints(printed, approved, released);
            prop_assert_eq!(decoded.ok(), Some(state.clone()));
        }
    }

    /// *For any* printed voucher, reprinting N times SHALL add N to the print
    /// counter and leave the state untouched.
    #[test]
    fn prop_reprint_is_idempotent_on_state(
        reprints in 1usize..20,
        cents in 1i64..10_000_000i64,
    ) {
        let lines = entries(Decimal::new(cents, 2));
        let (state, mut count) = apply(Action::Print, VoucherState::Draft, 0, &lines, base_time()).unwrap();
        prop_assert_eq!(state.stage(), VoucherStage::Printed);

        for n in 0..reprints {
            let at = base_time() + Duration::minutes(i64::try_from(n).unwrap_or(0) + 1);
            let (next, next_count) = apply(Action::Print, state.clone(), count, &lines, at).unwrap();
            prop_assert_eq!(&next, &state);
            prop_assert_eq!(next_count, count + 1);
            count = next_count;
        }
        prop_assert_eq!(usize::try_from(count).unwrap_or(0), reprints + 1);
    }

    /// *For any* stage other than Approved, release SHALL fail with
    /// InvalidTransition and name that stage.
    #[test]
    fn prop_release_requires_approval(prints in 0usize..3, cents in 1i64..1_000_000i64) {
        let lines = entries(Decimal::new(cents, 2));
        let mut state = VoucherState::Draft;
        let mut count = 0;
        for _ in 0..prints {
            let (next, next_count) = apply(Action::Print, state, count, &lines, base_time()).unwrap();
            state = next;
            count = next_count;
        }
        let expected_from = state.stage();
        match apply(Action::Release, state, count, &lines, base_time()) {
            Err(VoucherError::InvalidTransition { from, to }) => {
                prop_assert_eq!(from, expected_from);
                prop_assert_eq!(to, VoucherStage::Released);
            }
            other => prop_assert!(false, "expected InvalidTransition, got {:?}", other),
        }
    }
}

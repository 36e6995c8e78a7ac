//! Voucher lifecycle state machine.
//!
//! `Draft → Printed → Approved → Released`, plus reprint, undo-print and
//! undo-approve. Every method validates the current state and returns the
//! state to persist; nothing here touches storage.

use chrono::{DateTime, Utc};

use crate::ledger::{DebitCredit, LedgerError, PostingService};
use crate::voucher::error::VoucherError;
use crate::voucher::types::{Actor, Checkpoint, VoucherStage, VoucherState};

/// Result of a successful lifecycle action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State to persist.
    pub state: VoucherState,
    /// Print counter to persist.
    pub print_count: i32,
    /// The voucher's entries must be posted to the general ledger in the same unit of work.
    pub posts_to_ledger: bool,
}

/// Stateless service for voucher lifecycle transitions.
pub struct VoucherLifecycle;

impl VoucherLifecycle {
    /// Print a voucher, or reprint one that was already printed.
    ///
    /// The first print requires the entries to satisfy the balance law.
    /// Reprints only bump the counter: state and checkpoints stay as they are.
    pub fn print<L: DebitCredit>(
        state: VoucherState,
        print_count: i32,
        entries: &[L],
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> Result<Transition, VoucherError> {
        match state {
            VoucherState::Draft => {
                ensure_balanced(entries)?;
                Ok(Transition {
                    state: VoucherState::Printed {
                        printed: Checkpoint::stamp(actor, at),
                    },
                    print_count: print_count.saturating_add(1),
                    posts_to_ledger: false,
                })
            }
            reprinted => Ok(Transition {
                state: reprinted,
                print_count: print_count.saturating_add(1),
                posts_to_ledger: false,
            }),
        }
    }

    /// Approve a printed voucher.
    pub fn approve(
        state: VoucherState,
        print_count: i32,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> Result<Transition, VoucherError> {
        match state {
            VoucherState::Printed { printed } => {
                ensure_not_before(&printed, at)?;
                Ok(Transition {
                    state: VoucherState::Approved {
                        printed,
                        approved: Checkpoint::stamp(actor, at),
                    },
                    print_count,
                    posts_to_ledger: false,
                })
            }
            other => Err(invalid(&other, VoucherStage::Approved)),
        }
    }

    /// Release an approved voucher; the caller posts its entries.
    pub fn release(
        state: VoucherState,
        print_count: i32,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> Result<Transition, VoucherError> {
        match state {
            VoucherState::Approved { printed, approved } => {
                ensure_not_before(&approved, at)?;
                Ok(Transition {
                    state: VoucherState::Released {
                        printed,
                        approved,
                        released: Checkpoint::stamp(actor, at),
                    },
                    print_count,
                    posts_to_ledger: true,
                })
            }
            other => Err(invalid(&other, VoucherStage::Released)),
        }
    }

    /// Undo a print: back to draft with the counter reset.
    pub fn undo_print(state: VoucherState) -> Result<Transition, VoucherError> {
        match state {
            VoucherState::Printed { .. } => Ok(Transition {
                state: VoucherState::Draft,
                print_count: 0,
                posts_to_ledger: false,
            }),
            other => Err(invalid(&other, VoucherStage::Draft)),
        }
    }

    /// Undo an approval: back to printed. Released vouchers cannot be undone.
    pub fn undo_approve(state: VoucherState, print_count: i32) -> Result<Transition, VoucherError> {
        match state {
            VoucherState::Approved { printed, .. } => Ok(Transition {
                state: VoucherState::Printed { printed },
                print_count,
                posts_to_ledger: false,
            }),
            other => Err(invalid(&other, VoucherStage::Printed)),
        }
    }

    /// Guard for add/replace/remove entry requests.
    pub fn ensure_entries_mutable(state: &VoucherState) -> Result<(), VoucherError> {
        if state.entries_mutable() {
            Ok(())
        } else {
            Err(VoucherError::EntriesFrozen {
                stage: state.stage(),
            })
        }
    }

    /// Returns true if moving from `from` to `to` is a lifecycle step.
    #[must_use]
    pub fn is_valid_transition(from: VoucherStage, to: VoucherStage) -> bool {
        matches!(
            (from, to),
            (VoucherStage::Draft, VoucherStage::Printed)
                | (VoucherStage::Printed, VoucherStage::Approved | VoucherStage::Draft)
                | (VoucherStage::Approved, VoucherStage::Released | VoucherStage::Printed)
        )
    }
}

fn invalid(state: &VoucherState, to: VoucherStage) -> VoucherError {
    VoucherError::InvalidTransition {
        from: state.stage(),
        to,
    }
}

fn ensure_not_before(previous: &Checkpoint, at: DateTime<Utc>) -> Result<(), VoucherError> {
    if at < previous.at {
        Err(VoucherError::CheckpointOutOfOrder)
    } else {
        Ok(())
    }
}

fn ensure_balanced<L: DebitCredit>(entries: &[L]) -> Result<(), VoucherError> {
    match PostingService::validate(entries) {
        Ok(_) => Ok(()),
        Err(LedgerError::Unbalanced { debit, credit }) => Err(VoucherError::Unbalanced { debit, credit }),
        Err(LedgerError::NoEntries) => Err(VoucherError::NoEntries),
        Err(other) => Err(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PostingLine;
    use chrono::Duration;
    use coopledger_shared::types::{AccountId, UserId};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn actor() -> Actor {
        Actor::user(UserId::new())
    }

    fn balanced() -> Vec<PostingLine> {
        vec![
            PostingLine::debit(AccountId::new(), dec!(1000)),
            PostingLine::credit(AccountId::new(), dec!(1000)),
        ]
    }

    fn printed_at(at: DateTime<Utc>) -> VoucherState {
        VoucherState::Printed {
            printed: Checkpoint::stamp(&actor(), at),
        }
    }

    #[test]
    fn test_full_lifecycle() {
        let t0 = Utc::now();
        let printed = VoucherLifecycle::print(VoucherState::Draft, 0, &balanced(), &actor(), t0).unwrap();
        assert_eq!(printed.state.stage(), VoucherStage::Printed);
        assert_eq!(printed.print_count, 1);

        let approved =
            VoucherLifecycle::approve(printed.state, printed.print_count, &actor(), t0 + Duration::minutes(1))
                .unwrap();
        assert_eq!(approved.state.stage(), VoucherStage::Approved);
        assert!(!approved.posts_to_ledger);

        let released =
            VoucherLifecycle::release(approved.state, approved.print_count, &actor(), t0 + Duration::minutes(2))
                .unwrap();
        assert_eq!(released.state.stage(), VoucherStage::Released);
        assert!(released.posts_to_ledger);
        assert_eq!(released.print_count, 1);
    }

    #[test]
    fn test_print_rejects_unbalanced_entries() {
        let entries = vec![
            PostingLine::debit(AccountId::new(), dec!(1000)),
            PostingLine::credit(AccountId::new(), dec!(900)),
        ];
        let err = VoucherLifecycle::print(VoucherState::Draft, 0, &entries, &actor(), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            VoucherError::Unbalanced { debit, credit } if debit == dec!(1000) && credit == dec!(900)
        ));
    }

    #[test]
    fn test_print_rejects_empty_voucher() {
        let entries: Vec<PostingLine> = Vec::new();
        let err = VoucherLifecycle::print(VoucherState::Draft, 0, &entries, &actor(), Utc::now()).unwrap_err();
        assert!(matches!(err, VoucherError::NoEntries));
    }

    #[test]
    fn test_reprint_keeps_state_and_checkpoint() {
        let t0 = Utc::now();
        let state = printed_at(t0);
        let reprinted =
            VoucherLifecycle::print(state.clone(), 3, &Vec::<PostingLine>::new(), &actor(), t0 + Duration::hours(1))
                .unwrap();
        assert_eq!(reprinted.state, state);
        assert_eq!(reprinted.print_count, 4);
    }

    #[test]
    fn test_approve_without_print_is_invalid() {
        let err = VoucherLifecycle::approve(VoucherState::Draft, 0, &actor(), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            VoucherError::InvalidTransition { from: VoucherStage::Draft, to: VoucherStage::Approved }
        ));
    }

    #[test]
    fn test_release_without_approval_is_invalid() {
        let err = VoucherLifecycle::release(printed_at(Utc::now()), 1, &actor(), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            VoucherError::InvalidTransition { from: VoucherStage::Printed, to: VoucherStage::Released }
        ));
    }

    #[test]
    fn test_approve_before_print_time_rejected() {
        let t0 = Utc::now();
        let err = VoucherLifecycle::approve(printed_at(t0), 1, &actor(), t0 - Duration::seconds(5)).unwrap_err();
        assert!(matches!(err, VoucherError::CheckpointOutOfOrder));
    }

    #[test]
    fn test_undo_print_resets_counter() {
        let undone = VoucherLifecycle::undo_print(printed_at(Utc::now())).unwrap();
        assert_eq!(undone.state, VoucherState::Draft);
        assert_eq!(undone.print_count, 0);

        assert!(VoucherLifecycle::undo_print(VoucherState::Draft).is_err());
    }

    #[test]
    fn test_undo_approve_returns_to_printed() {
        let t0 = Utc::now();
        let printed = Checkpoint::stamp(&actor(), t0);
        let state = VoucherState::Approved {
            printed: printed.clone(),
            approved: Checkpoint::stamp(&actor(), t0),
        };
        let undone = VoucherLifecycle::undo_approve(state, 2).unwrap();
        assert_eq!(undone.state, VoucherState::Printed { printed: printed.clone() });
        assert_eq!(undone.print_count, 2);

        let released = VoucherState::Released {
            printed: printed.clone(),
            approved: printed.clone(),
            released: printed,
        };
        assert!(matches!(
            VoucherLifecycle::undo_approve(released, 2),
            Err(VoucherError::InvalidTransition { from: VoucherStage::Released, .. })
        ));
    }

    #[test]
    fn test_entries_frozen_after_print() {
        assert!(VoucherLifecycle::ensure_entries_mutable(&VoucherState::Draft).is_ok());
        assert!(matches!(
            VoucherLifecycle::ensure_entries_mutable(&printed_at(Utc::now())),
            Err(VoucherError::EntriesFrozen { stage: VoucherStage::Printed })
        ));
    }

    #[rstest]
    #[case(VoucherStage::Draft, VoucherStage::Printed, true)]
    #[case(VoucherStage::Printed, VoucherStage::Approved, true)]
    #[case(VoucherStage::Approved, VoucherStage::Released, true)]
    #[case(VoucherStage::Printed, VoucherStage::Draft, true)]
    #[case(VoucherStage::Approved, VoucherStage::Printed, true)]
    #[case(VoucherStage::Draft, VoucherStage::Approved, false)]
    #[case(VoucherStage::Draft, VoucherStage::Released, false)]
    #[case(VoucherStage::Printed, VoucherStage::Released, false)]
    #[case(VoucherStage::Released, VoucherStage::Approved, false)]
    #[case(VoucherStage::Released, VoucherStage::Draft, false)]
    fn test_transition_table(#[case] from: VoucherStage, #[case] to: VoucherStage, #[case] valid: bool) {
        assert_eq!(VoucherLifecycle::is_valid_transition(from, to), valid);
    }
}

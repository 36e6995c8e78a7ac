//! Voucher lifecycle state.
//!
//! Journal vouchers and cash check vouchers share one state type: the stage
//! is the variant, the checkpoints reached so far are its data. A later
//! checkpoint cannot exist without the earlier ones by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coopledger_shared::types::{MediaId, UserId};

use crate::voucher::error::VoucherError;

/// Which document family a voucher belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherKind {
    /// Journal voucher.
    Journal,
    /// Cash check voucher.
    CashCheck,
}

impl std::fmt::Display for VoucherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Journal => f.write_str("journal voucher"),
            Self::CashCheck => f.write_str("cash check voucher"),
        }
    }
}

/// Lifecycle stage, without checkpoint data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStage {
    /// Being drafted; entries may change.
    Draft,
    /// Printed; entries are frozen.
    Printed,
    /// Approved by a signatory.
    Approved,
    /// Released and posted to the general ledger.
    Released,
}

impl VoucherStage {
    /// Returns the stage as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Printed => "printed",
            Self::Approved => "approved",
            Self::Released => "released",
        }
    }
}

impl std::fmt::Display for VoucherStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The person performing a lifecycle action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User id.
    pub user_id: UserId,
    /// Printed name.
    pub name: Option<String>,
    /// Printed position.
    pub position: Option<String>,
    /// Signature image reference.
    pub signature_media_id: Option<MediaId>,
}

impl Actor {
    /// An actor known only by id.
    #[must_use]
    pub const fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            name: None,
            position: None,
            signature_media_id: None,
        }
    }
}

/// Audit record of one lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Who performed the step.
    pub by: UserId,
    /// Their printed name.
    pub name: Option<String>,
    /// Their printed position.
    pub position: Option<String>,
    /// Their signature image.
    pub signature_media_id: Option<MediaId>,
    /// When the step happened.
    pub at: DateTime<Utc>,
}

impl Checkpoint {
    /// Stamps an actor at an instant.
    #[must_use]
    pub fn stamp(actor: &Actor, at: DateTime<Utc>) -> Self {
        Self {
            by: actor.user_id,
            name: actor.name.clone(),
            position: actor.position.clone(),
            signature_media_id: actor.signature_media_id,
            at,
        }
    }
}

/// Voucher lifecycle state with the checkpoints reached so far.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "lowercase")]
pub enum VoucherState {
    /// No checkpoint reached.
    #[default]
    Draft,
    /// Printed.
    Printed {
        /// Print checkpoint.
        printed: Checkpoint,
    },
    /// Printed and approved.
    Approved {
        /// Print checkpoint.
        printed: Checkpoint,
        /// Approval checkpoint.
        approved: Checkpoint,
    },
    /// Printed, approved and released.
    Released {
        /// Print checkpoint.
        printed: Checkpoint,
        /// Approval checkpoint.
        approved: Checkpoint,
        /// Release checkpoint.
        released: Checkpoint,
    },
}

impl VoucherState {
    /// Rebuilds the state from the three nullable checkpoint column groups.
    ///
    /// Fails when a later checkpoint exists without an earlier one, or when
    /// the timestamps go backwards.
    pub fn from_checkpoints(
        printed: Option<Checkpoint>,
        approved: Option<Checkpoint>,
        released: Option<Checkpoint>,
    ) -> Result<Self, VoucherError> {
        let state = match (printed, approved, released) {
            (None, None, None) => Self::Draft,
            (Some(printed), None, None) => Self::Printed { printed },
            (Some(printed), Some(approved), None) => Self::Approved { printed, approved },
            (Some(printed), Some(approved), Some(released)) => Self::Released {
                printed,
                approved,
                released,
            },
            (printed, approved, released) => {
                return Err(VoucherError::CorruptCheckpoints(format!(
                    "printed={}, approved={}, released={}",
                    printed.is_some(),
                    approved.is_some(),
                    released.is_some()
                )));
            }
        };
        state.check_order()?;
        Ok(state)
    }

    /// Splits the state back into the three nullable checkpoint groups.
    #[must_use]
    pub fn into_checkpoints(self) -> (Option<Checkpoint>, Option<Checkpoint>, Option<Checkpoint>) {
        match self {
            Self::Draft => (None, None, None),
            Self::Printed { printed } => (Some(printed), None, None),
            Self::Approved { printed, approved } => (Some(printed), Some(approved), None),
            Self::Released {
                printed,
                approved,
                released,
            } => (Some(printed), Some(approved), Some(released)),
        }
    }

    /// The stage of this state.
    #[must_use]
    pub const fn stage(&self) -> VoucherStage {
        match self {
            Self::Draft => VoucherStage::Draft,
            Self::Printed { .. } => VoucherStage::Printed,
            Self::Approved { .. } => VoucherStage::Approved,
            Self::Released { .. } => VoucherStage::Released,
        }
    }

    /// The print checkpoint, once reached.
    #[must_use]
    pub const fn printed(&self) -> Option<&Checkpoint> {
        match self {
            Self::Draft => None,
            Self::Printed { printed }
            | Self::Approved { printed, .. }
            | Self::Released { printed, .. } => Some(printed),
        }
    }

    /// The approval checkpoint, once reached.
    #[must_use]
    pub const fn approved(&self) -> Option<&Checkpoint> {
        match self {
            Self::Draft | Self::Printed { .. } => None,
            Self::Approved { approved, .. } | Self::Released { approved, .. } => Some(approved),
        }
    }

    /// The release checkpoint, once reached.
    #[must_use]
    pub const fn released(&self) -> Option<&Checkpoint> {
        match self {
            Self::Released { released, .. } => Some(released),
            _ => None,
        }
    }

    /// Entries may only change while nothing has been printed.
    #[must_use]
    pub const fn entries_mutable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    fn check_order(&self) -> Result<(), VoucherError> {
        let stamps = [self.printed(), self.approved(), self.released()];
        let mut previous: Option<DateTime<Utc>> = None;
        for checkpoint in stamps.into_iter().flatten() {
            if previous.is_some_and(|earlier| checkpoint.at < earlier) {
                return Err(VoucherError::CheckpointOutOfOrder);
            }
            previous = Some(checkpoint.at);
        }
        Ok(())
    }
}

/// Canonical status column of a cash check voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashCheckVoucherStatus {
    /// Not yet printed.
    Pending,
    /// Printed.
    Printed,
    /// Approved.
    Approved,
    /// Released.
    Released,
}

impl From<VoucherStage> for CashCheckVoucherStatus {
    fn from(stage: VoucherStage) -> Self {
        match stage {
            VoucherStage::Draft => Self::Pending,
            VoucherStage::Printed => Self::Printed,
            VoucherStage::Approved => Self::Approved,
            VoucherStage::Released => Self::Released,
        }
    }
}

impl From<CashCheckVoucherStatus> for VoucherStage {
    fn from(status: CashCheckVoucherStatus) -> Self {
        match status {
            CashCheckVoucherStatus::Pending => Self::Draft,
            CashCheckVoucherStatus::Printed => Self::Printed,
            CashCheckVoucherStatus::Approved => Self::Approved,
            CashCheckVoucherStatus::Released => Self::Released,
        }
    }
}

/// Header status of a journal voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalVoucherStatus {
    /// Not yet released.
    Draft,
    /// Released to the general ledger.
    Posted,
    /// Withdrawn before printing.
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn checkpoint(at: DateTime<Utc>) -> Checkpoint {
        Checkpoint::stamp(&Actor::user(UserId::new()), at)
    }

    #[test]
    fn test_from_checkpoints_builds_each_stage() {
        let t0 = Utc::now();
        let p = checkpoint(t0);
        let a = checkpoint(t0 + Duration::minutes(5));
        let r = checkpoint(t0 + Duration::minutes(10));

        assert_eq!(VoucherState::from_checkpoints(None, None, None).unwrap(), VoucherState::Draft);
        assert_eq!(
            VoucherState::from_checkpoints(Some(p.clone()), None, None).unwrap().stage(),
            VoucherStage::Printed
        );
        assert_eq!(
            VoucherState::from_checkpoints(Some(p.clone()), Some(a.clone()), None).unwrap().stage(),
            VoucherStage::Approved
        );
        let released = VoucherState::from_checkpoints(Some(p), Some(a), Some(r.clone())).unwrap();
        assert_eq!(released.stage(), VoucherStage::Released);
        assert_eq!(released.released(), Some(&r));
    }

    #[test]
    fn test_gap_in_checkpoints_is_corrupt() {
        let t0 = Utc::now();
        let err = VoucherState::from_checkpoints(None, Some(checkpoint(t0)), None).unwrap_err();
        assert!(matches!(err, VoucherError::CorruptCheckpoints(_)));

        let err =
            VoucherState::from_checkpoints(Some(checkpoint(t0)), None, Some(checkpoint(t0))).unwrap_err();
        assert!(matches!(err, VoucherError::CorruptCheckpoints(_)));
    }

    #[test]
    fn test_backwards_checkpoints_rejected() {
        let t0 = Utc::now();
        let err = VoucherState::from_checkpoints(
            Some(checkpoint(t0)),
            Some(checkpoint(t0 - Duration::seconds(1))),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, VoucherError::CheckpointOutOfOrder));
    }

    #[test]
    fn test_checkpoints_roundtrip() {
        let t0 = Utc::now();
        let state = VoucherState::Approved {
            printed: checkpoint(t0),
            approved: checkpoint(t0),
        };
        let (p, a, r) = state.clone().into_checkpoints();
        assert_eq!(VoucherState::from_checkpoints(p, a, r).unwrap(), state);
    }

    #[test]
    fn test_status_stage_mapping() {
        assert_eq!(CashCheckVoucherStatus::from(VoucherStage::Draft), CashCheckVoucherStatus::Pending);
        assert_eq!(VoucherStage::from(CashCheckVoucherStatus::Released), VoucherStage::Released);
    }

    #[test]
    fn test_only_draft_entries_mutable() {
        assert!(VoucherState::Draft.entries_mutable());
        assert!(!VoucherState::Printed { printed: checkpoint(Utc::now()) }.entries_mutable());
    }
}

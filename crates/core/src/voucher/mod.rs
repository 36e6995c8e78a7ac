//! Voucher lifecycle engine.
//!
//! Journal vouchers and cash check vouchers move through
//! `Draft → Printed → Approved → Released` under one state machine:
//! - `types` - the tagged state and its checkpoints
//! - `lifecycle` - transition rules
//! - `stage` - stage partition used by listings
//! - `signatory` - named signature slots

pub mod error;
pub mod lifecycle;
pub mod signatory;
pub mod stage;
pub mod types;

#[cfg(test)]
mod lifecycle_props;

pub use error::VoucherError;
pub use lifecycle::{Transition, VoucherLifecycle};
pub use signatory::{Signatories, Signatory, SignatoryRole};
pub use stage::{StageFilter, utc_day_window};
pub use types::{
    Actor, CashCheckVoucherStatus, Checkpoint, JournalVoucherStatus, VoucherKind, VoucherStage,
    VoucherState,
};

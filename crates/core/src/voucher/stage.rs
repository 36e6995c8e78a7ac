//! Partition of vouchers by lifecycle stage, as queried by operations staff.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::voucher::types::{VoucherStage, VoucherState};

/// Lifecycle stage filter for voucher listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageFilter {
    /// Nothing printed, approved or released.
    Draft,
    /// Printed but not approved.
    Printed,
    /// Approved but not released.
    Approved,
    /// Released at any time.
    Released,
    /// Released within the current UTC day.
    ReleasedToday,
}

impl StageFilter {
    /// The stage a voucher must be in to match.
    #[must_use]
    pub const fn stage(self) -> VoucherStage {
        match self {
            Self::Draft => VoucherStage::Draft,
            Self::Printed => VoucherStage::Printed,
            Self::Approved => VoucherStage::Approved,
            Self::Released | Self::ReleasedToday => VoucherStage::Released,
        }
    }

    /// Release window the filter additionally requires, if any.
    #[must_use]
    pub fn release_window(self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match self {
            Self::ReleasedToday => Some(utc_day_window(now)),
            Self::Draft | Self::Printed | Self::Approved | Self::Released => None,
        }
    }

    /// Returns true when `state` belongs to this partition at instant `now`.
    #[must_use]
    pub fn matches(self, state: &VoucherState, now: DateTime<Utc>) -> bool {
        if state.stage() != self.stage() {
            return false;
        }
        match (self.release_window(now), state.released()) {
            (Some((start, end)), Some(released)) => released.at >= start && released.at < end,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

/// `[startOfUTCDay, startOfUTCDay + 24h)` around `now`.
#[must_use]
pub fn utc_day_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::hours(24))
}

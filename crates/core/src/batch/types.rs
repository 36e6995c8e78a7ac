//! Transaction batch domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Reconciliation result of a batch: actual remittance compared to supposed remittance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceStatus {
    /// Actual and supposed remittance agree within tolerance.
    #[serde(rename = "balanced")]
    Balanced,
    /// More was remitted than the postings account for.
    #[serde(rename = "balance overage")]
    Overage,
    /// Less was remitted than the postings account for.
    #[serde(rename = "balance shortage")]
    Shortage,
}

impl BalanceStatus {
    /// Returns the stored string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Overage => "balance overage",
            Self::Shortage => "balance shortage",
        }
    }

    /// Parses a stored status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "balanced" => Some(Self::Balanced),
            "balance overage" => Some(Self::Overage),
            "balance shortage" => Some(Self::Shortage),
            _ => None,
        }
    }

    /// Classifies `actual - supposed` against a non-negative tolerance.
    #[must_use]
    pub fn classify(comparison: Decimal, tolerance: Decimal) -> Self {
        if comparison.abs() <= tolerance.abs() {
            Self::Balanced
        } else if comparison.is_sign_positive() {
            Self::Overage
        } else {
            Self::Shortage
        }
    }
}

impl fmt::Display for BalanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Supervisor view gate stored as the `(request_view, can_view)` column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewGate {
    /// Nobody asked for supervisor review yet.
    #[default]
    NotRequested,
    /// The employee asked; a supervisor has not answered.
    Requested,
    /// A supervisor granted visibility of the full totals.
    Granted,
}

impl ViewGate {
    /// Decodes the stored flag pair.
    ///
    /// `can_view` wins: a granted batch stays granted even if the request flag
    /// was never set.
    #[must_use]
    pub const fn from_flags(request_view: bool, can_view: bool) -> Self {
        match (request_view, can_view) {
            (_, true) => Self::Granted,
            (true, false) => Self::Requested,
            (false, false) => Self::NotRequested,
        }
    }

    /// Encodes the gate as `(request_view, can_view)`.
    #[must_use]
    pub const fn flags(self) -> (bool, bool) {
        match self {
            Self::NotRequested => (false, false),
            Self::Requested => (true, false),
            Self::Granted => (true, true),
        }
    }

    /// Returns true if the full totals may be shown to the employee.
    #[must_use]
    pub const fn shows_totals(self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Returns true if the batch is waiting on a supervisor.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Requested)
    }
}

/// Employee sign-off captured when a batch is closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSignOff {
    /// Employee name as printed on the batch.
    pub name: String,
    /// Employee position.
    pub position: String,
    /// Stored signature image.
    pub signature_media_id: Option<Uuid>,
}

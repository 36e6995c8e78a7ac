//! Tenancy boundary and soft-delete status.
//!
//! Every persisted record is owned by an `(organization, branch)` pair and is
//! never physically removed; deletion is a tombstone carried as a tagged variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{BranchId, OrganizationId, UserId};

/// The `(organization, branch)` pair every query and lock predicate is scoped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tenant {
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Owning branch.
    pub branch_id: BranchId,
}

impl Tenant {
    /// Creates a tenant scope.
    #[must_use]
    pub const fn new(organization_id: OrganizationId, branch_id: BranchId) -> Self {
        Self {
            organization_id,
            branch_id,
        }
    }
}

impl std::fmt::Display for Tenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.organization_id, self.branch_id)
    }
}

/// Soft-delete status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordStatus {
    /// The record is live.
    #[default]
    Active,
    /// The record carries a tombstone.
    Deleted {
        /// When the tombstone was written.
        at: DateTime<Utc>,
        /// Who wrote it, when known.
        by: Option<UserId>,
    },
}

impl RecordStatus {
    /// Decodes the `deleted_at` / `deleted_by` column pair.
    #[must_use]
    pub fn from_columns(deleted_at: Option<DateTime<Utc>>, deleted_by: Option<UserId>) -> Self {
        match deleted_at {
            Some(at) => Self::Deleted { at, by: deleted_by },
            None => Self::Active,
        }
    }

    /// Returns true when the record has not been soft-deleted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Encodes back into the `deleted_at` / `deleted_by` column pair.
    #[must_use]
    pub const fn into_columns(self) -> (Option<DateTime<Utc>>, Option<UserId>) {
        match self {
            Self::Active => (None, None),
            Self::Deleted { at, by } => (Some(at), by),
        }
    }
}

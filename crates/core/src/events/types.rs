//! Domain event payloads and their message-bus topics.

use coopledger_shared::types::{BranchId, OrganizationId, Tenant, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Entity kinds that emit lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// General ledger line.
    GeneralLedger,
    /// Account transaction header.
    AccountTransaction,
    /// Journal voucher.
    JournalVoucher,
    /// Cash/check voucher.
    CashCheckVoucher,
    /// Teller batch.
    TransactionBatch,
}

impl EntityKind {
    /// Topic segment for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeneralLedger => "general_ledger",
            Self::AccountTransaction => "account_transaction",
            Self::JournalVoucher => "journal_voucher",
            Self::CashCheckVoucher => "cash_check_voucher",
            Self::TransactionBatch => "transaction_batch",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The entity an event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity kind.
    pub kind: EntityKind,
    /// Entity id.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Owning branch.
    pub branch_id: BranchId,
    /// Acting user, when known.
    pub user_id: Option<UserId>,
}

impl EntityRef {
    /// Builds a reference inside a tenant.
    #[must_use]
    pub fn new(kind: EntityKind, id: impl Into<Uuid>, tenant: Tenant, user_id: Option<UserId>) -> Self {
        Self {
            kind,
            id: id.into(),
            organization_id: tenant.organization_id,
            branch_id: tenant.branch_id,
            user_id,
        }
    }
}

/// A committed change to a ledger, voucher or batch entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "entity", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Entity was created.
    Created(EntityRef),
    /// Entity was updated.
    Updated(EntityRef),
    /// Entity was soft-deleted.
    Deleted(EntityRef),
}

impl DomainEvent {
    /// The referenced entity.
    #[must_use]
    pub const fn entity(&self) -> &EntityRef {
        match self {
            Self::Created(entity) | Self::Updated(entity) | Self::Deleted(entity) => entity,
        }
    }

    /// Action segment of the topic.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Created(_) => "create",
            Self::Updated(_) => "update",
            Self::Deleted(_) => "delete",
        }
    }

    /// Topics this event is published on.
    ///
    /// `<entity>.<action>`, then the id, branch, organization and (when set)
    /// user scoped variants.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        let entity = self.entity();
        let base = format!("{}.{}", entity.kind, self.action());
        let mut topics = vec![
            base.clone(),
            format!("{base}.{}", entity.id),
            format!("{base}.branch.{}", entity.branch_id),
            format!("{base}.organization.{}", entity.organization_id),
        ];
        if let Some(user_id) = entity.user_id {
            topics.push(format!("{base}.user.{user_id}"));
        }
        topics
    }
}

//! Named signatory slots printed on vouchers and batch reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use coopledger_shared::types::MediaId;

/// The nine signature lines a document can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatoryRole {
    /// Approved by.
    Approved,
    /// Prepared by.
    Prepared,
    /// Certified by.
    Certified,
    /// Verified by.
    Verified,
    /// Checked by.
    Check,
    /// Acknowledged by.
    Acknowledge,
    /// Noted by.
    Noted,
    /// Posted by.
    Posted,
    /// Paid by.
    Paid,
}

/// Who signs a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signatory {
    /// Printed name.
    pub name: String,
    /// Printed position.
    pub position: Option<String>,
    /// Signature image reference.
    pub signature_media_id: Option<MediaId>,
}

/// The filled signatory slots of a document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signatories(BTreeMap<SignatoryRole, Signatory>);

impl Signatories {
    /// Fills or replaces a slot.
    pub fn assign(&mut self, role: SignatoryRole, signatory: Signatory) {
        self.0.insert(role, signatory);
    }

    /// Empties a slot.
    pub fn clear(&mut self, role: SignatoryRole) -> Option<Signatory> {
        self.0.remove(&role)
    }

    /// Reads a slot.
    #[must_use]
    pub fn get(&self, role: SignatoryRole) -> Option<&Signatory> {
        self.0.get(&role)
    }

    /// Filled slots in print order.
    pub fn iter(&self) -> impl Iterator<Item = (SignatoryRole, &Signatory)> {
        self.0.iter().map(|(role, signatory)| (*role, signatory))
    }

    /// Returns true when no slot is filled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

//! Supervisor view gate.
//!
//! An employee asks for review (`request_view`); only a supervisor action sets
//! `can_view`. A new request withdraws an earlier grant.

use uuid::Uuid;

use crate::batch::error::BatchError;
use crate::batch::types::ViewGate;

/// Stateless transitions of the view gate.
pub struct BatchView;

impl BatchView {
    /// Employee requests supervisor review of a batch.
    #[must_use]
    pub const fn request(_current: ViewGate) -> ViewGate {
        ViewGate::Requested
    }

    /// Supervisor grants visibility of a requested batch.
    pub fn grant(batch_id: Uuid, current: ViewGate) -> Result<ViewGate, BatchError> {
        match current {
            ViewGate::Requested | ViewGate::Granted => Ok(ViewGate::Granted),
            ViewGate::NotRequested => Err(BatchError::ViewNotRequested(batch_id)),
        }
    }
}

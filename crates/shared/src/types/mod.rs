//! Common types used across the application.

pub mod id;
pub mod money;
pub mod tenant;

pub use id::*;
pub use money::{Currency, amounts_equal, round_currency};
pub use tenant::{RecordStatus, Tenant};

//! Domain events emitted after ledger, voucher and batch writes commit.

pub mod error;
pub mod publisher;
pub mod types;

pub use error::EventError;
pub use publisher::{ChannelPublisher, EventPublisher, NoopPublisher, publish_all};
pub use types::{DomainEvent, EntityKind, EntityRef};

//! Event delivery errors.

use thiserror::Error;

/// Errors raised while handing an event to the relay.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    /// The relay channel is at capacity.
    #[error("Event channel is full, dropped {topic}")]
    ChannelFull {
        /// Base topic of the dropped event.
        topic: String,
    },

    /// The relay has shut down.
    #[error("Event channel is closed, dropped {topic}")]
    ChannelClosed {
        /// Base topic of the dropped event.
        topic: String,
    },

    /// The outer message bus rejected the event.
    #[error("Failed to deliver {topic}: {message}")]
    Delivery {
        /// Topic being delivered.
        topic: String,
        /// Bus error text.
        message: String,
    },
}

impl EventError {
    /// Returns the error code for logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ChannelFull { .. } => "EVENT_CHANNEL_FULL",
            Self::ChannelClosed { .. } => "EVENT_CHANNEL_CLOSED",
            Self::Delivery { .. } => "EVENT_DELIVERY_FAILED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::ChannelFull { .. } => 503,
            Self::ChannelClosed { .. } | Self::Delivery { .. } => 500,
        }
    }

    /// Returns true if delivery may succeed later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ChannelFull { .. } | Self::Delivery { .. })
    }
}

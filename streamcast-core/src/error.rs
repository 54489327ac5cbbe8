use streamcast_clients::ClientError;
use thiserror::Error;

use crate::models::{ContentType, TargetKind};

/// Core error taxonomy.
///
/// `Clone` so a single in-flight guide refresh can hand the same failure to
/// every coalesced caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Cannot cast {content} to a {target} target")]
    UnsupportedCombination {
        content: ContentType,
        target: TargetKind,
    },

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Dispatch failed (status {status}): {body}")]
    DispatchFailed { status: u16, body: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the caller may reasonably retry the same operation later
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Validation failures are raised before any external side effect
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Unauthorized(_)
                | Self::UnsupportedCombination { .. }
                | Self::InvalidInput(_)
        )
    }
}

impl From<ClientError> for Error {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unreachable(msg) | ClientError::Network(msg) => Self::Unavailable(msg),
            ClientError::Http { status, body, .. } => Self::DispatchFailed {
                status: status.as_u16(),
                body,
            },
            other => Self::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

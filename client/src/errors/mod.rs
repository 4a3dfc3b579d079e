//! Global client error types.
//!
//! Every fallible operation in the client returns a [`ClientError`]. The
//! variants mirror the stages a request can fail in (local validation, code
//! resolution, schema fetch, join submission, authentication, transport) so
//! that callers can decide what to show without inspecting raw HTTP state.

use thiserror::Error;

/// Errors raised by the client, from local validation up to the transport.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected before any network call was made.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The access code could not be mapped to a known session kind.
    #[error("{message}")]
    Resolution { message: String },

    /// The field schema for a resolved code could not be loaded.
    #[error("{message}")]
    SchemaFetch { message: String },

    /// The final join submission was rejected.
    #[error("{message}")]
    Join { message: String },

    /// The server answered 401; the stored token has already been cleared.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Any other non-success HTTP status.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// Connection, timeout or body decoding failure.
    #[error("Transport error: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    /// The persisted token could not be read or written.
    #[error("Token storage error: {message}")]
    Storage { message: String },

    /// An account, host or export call failed; `message` is ready to show.
    #[error("{message}")]
    Failed { message: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    // Helper constructors for common patterns

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn resolution(message: impl Into<String>) -> Self {
        Self::Resolution {
            message: message.into(),
        }
    }

    pub fn schema_fetch(message: impl Into<String>) -> Self {
        Self::SchemaFetch {
            message: message.into(),
        }
    }

    pub fn join(message: impl Into<String>) -> Self {
        Self::Join {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn api(status: u16, message: Option<String>) -> Self {
        Self::Api { status, message }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// The human-readable message supplied by the server or by local
    /// validation, if there is one.
    ///
    /// Transport failures never carry a displayable message.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Validation { message }
            | Self::Resolution { message }
            | Self::SchemaFetch { message }
            | Self::Join { message }
            | Self::Unauthorized { message }
            | Self::Failed { message } => Some(message.as_str()),
            Self::Api { message, .. } => message.as_deref(),
            Self::Transport { .. } | Self::Storage { .. } => None,
        }
    }

    /// Text safe to show an end user: the server message when present,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self.server_message() {
            Some(message) if !message.trim().is_empty() => message.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Re-labels a lower level failure as a resolution failure, keeping the
    /// server message or falling back to `fallback`.
    ///
    /// Local validation and 401s keep their own variant.
    pub fn into_resolution(self, fallback: &str) -> Self {
        match self {
            Self::Validation { .. } | Self::Unauthorized { .. } | Self::Resolution { .. } => self,
            other => Self::resolution(other.user_message(fallback)),
        }
    }

    pub fn into_schema_fetch(self, fallback: &str) -> Self {
        match self {
            Self::Validation { .. } | Self::Unauthorized { .. } | Self::SchemaFetch { .. } => self,
            other => Self::schema_fetch(other.user_message(fallback)),
        }
    }

    pub fn into_join(self, fallback: &str) -> Self {
        match self {
            Self::Validation { .. } | Self::Unauthorized { .. } | Self::Join { .. } => self,
            other => Self::join(other.user_message(fallback)),
        }
    }

    /// Settles the message of a failed account, host or export call.
    ///
    /// Local validation, 401s and already settled failures pass through.
    pub fn into_failure(self, fallback: &str) -> Self {
        match self {
            Self::Validation { .. } | Self::Unauthorized { .. } | Self::Failed { .. } => self,
            other => {
                tracing::debug!("Reporting {:?} as \"{}\"", other, fallback);
                Self::failed(other.user_message(fallback))
            }
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Flattens `validator` errors into one message, the same way every request
/// model in the client reports them.
pub fn validation_failure(errors: validator::ValidationErrors) -> ClientError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{}: Invalid value", field),
            })
        })
        .collect();
    messages.sort();

    ClientError::validation(messages.join(", "))
}

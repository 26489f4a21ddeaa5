//! Provider error types.

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthProviderError>;

/// Failure classes a host can branch on without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    MalformedPayload,
    InactiveAccount,
    Configuration,
    UnknownProvider,
    Cancelled,
}

#[derive(Debug, Error)]
pub enum AuthProviderError {
    /// The user-info request failed on the network or returned a non-2xx status.
    #[error("{}", transport_message(.status, .message))]
    Transport { status: Option<u16>, message: String },

    /// The user-info body is not the JSON shape the provider expects.
    #[error("Malformed user payload: {0}")]
    MalformedPayload(String),

    /// The account exists but the provider reports it as disabled.
    #[error("User account is marked as not active by provider '{provider}'")]
    InactiveAccount { provider: String },

    #[error("Invalid provider configuration: {0}")]
    Configuration(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("User info request was cancelled")]
    Cancelled,
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("User info request failed with HTTP {}: {}", status, message),
        None => format!("User info request failed: {}", message),
    }
}

impl AuthProviderError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn inactive(provider: impl Into<String>) -> Self {
        Self::InactiveAccount {
            provider: provider.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::MalformedPayload(_) => ErrorKind::MalformedPayload,
            Self::InactiveAccount { .. } => ErrorKind::InactiveAccount,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::UnknownProvider(_) => ErrorKind::UnknownProvider,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// True only for transport failures.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<serde_json::Error> for AuthProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}

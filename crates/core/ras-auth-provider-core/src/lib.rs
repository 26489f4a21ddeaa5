//! Core traits and types for pluggable OAuth2 identity providers.
//!
//! Every provider turns an already-acquired [`OAuth2Token`] into a normalized
//! [`AuthUser`] through the [`AuthProvider`] trait. Token acquisition and
//! provider registration live outside this crate.

mod error;
mod provider;
mod settings;
mod types;

pub use error::{AuthProviderError, AuthResult, ErrorKind};
pub use provider::AuthProvider;
pub use settings::ProviderSettings;
pub use types::{AuthUser, OAuth2Token, RawUser};

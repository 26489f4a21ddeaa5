//! OAuth2 identity providers normalizing user-info payloads into [`AuthUser`].
//!
//! Each provider composes a [`BaseProvider`] for its settings and the raw
//! user-info fetch, and supplies its own decoding, activity check and
//! [`UsernamePolicy`]. Token acquisition happens elsewhere; providers only
//! read the access and refresh tokens they are given.
//!
//! ```no_run
//! use ras_auth_providers::{AuthProvider, MailcowProvider, OAuth2Token};
//!
//! # async fn run() -> ras_auth_providers::AuthResult<()> {
//! let provider = MailcowProvider::from_config(
//!     &MailcowProvider::config_for_host("https://mail.example.com")
//!         .with_client("client-id", "client-secret"),
//! );
//!
//! let token = OAuth2Token::new("access-token").with_refresh_token("refresh-token");
//! let user = provider.fetch_auth_user(&token).await?;
//! println!("{} logged in as {:?}", user.id, user.username);
//! # Ok(())
//! # }
//! ```

mod base;
mod cancel;
mod config;
mod providers;
mod registry;
mod username;

#[cfg(test)]
mod tests;

pub use base::BaseProvider;
pub use cancel::fetch_auth_user_until_cancelled;
pub use self::config::{DEFAULT_ENV_PREFIX, ProviderConfig, ProvidersConfig};
pub use providers::{
    GiteaProvider, MailcowProvider, NAME_GITEA, NAME_MAILCOW, NAME_OIDC, OidcProvider,
};
pub use registry::{PROVIDER_NAMES, provider_by_name};
pub use username::UsernamePolicy;

// Re-export common types for convenience
pub use ras_auth_provider_core::{
    AuthProvider, AuthProviderError, AuthResult, AuthUser, ErrorKind, OAuth2Token,
    ProviderSettings, RawUser,
};

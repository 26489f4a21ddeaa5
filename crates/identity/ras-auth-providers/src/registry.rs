//! Provider lookup by name.

use crate::config::ProviderConfig;
use crate::providers::{
    GiteaProvider, MailcowProvider, NAME_GITEA, NAME_MAILCOW, NAME_OIDC, OidcProvider,
};
use ras_auth_provider_core::{AuthProvider, AuthProviderError, AuthResult};
use std::sync::Arc;
use tracing::debug;

/// Names accepted by [`provider_by_name`].
pub const PROVIDER_NAMES: &[&str] = &[NAME_GITEA, NAME_MAILCOW, NAME_OIDC];

/// Builds the provider registered under `name` with `config` applied over its defaults.
pub fn provider_by_name(name: &str, config: &ProviderConfig) -> AuthResult<Arc<dyn AuthProvider>> {
    let provider: Arc<dyn AuthProvider> = match name {
        NAME_MAILCOW => Arc::new(MailcowProvider::from_config(config)),
        NAME_GITEA => Arc::new(GiteaProvider::from_config(config)),
        NAME_OIDC => Arc::new(OidcProvider::from_config(config)),
        _ => return Err(AuthProviderError::UnknownProvider(name.to_string())),
    };

    debug!("Created provider {}", name);
    Ok(provider)
}

//! Provider configuration and its loading from files and the environment.
//!
//! Every field of [`ProviderConfig`] is optional: a value that is set replaces
//! the provider's compiled-in default, an unset value keeps it.
//!
//! Configuration is read from (highest precedence first):
//! - Environment variables, e.g. `RAS_AUTH__PROVIDERS__MAILCOW__CLIENT_ID`
//! - A TOML file with `[providers.<name>]` tables
//! - Provider defaults

use crate::registry::provider_by_name;
use ::config::{Config as ConfigBuilder, Environment, File, FileFormat};
use ras_auth_provider_core::{AuthProvider, AuthProviderError, AuthResult, ProviderSettings};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Default prefix for environment overrides.
pub const DEFAULT_ENV_PREFIX: &str = "RAS_AUTH";

/// Caller-supplied overrides for one provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub display_name: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_url: Option<String>,
    pub auth_url: Option<String>,
    pub token_url: Option<String>,
    pub user_info_url: Option<String>,
    /// Either a list or a single space/comma separated string.
    #[serde(deserialize_with = "deserialize_scopes")]
    pub scopes: Option<Vec<String>>,
    pub pkce: Option<bool>,
    /// Replaces the default extra parameters as a whole.
    pub extra: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Overlays the set values on `defaults`.
    pub fn apply(&self, defaults: ProviderSettings) -> ProviderSettings {
        let mut settings = defaults;
        override_with(&mut settings.display_name, &self.display_name);
        override_with(&mut settings.client_id, &self.client_id);
        override_with(&mut settings.client_secret, &self.client_secret);
        override_with(&mut settings.redirect_url, &self.redirect_url);
        override_with(&mut settings.auth_url, &self.auth_url);
        override_with(&mut settings.token_url, &self.token_url);
        override_with(&mut settings.user_info_url, &self.user_info_url);
        override_with(&mut settings.scopes, &self.scopes);
        override_with(&mut settings.pkce, &self.pkce);
        override_with(&mut settings.extra, &self.extra);
        settings
    }

    pub fn with_client(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_user_info_url(mut self, url: impl Into<String>) -> Self {
        self.user_info_url = Some(url.into());
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }
}

fn override_with<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

fn deserialize_scopes<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scopes {
        List(Vec<String>),
        Joined(String),
    }

    Ok(Option::<Scopes>::deserialize(deserializer)?.map(|scopes| match scopes {
        Scopes::List(list) => list,
        Scopes::Joined(joined) => joined
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
    }))
}

/// Configuration for every provider the host enables, keyed by provider name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub providers: HashMap<String, ProviderConfig>,
}

impl ProvidersConfig {
    /// Loads from an optional TOML file and `RAS_AUTH__...` environment variables.
    pub fn load(path: Option<&Path>) -> AuthResult<Self> {
        Self::load_with_env_prefix(path, DEFAULT_ENV_PREFIX)
    }

    pub fn load_with_env_prefix(path: Option<&Path>, env_prefix: &str) -> AuthResult<Self> {
        Self::load_with_environment(path, Environment::with_prefix(env_prefix))
    }

    fn load_with_environment(path: Option<&Path>, environment: Environment) -> AuthResult<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = path {
            debug!("Loading provider configuration from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(environment.prefix_separator("__").separator("__"));

        let config: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AuthProviderError::Configuration(e.to_string()))?;

        info!(
            "Loaded configuration for {} provider(s)",
            config.providers.len()
        );
        Ok(config)
    }

    pub fn from_toml_str(toml: &str) -> AuthResult<Self> {
        ConfigBuilder::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AuthProviderError::Configuration(e.to_string()))
    }

    pub fn add_provider(mut self, name: impl Into<String>, config: ProviderConfig) -> Self {
        self.providers.insert(name.into(), config);
        self
    }

    /// Overrides for `name`, empty when the provider is not configured.
    pub fn provider(&self, name: &str) -> ProviderConfig {
        self.providers.get(name).cloned().unwrap_or_default()
    }

    /// Instantiates every configured provider.
    pub fn build_providers(&self) -> AuthResult<HashMap<String, Arc<dyn AuthProvider>>> {
        self.providers
            .iter()
            .map(|(name, config)| Ok((name.clone(), provider_by_name(name, config)?)))
            .collect()
    }
}

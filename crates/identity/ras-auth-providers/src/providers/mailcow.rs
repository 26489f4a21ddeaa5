//! mailcow, a self-hosted mail server suite.
//!
//! The profile comes from mailcow's `/oauth/profile` endpoint. mailcow usernames
//! are mailbox addresses, so the username keeps only the local part.

use crate::base::{BaseProvider, null_as_default};
use crate::config::ProviderConfig;
use crate::username::UsernamePolicy;
use async_trait::async_trait;
use ras_auth_provider_core::{
    AuthProvider, AuthProviderError, AuthResult, AuthUser, OAuth2Token, ProviderSettings,
};
use serde::Deserialize;
use tracing::{debug, warn};

/// Unique name of the mailcow provider.
pub const NAME_MAILCOW: &str = "mailcow";

/// Value of `active` for a mailbox that may log in.
const ACTIVE_SENTINEL: i64 = 1;

/// Profile fields mailcow is known to emit. Missing or `null` fields take zero values.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MailcowProfile {
    #[serde(deserialize_with = "null_as_default")]
    #[allow(dead_code)]
    success: bool,
    #[serde(deserialize_with = "null_as_default")]
    username: String,
    #[serde(deserialize_with = "null_as_default")]
    id: String,
    #[serde(deserialize_with = "null_as_default")]
    #[allow(dead_code)]
    identifier: String,
    #[serde(deserialize_with = "null_as_default")]
    email: String,
    #[serde(deserialize_with = "null_as_default")]
    full_name: String,
    #[serde(rename = "displayName", deserialize_with = "null_as_default")]
    #[allow(dead_code)]
    display_name: String,
    #[serde(deserialize_with = "null_as_default")]
    #[allow(dead_code)]
    created: String,
    #[serde(deserialize_with = "null_as_default")]
    #[allow(dead_code)]
    modified: String,
    #[serde(deserialize_with = "null_as_default")]
    active: i64,
}

pub struct MailcowProvider {
    base: BaseProvider,
    username_policy: UsernamePolicy,
}

impl MailcowProvider {
    pub fn new() -> Self {
        Self {
            base: BaseProvider::new(Self::default_settings()),
            username_policy: UsernamePolicy::StripEmailDomain,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        let mut provider = Self::new();
        provider.base = provider.base.with_config(config);
        provider
    }

    /// Configuration pointing all three endpoints at a mailcow install
    /// (`/oauth/authorize`, `/oauth/token`, `/oauth/profile`).
    pub fn config_for_host(base_url: &str) -> ProviderConfig {
        let base_url = base_url.trim_end_matches('/');
        ProviderConfig {
            auth_url: Some(format!("{}/oauth/authorize", base_url)),
            token_url: Some(format!("{}/oauth/token", base_url)),
            user_info_url: Some(format!("{}/oauth/profile", base_url)),
            ..Default::default()
        }
    }

    /// Endpoints are left empty: every mailcow install lives on its own host.
    pub fn default_settings() -> ProviderSettings {
        ProviderSettings::new("mailcow").with_scopes(["profile"])
    }

    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.base = self.base.with_http_client(http_client);
        self
    }

    pub fn with_username_policy(mut self, policy: UsernamePolicy) -> Self {
        self.username_policy = policy;
        self
    }
}

impl Default for MailcowProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for MailcowProvider {
    fn name(&self) -> &str {
        NAME_MAILCOW
    }

    fn settings(&self) -> &ProviderSettings {
        self.base.settings()
    }

    async fn fetch_auth_user(&self, token: &OAuth2Token) -> AuthResult<AuthUser> {
        let data = self.base.fetch_raw_user_data(token).await?;
        let (raw_user, profile) = BaseProvider::decode_user_payload::<MailcowProfile>(&data)?;

        if profile.active != ACTIVE_SENTINEL {
            warn!(
                "Rejecting mailcow user {}: mailbox is not active (active = {})",
                profile.id, profile.active
            );
            return Err(AuthProviderError::inactive(NAME_MAILCOW));
        }

        if profile.id.is_empty() {
            return Err(AuthProviderError::MalformedPayload(
                "mailcow profile has no id".to_string(),
            ));
        }

        let user = AuthUser::new(profile.id, raw_user, token)
            .with_name(profile.full_name)
            .with_username(self.username_policy.apply(&profile.username))
            .with_email(profile.email);

        debug!("Normalized mailcow user {}", user.id);
        Ok(user)
    }
}

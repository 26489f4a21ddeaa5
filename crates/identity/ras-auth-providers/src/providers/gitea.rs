//! Gitea, a self-hosted Git forge. Defaults point at gitea.com.

use crate::base::{BaseProvider, null_as_default};
use crate::config::ProviderConfig;
use crate::username::UsernamePolicy;
use async_trait::async_trait;
use ras_auth_provider_core::{
    AuthProvider, AuthProviderError, AuthResult, AuthUser, OAuth2Token, ProviderSettings,
};
use serde::Deserialize;
use tracing::{debug, warn};

pub const NAME_GITEA: &str = "gitea";

fn default_true() -> bool {
    true
}

/// Subset of Gitea's `GET /api/v1/user` response.
#[derive(Debug, Deserialize)]
struct GiteaUser {
    id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    login: String,
    #[serde(default, deserialize_with = "null_as_default")]
    full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    avatar_url: String,
    /// Older Gitea releases omit this field.
    #[serde(default = "default_true")]
    active: bool,
    #[serde(default)]
    prohibit_login: bool,
}

pub struct GiteaProvider {
    base: BaseProvider,
    username_policy: UsernamePolicy,
}

impl GiteaProvider {
    pub fn new() -> Self {
        Self {
            base: BaseProvider::new(Self::default_settings()),
            username_policy: UsernamePolicy::Verbatim,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        let mut provider = Self::new();
        provider.base = provider.base.with_config(config);
        provider
    }

    pub fn default_settings() -> ProviderSettings {
        ProviderSettings::new("Gitea")
            .with_endpoints(
                "https://gitea.com/login/oauth/authorize",
                "https://gitea.com/login/oauth/access_token",
                "https://gitea.com/api/v1/user",
            )
            .with_scopes(["read:user", "user:email"])
            .with_pkce(true)
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

impl Default for GiteaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for GiteaProvider {
    fn name(&self) -> &str {
        NAME_GITEA
    }

    fn settings(&self) -> &ProviderSettings {
        self.base.settings()
    }

    async fn fetch_auth_user(&self, token: &OAuth2Token) -> AuthResult<AuthUser> {
        let data = self.base.fetch_raw_user_data(token).await?;
        let (raw_user, gitea_user) = BaseProvider::decode_user_payload::<GiteaUser>(&data)?;

        if !gitea_user.active || gitea_user.prohibit_login {
            warn!(
                "Rejecting Gitea user {}: active = {}, prohibit_login = {}",
                gitea_user.id, gitea_user.active, gitea_user.prohibit_login
            );
            return Err(AuthProviderError::inactive(NAME_GITEA));
        }

        let user = AuthUser::new(gitea_user.id.to_string(), raw_user, token)
            .with_name(gitea_user.full_name)
            .with_username(self.username_policy.apply(&gitea_user.login))
            .with_email(gitea_user.email)
            .with_avatar_url(gitea_user.avatar_url);

        debug!("Normalized Gitea user {}", user.id);
        Ok(user)
    }
}

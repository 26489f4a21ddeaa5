//! Generic OpenID Connect provider.
//!
//! Works with any issuer exposing a standard userinfo endpoint. There are no
//! compiled-in endpoints, so configuration must provide them.

use crate::base::{BaseProvider, null_as_default};
use crate::config::ProviderConfig;
use crate::username::UsernamePolicy;
use async_trait::async_trait;
use ras_auth_provider_core::{
    AuthProvider, AuthProviderError, AuthResult, AuthUser, OAuth2Token, ProviderSettings,
};
use serde::{Deserialize, Deserializer};
use tracing::debug;

pub const NAME_OIDC: &str = "oidc";

/// Standard OIDC userinfo claims. Missing or `null` claims take zero values.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OidcClaims {
    #[serde(deserialize_with = "null_as_default")]
    sub: String,
    #[serde(deserialize_with = "null_as_default")]
    name: String,
    #[serde(deserialize_with = "null_as_default")]
    preferred_username: String,
    #[serde(deserialize_with = "null_as_default")]
    email: String,
    #[serde(deserialize_with = "deserialize_flag")]
    email_verified: bool,
    #[serde(deserialize_with = "null_as_default")]
    picture: String,
}

/// Some issuers send boolean claims as the strings `"true"` and `"false"`.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(flag)) => flag,
        Some(Flag::Text(text)) => text.trim().eq_ignore_ascii_case("true"),
        None => false,
    })
}

pub struct OidcProvider {
    base: BaseProvider,
    username_policy: UsernamePolicy,
}

impl OidcProvider {
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
        ProviderSettings::new("OpenID Connect")
            .with_scopes(["openid", "profile", "email"])
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

impl Default for OidcProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for OidcProvider {
    fn name(&self) -> &str {
        NAME_OIDC
    }

    fn settings(&self) -> &ProviderSettings {
        self.base.settings()
    }

    /// Userinfo carries no account status, so every account with a `sub` is accepted.
    async fn fetch_auth_user(&self, token: &OAuth2Token) -> AuthResult<AuthUser> {
        let data = self.base.fetch_raw_user_data(token).await?;
        let (raw_user, claims) = BaseProvider::decode_user_payload::<OidcClaims>(&data)?;

        if claims.sub.is_empty() {
            return Err(AuthProviderError::MalformedPayload(
                "userinfo response has no sub claim".to_string(),
            ));
        }

        let mut user = AuthUser::new(claims.sub, raw_user, token)
            .with_name(claims.name)
            .with_username(self.username_policy.apply(&claims.preferred_username))
            .with_avatar_url(claims.picture);

        // Only verified addresses are exposed.
        if claims.email_verified {
            user = user.with_email(claims.email);
        }

        debug!(
            "Normalized OIDC user {} from {}",
            user.id,
            self.display_name()
        );
        Ok(user)
    }
}

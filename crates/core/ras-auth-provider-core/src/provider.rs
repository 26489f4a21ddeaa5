//! The capability every concrete provider implements.

use crate::error::AuthResult;
use crate::settings::ProviderSettings;
use crate::types::{AuthUser, OAuth2Token};
use async_trait::async_trait;
use std::collections::HashMap;

/// A third-party authorization server the host can authenticate users against.
///
/// Hosts only ever talk to this trait, so vendor quirks stay inside the
/// implementation of [`AuthProvider::fetch_auth_user`].
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Unique provider name, used as a registry key.
    fn name(&self) -> &str;

    fn settings(&self) -> &ProviderSettings;

    /// Fetches the profile behind `token` and normalizes it.
    async fn fetch_auth_user(&self, token: &OAuth2Token) -> AuthResult<AuthUser>;

    fn display_name(&self) -> &str {
        &self.settings().display_name
    }

    fn scopes(&self) -> &[String] {
        &self.settings().scopes
    }

    fn client_id(&self) -> &str {
        &self.settings().client_id
    }

    fn client_secret(&self) -> &str {
        &self.settings().client_secret
    }

    fn redirect_url(&self) -> &str {
        &self.settings().redirect_url
    }

    fn auth_url(&self) -> &str {
        &self.settings().auth_url
    }

    fn token_url(&self) -> &str {
        &self.settings().token_url
    }

    fn user_info_url(&self) -> &str {
        &self.settings().user_info_url
    }

    fn pkce(&self) -> bool {
        self.settings().pkce
    }

    fn extra(&self) -> &HashMap<String, String> {
        &self.settings().extra
    }
}

//! Shared provider state and the raw user-info fetch.

use crate::config::ProviderConfig;
use bytes::Bytes;
use ras_auth_provider_core::{
    AuthProviderError, AuthResult, OAuth2Token, ProviderSettings, RawUser,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::{debug, error};

/// Longest slice of an error body kept in a transport error.
const MAX_ERROR_BODY_LEN: usize = 512;

/// State and behavior every concrete provider embeds by composition.
#[derive(Debug, Clone)]
pub struct BaseProvider {
    settings: ProviderSettings,
    http_client: Client,
}

impl BaseProvider {
    /// Creates a base provider from the compiled-in defaults of a vendor.
    pub fn new(defaults: ProviderSettings) -> Self {
        Self {
            settings: defaults,
            http_client: Client::new(),
        }
    }

    /// Applies caller configuration on top of the current settings.
    pub fn with_config(mut self, config: &ProviderConfig) -> Self {
        self.settings = config.apply(self.settings);
        self
    }

    /// Uses the caller's HTTP client; its timeouts and proxies apply to every fetch.
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// GETs the configured user-info endpoint with the access token as bearer.
    ///
    /// The body is returned untouched; callers decode it.
    pub async fn fetch_raw_user_data(&self, token: &OAuth2Token) -> AuthResult<Bytes> {
        let url = &self.settings.user_info_url;
        if url.is_empty() {
            return Err(AuthProviderError::Configuration(format!(
                "User info endpoint not configured for {}",
                self.settings.display_name
            )));
        }

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&token.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!("User info request to {} failed: {}", url, e);
                AuthProviderError::transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut error_text = response.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut error_text, MAX_ERROR_BODY_LEN);
            error!("User info request failed with {}: {}", status, error_text);
            return Err(AuthProviderError::http_status(status.as_u16(), error_text));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthProviderError::transport(e.to_string()))?;

        debug!(
            "Fetched {} bytes of user info from {}",
            body.len(),
            self.settings.display_name
        );
        Ok(body)
    }

    /// Decodes a user-info body twice: once as an open mapping, once as `T`.
    ///
    /// The mapping keeps every field, including the ones `T` ignores.
    pub fn decode_user_payload<T: DeserializeOwned>(data: &[u8]) -> AuthResult<(RawUser, T)> {
        let raw_user: RawUser = serde_json::from_slice(data)?;
        let extracted: T = serde_json::from_slice(data)?;
        Ok((raw_user, extracted))
    }
}

/// Field deserializer treating an explicit JSON `null` like a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn truncate_at_char_boundary(text: &mut String, max_len: usize) {
    if text.len() <= max_len {
        return;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}

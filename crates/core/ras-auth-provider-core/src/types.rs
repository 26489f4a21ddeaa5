//! Normalized user and token types shared by every provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Decoded user-info payload, kept verbatim.
pub type RawUser = serde_json::Map<String, serde_json::Value>;

/// Token handed over by the authorization-code exchange.
///
/// Only `access_token`, `refresh_token` and `expiry` are read by providers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Token {
    pub access_token: String,
    pub token_type: Option<String>,
    pub refresh_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
}

impl OAuth2Token {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: Some("Bearer".to_string()),
            refresh_token: None,
            expiry: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

/// Identity record produced by any provider.
///
/// Only built after the provider's activity check passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Provider-assigned stable identifier, never empty.
    pub id: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub raw_user: RawUser,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
}

impl AuthUser {
    /// Starts a user from the provider id and raw payload, copying the token fields verbatim.
    pub fn new(id: impl Into<String>, raw_user: RawUser, token: &OAuth2Token) -> Self {
        Self {
            id: id.into(),
            name: None,
            username: None,
            email: None,
            avatar_url: None,
            raw_user,
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            expiry: token.expiry,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = non_empty(name.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = non_empty(username.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = non_empty(email.into());
        self
    }

    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = non_empty(avatar_url.into());
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

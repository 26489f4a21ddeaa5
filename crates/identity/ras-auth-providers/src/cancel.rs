//! Caller-driven cancellation of a user-info fetch.

use ras_auth_provider_core::{AuthProvider, AuthProviderError, AuthResult, AuthUser, OAuth2Token};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Runs [`AuthProvider::fetch_auth_user`] until it finishes or `cancel` fires.
///
/// Cancelling drops the in-flight request. No timeout is applied here; deadlines
/// come from the caller's token or HTTP client.
pub async fn fetch_auth_user_until_cancelled(
    provider: &dyn AuthProvider,
    token: &OAuth2Token,
    cancel: &CancellationToken,
) -> AuthResult<AuthUser> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            info!("User info request to {} cancelled", provider.name());
            Err(AuthProviderError::Cancelled)
        }
        result = provider.fetch_auth_user(token) => result,
    }
}

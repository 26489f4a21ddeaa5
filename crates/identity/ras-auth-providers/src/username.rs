//! Per-provider username derivation.

/// How a provider turns the vendor's raw username into [`AuthUser::username`].
///
/// [`AuthUser::username`]: ras_auth_provider_core::AuthUser::username
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UsernamePolicy {
    /// Keep the vendor username as is.
    #[default]
    Verbatim,
    /// Keep only the part before the first `@`, for vendors whose usernames are mail addresses.
    StripEmailDomain,
}

impl UsernamePolicy {
    pub fn apply(self, username: &str) -> String {
        match self {
            UsernamePolicy::Verbatim => username.to_string(),
            UsernamePolicy::StripEmailDomain => username
                .split_once('@')
                .map_or(username, |(local, _)| local)
                .to_string(),
        }
    }
}

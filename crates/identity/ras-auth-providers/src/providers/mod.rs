//! Concrete provider implementations.

mod gitea;
mod mailcow;
mod oidc;

pub use gitea::{GiteaProvider, NAME_GITEA};
pub use mailcow::{MailcowProvider, NAME_MAILCOW};
pub use oidc::{NAME_OIDC, OidcProvider};

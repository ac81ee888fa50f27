pub mod facebook;
pub mod google;
mod registry;

pub use facebook::FacebookProvider;
pub use google::GoogleProvider;
pub use registry::{IdentityProvider, IdentityProviders, OAuthIdentity, OAuthProviderId};

use crate::error::AppError;

/// Maps a failed profile lookup: a rejected token is the caller's fault, anything
/// else is ours.
pub(crate) fn profile_error(provider: OAuthProviderId, err: reqwest::Error) -> AppError {
    if err.status().is_some_and(|status| status.is_client_error()) {
        tracing::warn!(
            provider = provider.as_str(),
            error = %err,
            "provider rejected access token"
        );
        return AppError::unauthorized("Unauthorized");
    }
    AppError::internal(format!("{} profile lookup failed: {err}", provider.as_str()))
}

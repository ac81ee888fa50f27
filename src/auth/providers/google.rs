use async_trait::async_trait;
use serde::Deserialize;

use super::{IdentityProvider, OAuthIdentity, OAuthProviderId, profile_error};
use crate::error::AppError;

/// Resolves a Google access token through the OpenID userinfo endpoint.
pub struct GoogleProvider {
    client: reqwest::Client,
    profile_url: String,
}

#[derive(Debug, Deserialize)]
struct GoogleProfile {
    sub: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleProvider {
    pub fn new(client: reqwest::Client, profile_url: impl Into<String>) -> Self {
        Self {
            client,
            profile_url: profile_url.into(),
        }
    }
}

impl From<GoogleProfile> for OAuthIdentity {
    fn from(profile: GoogleProfile) -> Self {
        OAuthIdentity {
            provider: OAuthProviderId::Google,
            id: profile.sub,
            email: profile.email,
            name: profile.name,
            picture: profile.picture,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn id(&self) -> OAuthProviderId {
        OAuthProviderId::Google
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<OAuthIdentity, AppError> {
        let profile = self
            .client
            .get(&self.profile_url)
            .query(&[("access_token", access_token)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| profile_error(self.id(), err))?
            .json::<GoogleProfile>()
            .await
            .map_err(|err| profile_error(self.id(), err))?;

        Ok(profile.into())
    }
}

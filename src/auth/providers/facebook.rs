use async_trait::async_trait;
use serde::Deserialize;

use super::{IdentityProvider, OAuthIdentity, OAuthProviderId, profile_error};
use crate::error::AppError;

const PROFILE_FIELDS: &str = "id, name, email, picture";

/// Resolves a Facebook access token through the Graph `me` endpoint.
pub struct FacebookProvider {
    client: reqwest::Client,
    profile_url: String,
}

#[derive(Debug, Deserialize)]
struct FacebookProfile {
    id: String,
    email: String,
    name: Option<String>,
    picture: Option<FacebookPicture>,
}

#[derive(Debug, Deserialize)]
struct FacebookPicture {
    data: FacebookPictureData,
}

#[derive(Debug, Deserialize)]
struct FacebookPictureData {
    url: String,
}

impl FacebookProvider {
    pub fn new(client: reqwest::Client, profile_url: impl Into<String>) -> Self {
        Self {
            client,
            profile_url: profile_url.into(),
        }
    }
}

impl From<FacebookProfile> for OAuthIdentity {
    fn from(profile: FacebookProfile) -> Self {
        OAuthIdentity {
            provider: OAuthProviderId::Facebook,
            id: profile.id,
            email: profile.email,
            name: profile.name,
            picture: profile.picture.map(|picture| picture.data.url),
        }
    }
}

#[async_trait]
impl IdentityProvider for FacebookProvider {
    fn id(&self) -> OAuthProviderId {
        OAuthProviderId::Facebook
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<OAuthIdentity, AppError> {
        let profile = self
            .client
            .get(&self.profile_url)
            .query(&[("access_token", access_token), ("fields", PROFILE_FIELDS)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| profile_error(self.id(), err))?
            .json::<FacebookProfile>()
            .await
            .map_err(|err| profile_error(self.id(), err))?;

        Ok(profile.into())
    }
}

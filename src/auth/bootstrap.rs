use std::{sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    config::{AuthConfig, OAuthConfig},
    error::AppError,
    services::ServiceContext,
};

use super::providers::{FacebookProvider, GoogleProvider, IdentityProviders};

const PROFILE_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

pub fn build_identity_providers(cfg: &OAuthConfig) -> anyhow::Result<IdentityProviders> {
    let client = reqwest::Client::builder()
        .timeout(PROFILE_HTTP_TIMEOUT)
        .build()
        .context("failed building identity provider HTTP client")?;

    let providers = register_providers(&client, cfg).map_err(|err| anyhow::anyhow!("{err}"))?;
    Ok(providers)
}

fn register_providers(
    client: &reqwest::Client,
    cfg: &OAuthConfig,
) -> Result<IdentityProviders, AppError> {
    IdentityProviders::new()
        .with_provider(Arc::new(FacebookProvider::new(
            client.clone(),
            cfg.facebook_profile_url.clone(),
        )))?
        .with_provider(Arc::new(GoogleProvider::new(
            client.clone(),
            cfg.google_profile_url.clone(),
        )))
}

pub async fn seed_admin(cfg: &AuthConfig, services: &ServiceContext) -> anyhow::Result<()> {
    services.user().seed_admin(cfg).await
}

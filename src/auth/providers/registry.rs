use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{db::entities::user, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProviderId {
    Facebook,
    Google,
}

impl OAuthProviderId {
    pub fn as_str(self) -> &'static str {
        match self {
            OAuthProviderId::Facebook => "facebook",
            OAuthProviderId::Google => "google",
        }
    }

    /// Column holding this provider's account id on the user row.
    pub fn user_column(self) -> user::Column {
        match self {
            OAuthProviderId::Facebook => user::Column::FacebookId,
            OAuthProviderId::Google => user::Column::GoogleId,
        }
    }
}

/// Profile returned by an identity provider for a bearer access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthIdentity {
    pub provider: OAuthProviderId,
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn id(&self) -> OAuthProviderId;

    async fn fetch_identity(&self, access_token: &str) -> Result<OAuthIdentity, AppError>;
}

#[derive(Clone, Default)]
pub struct IdentityProviders {
    providers: HashMap<OAuthProviderId, Arc<dyn IdentityProvider>>,
}

impl IdentityProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Result<Self, AppError> {
        self.add(provider)?;
        Ok(self)
    }

    pub fn add(&mut self, provider: Arc<dyn IdentityProvider>) -> Result<(), AppError> {
        let id = provider.id();
        if self.providers.contains_key(&id) {
            return Err(AppError::conflict(format!(
                "Identity provider already registered: {}",
                id.as_str()
            )));
        }
        self.providers.insert(id, provider);
        Ok(())
    }

    pub fn get(&self, id: OAuthProviderId) -> Result<&dyn IdentityProvider, AppError> {
        self.providers
            .get(&id)
            .map(|provider| provider.as_ref())
            .ok_or_else(|| {
                AppError::internal(format!("Identity provider not configured: {}", id.as_str()))
            })
    }
}

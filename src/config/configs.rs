use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{defaults, envconfig::EnvConfig, validate};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub database: Option<DatabaseConfig>,
    pub auth: Option<AuthConfig>,
    pub oauth: OAuthConfig,
    pub email: Option<EmailConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }

    pub fn run_mode(&self) -> RunMode {
        self.general.run_mode
    }
}

impl EnvConfig for AppConfig {
    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    Test,
    #[default]
    Production,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Development => "development",
            RunMode::Test => "test",
            RunMode::Production => "production",
        }
    }

    /// Error envelopes carry the `stack` field only in this mode.
    pub fn exposes_error_detail(self) -> bool {
        matches!(self, RunMode::Development)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub host: String,
    pub port: u16,
    pub run_mode: RunMode,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT as u16,
            run_mode: RunMode::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub rust_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default)]
    pub test_url: Option<String>,
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_db_min_idle")]
    pub min_idle: u32,
}

impl DatabaseConfig {
    /// The connection URL for the given run mode. `test` prefers `test_url`.
    pub fn url_for(&self, mode: RunMode) -> &str {
        match (mode, self.test_url.as_deref()) {
            (RunMode::Test, Some(test_url)) => test_url,
            _ => self.url.as_str(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiration_minutes")]
    pub jwt_expiration_minutes: u32,
    pub admin_email: String,
    pub admin_password: String,
}

impl AuthConfig {
    pub fn access_ttl_secs(&self) -> usize {
        self.jwt_expiration_minutes as usize * 60
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OAuthConfig {
    pub facebook_profile_url: String,
    pub google_profile_url: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            facebook_profile_url: defaults::DEFAULT_FACEBOOK_PROFILE_URL.to_string(),
            google_profile_url: defaults::DEFAULT_GOOGLE_PROFILE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

fn default_db_max_connections() -> u32 {
    defaults::DEFAULT_DB_MAX_CONNECTIONS as u32
}

fn default_db_min_idle() -> u32 {
    defaults::DEFAULT_DB_MIN_IDLE as u32
}

fn default_jwt_expiration_minutes() -> u32 {
    defaults::DEFAULT_JWT_EXPIRATION_MINUTES as u32
}

fn default_smtp_port() -> u16 {
    defaults::DEFAULT_SMTP_PORT as u16
}

pub mod configs;
pub mod defaults;
pub mod envconfig;
pub mod validate;

pub use configs::{
    AppConfig, AuthConfig, DatabaseConfig, EmailConfig, GeneralConfig, LoggingConfig,
    OAuthConfig, RunMode,
};
pub use envconfig::EnvConfig;

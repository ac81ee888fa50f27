use std::path::{Path, PathBuf};

use ::config as config_rs;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Environment variable naming an optional TOML/YAML/JSON file layered under the
/// `APP_*` variables. Kept outside the `APP_` prefix so it is not read back as a field.
pub const CONFIG_FILE_VAR: &str = "ACCOUNT_SERVER_CONFIG";

pub trait EnvConfig: Sized + DeserializeOwned {
    const PREFIX: &'static str = "APP";
    const SEPARATOR: &'static str = "__";

    fn dotenv_candidates() -> Vec<PathBuf> {
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        vec![manifest_dir.join(".env"), PathBuf::from(".env")]
    }

    fn load_dotenv() {
        for candidate in Self::dotenv_candidates() {
            if dotenvy::from_path(&candidate).is_ok() {
                tracing::debug!(path = %candidate.display(), "loaded dotenv file");
                return;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn from_env() -> Result<Self> {
        Self::load_dotenv();

        let mut builder = config_rs::Config::builder();
        if let Ok(path) = std::env::var(CONFIG_FILE_VAR) {
            builder = builder.add_source(config_rs::File::with_name(&path).required(true));
        }

        let settings = builder
            .add_source(
                config_rs::Environment::with_prefix(Self::PREFIX)
                    .prefix_separator("_")
                    .separator(Self::SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration sources")?;

        let cfg = settings
            .try_deserialize::<Self>()
            .context("failed to deserialize environment into config")?;

        cfg.validate()?;
        Ok(cfg)
    }
}

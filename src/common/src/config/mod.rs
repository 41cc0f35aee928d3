use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

mod retention;

pub use retention::{ApplicationRetentionConfig, RetentionConfig, RetentionConfigError};

pub const DEFAULT_CONFIG_FILE: &str = "shelflife.toml";
pub const ENV_PREFIX: &str = "SHELFLIFE__";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
        }
    }
}

/// Configuration for the local version manifest
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON manifest holding registered versions
    pub manifest_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from(".data/manifest.json"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Configuration {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

impl Configuration {
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::figment(Toml::file(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Box<figment::Error>> {
        if !path.is_file() {
            return Err(Box::new(figment::Error::from(format!(
                "configuration file not found: {}",
                path.display()
            ))));
        }
        Self::figment(Toml::file_exact(path))
    }

    fn figment(file: figment::providers::Data<Toml>) -> Result<Self, Box<figment::Error>> {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }
}

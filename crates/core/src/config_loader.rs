use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/Parity.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from `config/Parity.toml` and `PARITY_` environment
    /// variables. Missing files fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads configuration from a specific TOML file plus the environment.
    ///
    /// Nested keys use `__`, e.g. `PARITY_ANALYSIS__USE_DIVIDENDS=true`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Self::figment(path).extract()?;
        config.analysis.validate()?;
        Ok(config)
    }

    /// Loads configuration with a profile overlay (`<stem>.<profile>.toml`).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_with_profile(path: &str, profile: &str) -> Result<AppConfig> {
        let overlay = match path.strip_suffix(".toml") {
            Some(stem) => format!("{stem}.{profile}.toml"),
            None => format!("{path}.{profile}"),
        };

        let config: AppConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Toml::file(overlay))
            .merge(Env::prefixed("PARITY_").split("__"))
            .extract()?;
        config.analysis.validate()?;
        Ok(config)
    }

    fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("PARITY_").split("__"))
    }
}

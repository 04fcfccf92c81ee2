use std::path::PathBuf;

use anyhow::{anyhow, Context};
use rates::{BASE_PLACEHOLDER, DEFAULT_RATES_ENDPOINT};
use url::Url;

use crate::generator::{RandomSource, DEFAULT_LENGTH, LENGTH_RANGE};

const APP_DIR_NAME: &str = "state_pipeline";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub rates_endpoint: String,
    pub store_url: String,
    pub random_source: RandomSource,
    pub password_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rates_endpoint: DEFAULT_RATES_ENDPOINT.into(),
            store_url: default_store_path().to_string_lossy().into_owned(),
            random_source: RandomSource::Secure,
            password_length: DEFAULT_LENGTH,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> anyhow::Result<()> {
        Url::parse(&self.rates_endpoint.replace(BASE_PLACEHOLDER, "USD"))
            .with_context(|| format!("invalid rates endpoint '{}'", self.rates_endpoint))?;
        if !LENGTH_RANGE.contains(&self.password_length) {
            return Err(anyhow!(
                "password length {} outside {}..={}",
                self.password_length,
                LENGTH_RANGE.start(),
                LENGTH_RANGE.end()
            ));
        }
        Ok(())
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|base| base.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./data"))
        .join("state.db")
}

pub fn load_settings() -> Settings {
    settings_from(|name| std::env::var(name).ok())
}

/// Builds settings from defaults overridden by `lookup`. `APP__` names win
/// over the plain ones; unparsable values are ignored.
pub fn settings_from(lookup: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Some(v) = lookup("RATES_ENDPOINT") {
        settings.rates_endpoint = v;
    }
    if let Some(v) = lookup("APP__RATES_ENDPOINT") {
        settings.rates_endpoint = v;
    }

    if let Some(v) = lookup("STORE_URL") {
        settings.store_url = v;
    }
    if let Some(v) = lookup("APP__STORE_URL") {
        settings.store_url = v;
    }

    if let Some(source) = lookup("APP__RANDOM_SOURCE").and_then(|v| RandomSource::parse(&v)) {
        settings.random_source = source;
    }

    if let Some(v) = lookup("APP__PASSWORD_LENGTH") {
        if let Ok(parsed) = v.trim().parse::<usize>() {
            settings.password_length = parsed;
        }
    }

    settings
}

//! Runtime configuration.
//!
//! Everything has a built-in default matching the portal's browser client, so
//! the config file is optional. A file only overrides what it names; its
//! `[headers]` table is merged over the default header set.

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "https://inpol.mazowieckie.pl/api/";
pub const DEFAULT_PORTAL_URL: &str = "https://inpol.mazowieckie.pl";

static BROWSER_HEADERS: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    [
        ("sec-ch-ua", "\"Chromium\";v=\"95\", \";Not A Brand\";v=\"99\""),
        ("Accept", "application/json, text/plain, */*"),
        ("Content-Type", "application/json"),
        ("sec-ch-ua-mobile", "?0"),
        (
            "User-Agent",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/95.0.4638.54 Safari/537.36",
        ),
        ("sec-ch-ua-platform", "\"Linux\""),
        ("Sec-Fetch-Site", "same-origin"),
        ("Sec-Fetch-Mode", "cors"),
        ("Sec-Fetch-Dest", "empty"),
        (
            "Accept-Language",
            "en-US,en;q=0.9,pl-PL;q=0.8,pl;q=0.7,be-BY;q=0.6,be;q=0.5,ru-RU;q=0.4,ru;q=0.3",
        ),
        ("Cookie", "cookieconsent_status=dismiss"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DelayConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayConfig {
    pub fn range(&self) -> RangeInclusive<u64> {
        self.min_ms..=self.max_ms
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        DelayConfig {
            min_ms: 100,
            max_ms: 1099,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the REST API; endpoint paths are joined onto it.
    pub base_url: Url,
    /// Public site root, used for the Origin and Referer headers.
    pub portal_url: String,
    pub delay: DelayConfig,
    pub headers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("Invalid DEFAULT_BASE_URL"),
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            delay: DelayConfig::default(),
            headers: BROWSER_HEADERS.clone(),
        }
    }
}

/// On-disk shape of the config file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_url: Option<String>,
    portal_url: Option<String>,
    delay: Option<DelayConfig>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Config::default().merge(file)
    }

    fn merge(mut self, file: ConfigFile) -> Result<Self, ConfigError> {
        if let Some(base_url) = file.base_url {
            // A base without a trailing slash would make `join` drop its last segment.
            let normalized = if base_url.ends_with('/') {
                base_url
            } else {
                format!("{}/", base_url)
            };
            self.base_url = Url::parse(&normalized).map_err(|e| ConfigError::InvalidValue {
                msg: format!("base_url {:?}: {}", normalized, e),
            })?;
        }
        if let Some(portal_url) = file.portal_url {
            self.portal_url = portal_url.trim_end_matches('/').to_string();
        }
        if let Some(delay) = file.delay {
            self.delay = delay;
        }
        self.headers.extend(file.headers);
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.delay.min_ms > self.delay.max_ms {
            return Err(ConfigError::InvalidValue {
                msg: format!(
                    "delay.min_ms ({}) is greater than delay.max_ms ({})",
                    self.delay.min_ms, self.delay.max_ms
                ),
            });
        }
        Ok(())
    }
}

/// Load the configuration, reading `path` when given and falling back to the defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        None => Ok(Config::default()),
        Some(path) => {
            let content =
                std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
                    path: path.to_path_buf(),
                    source,
                })?;
            Config::from_toml_str(&content)
        }
    }
}

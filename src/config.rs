use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::target::ProviderEndpoints;

const CONFIG_FILE_NAME: &str = "config.yaml";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PROVIDER_BASE_URL: &str = "https://vidsrc.to";
/// Resolved references are reused for 5 minutes
const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;
const DEFAULT_CATALOG_FILE: &str = "catalog.yaml";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DELAY_MIN_MS: u64 = 1000;
const DEFAULT_DELAY_MAX_MS: u64 = 3000;

const DEFAULT_USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
];

/// Outbound request shaping for provider page fetches
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScrapeConfig {
    /// Abandon a fetch after this many seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Lower bound of the random pre-fetch delay (inclusive)
    #[serde(default = "default_delay_min_ms")]
    pub delay_min_ms: u64,

    /// Upper bound of the random pre-fetch delay (exclusive)
    #[serde(default = "default_delay_max_ms")]
    pub delay_max_ms: u64,

    /// Client identities picked at random per fetch
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,

    /// Outbound proxy. Falls back to `OPT_PROXY` when unset.
    #[serde(default)]
    pub proxy: Option<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            delay_min_ms: DEFAULT_DELAY_MIN_MS,
            delay_max_ms: DEFAULT_DELAY_MAX_MS,
            user_agents: default_user_agents(),
            proxy: None,
        }
    }
}

impl ScrapeConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn delay_range(&self) -> std::ops::Range<Duration> {
        Duration::from_millis(self.delay_min_ms)..Duration::from_millis(self.delay_max_ms)
    }

    pub fn proxy(&self) -> Option<String> {
        self.proxy
            .clone()
            .or_else(|| std::env::var("OPT_PROXY").ok())
            .filter(|p| !p.is_empty())
    }
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_delay_min_ms() -> u64 {
    DEFAULT_DELAY_MIN_MS
}

fn default_delay_max_ms() -> u64 {
    DEFAULT_DELAY_MAX_MS
}

fn default_user_agents() -> Vec<String> {
    DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Provider site hosting the embed pages, e.g. `https://vidsrc.to`
    #[serde(default = "default_provider_base_url")]
    pub provider_base_url: String,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Catalog listing, relative to the config directory
    #[serde(default = "default_catalog_file")]
    pub catalog_file: String,

    #[serde(default)]
    pub scrape: ScrapeConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            provider_base_url: default_provider_base_url(),
            cache_ttl_secs: default_cache_ttl_secs(),
            catalog_file: default_catalog_file(),
            scrape: ScrapeConfig::default(),
            base_path: PathBuf::from("."),
        }
    }
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_provider_base_url() -> String {
    DEFAULT_PROVIDER_BASE_URL.to_string()
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_catalog_file() -> String {
    DEFAULT_CATALOG_FILE.to_string()
}

impl Config {
    fn validate(&self) -> anyhow::Result<()> {
        ProviderEndpoints::new(&self.provider_base_url)
            .with_context(|| format!("provider_base_url '{}'", self.provider_base_url))?;

        if self.cache_ttl_secs == 0 {
            bail!("cache_ttl_secs must be greater than 0");
        }

        let scrape = &self.scrape;
        if scrape.fetch_timeout_secs == 0 {
            bail!("scrape.fetch_timeout_secs must be greater than 0");
        }

        if scrape.delay_min_ms > scrape.delay_max_ms {
            bail!(
                "scrape.delay_min_ms ({}) must not exceed scrape.delay_max_ms ({})",
                scrape.delay_min_ms,
                scrape.delay_max_ms
            );
        }

        if scrape.user_agents.is_empty() {
            bail!("scrape.user_agents must contain at least one identity");
        }

        Ok(())
    }

    pub fn load_with(base_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let base_path = base_path.as_ref();
        let config_path = base_path.join(CONFIG_FILE_NAME);

        // create new if does not exist
        if !config_path.exists() {
            std::fs::create_dir_all(base_path)
                .with_context(|| format!("creating {}", base_path.display()))?;
            std::fs::write(&config_path, serde_yml::to_string(&Self::default())?)
                .with_context(|| format!("writing {}", config_path.display()))?;
            log::info!("created default config at {}", config_path.display());
        }

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let mut config: Self = serde_yml::from_str(&config_str)
            .with_context(|| format!("{} is malformed", config_path.display()))?;

        config.base_path = base_path.to_path_buf();
        config.scrape.user_agents.retain(|ua| !ua.trim().is_empty());

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = self.base_path.join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, serde_yml::to_string(&self)?)
            .with_context(|| format!("writing {}", config_path.display()))?;
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.base_path.join(&self.catalog_file)
    }
}

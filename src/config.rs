//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::retry::RetryPolicy;
use crate::sklavenitis::rendered::RenderWaits;
use crate::sklavenitis::scraper::{ScrapePolicy, TransportPolicy};
use crate::throttle::ThrottleState;
use crate::watch::cycle::NotifyPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Fetch retries after the initial attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff base between fetch attempts in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Minimum pause between watched pages in milliseconds
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Random jitter added to the pause (0 to this value)
    #[serde(default = "default_interval_jitter_ms")]
    pub interval_jitter_ms: u64,

    /// Transport choice when a renderer is available
    #[serde(default)]
    pub transport: TransportPolicy,

    /// Let lower-ranked price candidates rescue an unparsable winner
    #[serde(default)]
    pub price_fallthrough: bool,

    /// Rendered navigation budget in seconds
    #[serde(default = "default_nav_timeout_secs")]
    pub nav_timeout_secs: u64,

    /// Rendered price-readiness budget in seconds
    #[serde(default = "default_price_timeout_secs")]
    pub price_timeout_secs: u64,

    /// Post-scroll settle time in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// When the remembered price on a watch item advances
    #[serde(default)]
    pub notify_policy: NotifyPolicy,

    /// Telegram delivery settings
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

/// Credentials for the Telegram Bot API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("agora.db")
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_min_interval_ms() -> u64 {
    5000
}

fn default_interval_jitter_ms() -> u64 {
    2000
}

fn default_nav_timeout_secs() -> u64 {
    60
}

fn default_price_timeout_secs() -> u64 {
    15
}

fn default_settle_ms() -> u64 {
    2000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            proxy: None,
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            min_interval_ms: default_min_interval_ms(),
            interval_jitter_ms: default_interval_jitter_ms(),
            transport: TransportPolicy::default(),
            price_fallthrough: false,
            nav_timeout_secs: default_nav_timeout_secs(),
            price_timeout_secs: default_price_timeout_secs(),
            settle_ms: default_settle_ms(),
            format: OutputFormat::Table,
            notify_policy: NotifyPolicy::default(),
            telegram: None,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("agora-watch").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(db) = std::env::var("AGORA_DB") {
            self.db_path = PathBuf::from(db);
        }

        if let Ok(proxy) = std::env::var("AGORA_PROXY") {
            self.proxy = Some(proxy);
        }

        if let (Ok(bot_token), Ok(chat_id)) =
            (std::env::var("AGORA_TELEGRAM_TOKEN"), std::env::var("AGORA_TELEGRAM_CHAT"))
        {
            self.telegram = Some(TelegramConfig { bot_token, chat_id });
        }

        self
    }

    /// Scrape policy assembled from the flat settings.
    pub fn scrape_policy(&self) -> ScrapePolicy {
        ScrapePolicy {
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: Duration::from_millis(self.base_delay_ms),
            },
            transport: self.transport,
            price_fallthrough: self.price_fallthrough,
            render: self.render_waits(),
        }
    }

    /// Wait budgets for the rendered choreography.
    pub fn render_waits(&self) -> RenderWaits {
        RenderWaits {
            nav_timeout: Duration::from_secs(self.nav_timeout_secs),
            price_timeout: Duration::from_secs(self.price_timeout_secs),
            settle: Duration::from_millis(self.settle_ms),
        }
    }

    /// Request pacing seeded from the configured interval.
    pub fn throttle(&self) -> ThrottleState {
        ThrottleState::new(
            Duration::from_millis(self.min_interval_ms),
            Duration::from_millis(self.interval_jitter_ms),
        )
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use: table, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.db_path, PathBuf::from("agora.db"));
        assert!(config.proxy.is_none());
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, 1000);
        assert_eq!(config.min_interval_ms, 5000);
        assert_eq!(config.interval_jitter_ms, 2000);
        assert_eq!(config.transport, TransportPolicy::DirectFirst);
        assert!(!config.price_fallthrough);
        assert_eq!(config.nav_timeout_secs, 60);
        assert_eq!(config.price_timeout_secs, 15);
        assert_eq!(config.settle_ms, 2000);
        assert_eq!(config.format, OutputFormat::Table);
        assert_eq!(config.notify_policy, NotifyPolicy::OnNotify);
        assert!(config.telegram.is_none());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("TABLE".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);

        let err = "invalid".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
        assert!(err.contains("table, json"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            max_retries = 5
            min_interval_ms = 10000
            transport = "rendered-only"
            price_fallthrough = true
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.min_interval_ms, 10000);
        assert_eq!(config.transport, TransportPolicy::RenderedOnly);
        assert!(config.price_fallthrough);
        // Untouched settings keep their defaults
        assert_eq!(config.base_delay_ms, 1000);
    }

    #[test]
    fn test_config_from_toml_all_fields() {
        let toml = r#"
            db_path = "/var/lib/agora/watch.db"
            proxy = "socks5://localhost:1080"
            max_retries = 2
            base_delay_ms = 500
            min_interval_ms = 8000
            interval_jitter_ms = 1000
            transport = "direct-first"
            price_fallthrough = true
            nav_timeout_secs = 30
            price_timeout_secs = 10
            settle_ms = 1500
            format = "json"
            notify_policy = "always"

            [telegram]
            bot_token = "123:abc"
            chat_id = "42"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/agora/watch.db"));
        assert_eq!(config.proxy, Some("socks5://localhost:1080".to_string()));
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.base_delay_ms, 500);
        assert_eq!(config.min_interval_ms, 8000);
        assert_eq!(config.interval_jitter_ms, 1000);
        assert_eq!(config.transport, TransportPolicy::DirectFirst);
        assert!(config.price_fallthrough);
        assert_eq!(config.nav_timeout_secs, 30);
        assert_eq!(config.price_timeout_secs, 10);
        assert_eq!(config.settle_ms, 1500);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.notify_policy, NotifyPolicy::Always);
        assert_eq!(
            config.telegram,
            Some(TelegramConfig { bot_token: "123:abc".to_string(), chat_id: "42".to_string() })
        );
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            max_retries = 1
            settle_ms = 100
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.settle_ms, 100);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let result = Config::from_file(file.path());
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            transport = "rendered-only"
            "#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.transport, TransportPolicy::RenderedOnly);
    }

    #[test]
    fn test_config_with_env() {
        // Save original env vars
        let orig_db = std::env::var("AGORA_DB").ok();
        let orig_proxy = std::env::var("AGORA_PROXY").ok();
        let orig_token = std::env::var("AGORA_TELEGRAM_TOKEN").ok();
        let orig_chat = std::env::var("AGORA_TELEGRAM_CHAT").ok();

        // Set test env vars
        std::env::set_var("AGORA_DB", "/tmp/agora-test.db");
        std::env::set_var("AGORA_PROXY", "http://proxy:8080");
        std::env::set_var("AGORA_TELEGRAM_TOKEN", "123:abc");
        std::env::set_var("AGORA_TELEGRAM_CHAT", "42");

        let config = Config::new().with_env();
        assert_eq!(config.db_path, PathBuf::from("/tmp/agora-test.db"));
        assert_eq!(config.proxy, Some("http://proxy:8080".to_string()));
        assert_eq!(
            config.telegram,
            Some(TelegramConfig { bot_token: "123:abc".to_string(), chat_id: "42".to_string() })
        );

        // Restore original env vars
        match orig_db {
            Some(v) => std::env::set_var("AGORA_DB", v),
            None => std::env::remove_var("AGORA_DB"),
        }
        match orig_proxy {
            Some(v) => std::env::set_var("AGORA_PROXY", v),
            None => std::env::remove_var("AGORA_PROXY"),
        }
        match orig_token {
            Some(v) => std::env::set_var("AGORA_TELEGRAM_TOKEN", v),
            None => std::env::remove_var("AGORA_TELEGRAM_TOKEN"),
        }
        match orig_chat {
            Some(v) => std::env::set_var("AGORA_TELEGRAM_CHAT", v),
            None => std::env::remove_var("AGORA_TELEGRAM_CHAT"),
        }
    }

    #[test]
    fn test_scrape_policy_assembly() {
        let config = Config {
            max_retries: 2,
            base_delay_ms: 250,
            nav_timeout_secs: 30,
            settle_ms: 500,
            ..Config::default()
        };

        let policy = config.scrape_policy();
        assert_eq!(policy.retry.max_retries, 2);
        assert_eq!(policy.retry.base_delay, Duration::from_millis(250));
        assert_eq!(policy.render.nav_timeout, Duration::from_secs(30));
        assert_eq!(policy.render.settle, Duration::from_millis(500));
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            proxy: Some("socks5://localhost:1080".to_string()),
            max_retries: 2,
            transport: TransportPolicy::RenderedOnly,
            price_fallthrough: true,
            notify_policy: NotifyPolicy::Always,
            telegram: Some(TelegramConfig {
                bot_token: "123:abc".to_string(),
                chat_id: "42".to_string(),
            }),
            ..Config::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.proxy, config.proxy);
        assert_eq!(parsed.max_retries, config.max_retries);
        assert_eq!(parsed.transport, config.transport);
        assert_eq!(parsed.price_fallthrough, config.price_fallthrough);
        assert_eq!(parsed.notify_policy, config.notify_policy);
        assert_eq!(parsed.telegram, config.telegram);
    }
}

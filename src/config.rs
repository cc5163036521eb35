use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::collectors::CollectOptions;
use crate::dedup::DedupKey;
use crate::store::StoreBackend;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Where the record set is persisted: `csv` or `sqlite`
    pub store_backend: StoreBackend,

    /// Record file used by the CSV backend
    pub csv_path: PathBuf,

    /// SQLite connection URL used by the sqlite backend
    /// Format: sqlite://PATH?mode=rwc
    pub database_url: String,

    pub max_db_connections: u32,

    /// Fields that identify a posting when merging
    pub dedup_key: DedupKey,

    /// `site|keyword|location` list driving each harvest cycle
    pub sources_file: PathBuf,

    /// User agent for page requests; `impersonate` picks a browser agent
    pub user_agent: String,

    pub request_timeout: Duration,

    /// Fixed pause between two page requests of the same source
    pub page_delay: Duration,

    pub max_pages: u32,

    /// Also visit detail pages of postings that came without a description
    pub fetch_descriptions: bool,

    pub description_fetch_limit: usize,

    pub description_max_len: usize,

    /// Sleep between two harvest cycles
    /// Default: 4 hours
    pub cycle_interval: Duration,

    pub bind_addr: String,

    pub port: u16,

    /// Maximum payload size for all requests (in bytes)
    /// Default: 10MB (10 * 1024 * 1024)
    pub max_payload_size: usize,

    /// Directory for the rolling log files
    pub log_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Csv,
            csv_path: PathBuf::from("jobs.csv"),
            database_url: "sqlite://jobs.db?mode=rwc".to_string(),
            max_db_connections: 5,
            dedup_key: DedupKey::Link,
            sources_file: PathBuf::from("sources.txt"),
            user_agent: "Mozilla/5.0".to_string(),
            request_timeout: Duration::from_secs(30),
            page_delay: Duration::from_millis(2000),
            max_pages: 50,
            fetch_descriptions: false,
            description_fetch_limit: 10,
            description_max_len: 5000,
            cycle_interval: Duration::from_secs(4 * 60 * 60),
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            max_payload_size: 10 * 1024 * 1024,
            log_dir: "logs".to_string(),
        }
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset or unparsable
fn number_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    lookup(name)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn log_dir(lookup: &impl Fn(&str) -> Option<String>) -> String {
    lookup("LOG_DIR").unwrap_or_else(|| Config::default().log_dir)
}

fn flag_or(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: bool) -> bool {
    match lookup(name).map(|value| value.trim().to_ascii_lowercase()) {
        Some(value) if ["1", "true", "yes", "on"].contains(&value.as_str()) => true,
        Some(value) if ["0", "false", "no", "off"].contains(&value.as_str()) => false,
        _ => default,
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Every variable is optional; see `Config::default` for the fallbacks.
    /// Enumerated settings (STORE_BACKEND, DEDUP_KEY) must be valid when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Log directory alone, available even when the rest of the configuration is invalid
    pub fn log_dir_from_env() -> String {
        log_dir(&|name: &str| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let store_backend = match lookup("STORE_BACKEND") {
            Some(value) => value.parse::<StoreBackend>().map_err(|reason| ConfigError::Invalid {
                name: "STORE_BACKEND",
                reason,
            })?,
            None => defaults.store_backend,
        };

        let dedup_key = match lookup("DEDUP_KEY") {
            Some(value) => value.parse::<DedupKey>().map_err(|e| ConfigError::Invalid {
                name: "DEDUP_KEY",
                reason: e.to_string(),
            })?,
            None => defaults.dedup_key,
        };

        Ok(Config {
            store_backend,
            csv_path: lookup("CSV_PATH").map(PathBuf::from).unwrap_or(defaults.csv_path),
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            max_db_connections: number_or(&lookup, "MAX_DB_CONNECTIONS", defaults.max_db_connections),
            dedup_key,
            sources_file: lookup("SOURCES_FILE").map(PathBuf::from).unwrap_or(defaults.sources_file),
            user_agent: lookup("USER_AGENT").unwrap_or(defaults.user_agent),
            request_timeout: Duration::from_secs(number_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)),
            page_delay: Duration::from_millis(number_or(&lookup, "PAGE_DELAY_MS", 2000)),
            max_pages: number_or(&lookup, "MAX_PAGES", defaults.max_pages),
            fetch_descriptions: flag_or(&lookup, "FETCH_DESCRIPTIONS", defaults.fetch_descriptions),
            description_fetch_limit: number_or(&lookup, "DESCRIPTION_FETCH_LIMIT", defaults.description_fetch_limit),
            description_max_len: number_or(&lookup, "DESCRIPTION_MAX_LEN", defaults.description_max_len),
            cycle_interval: Duration::from_secs(number_or(&lookup, "CYCLE_INTERVAL_SECS", 4 * 60 * 60)),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: number_or(&lookup, "PORT", defaults.port),
            max_payload_size: number_or(&lookup, "MAX_PAYLOAD_SIZE", defaults.max_payload_size),
            log_dir: log_dir(&lookup),
        })
    }

    /// Collection knobs derived from this configuration
    pub fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            max_pages: self.max_pages,
            page_delay: self.page_delay,
            description_max_len: self.description_max_len,
            fetch_descriptions: self.fetch_descriptions,
            description_fetch_limit: self.description_fetch_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = from_vars(&[]).unwrap();

        assert_eq!(config.store_backend, StoreBackend::Csv);
        assert_eq!(config.csv_path, PathBuf::from("jobs.csv"));
        assert_eq!(config.dedup_key, DedupKey::Link);
        assert_eq!(config.cycle_interval, Duration::from_secs(14400));
        assert_eq!(config.page_delay, Duration::from_millis(2000));
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.description_max_len, 5000);
        assert!(!config.fetch_descriptions);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn reads_overrides() {
        let config = from_vars(&[
            ("STORE_BACKEND", "sqlite"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("DEDUP_KEY", "text+description"),
            ("MAX_PAGES", "5"),
            ("PAGE_DELAY_MS", "0"),
            ("FETCH_DESCRIPTIONS", "yes"),
            ("CYCLE_INTERVAL_SECS", "60"),
        ])
        .unwrap();

        assert_eq!(config.store_backend, StoreBackend::Sqlite);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.dedup_key, DedupKey::TextAndDescription);
        assert_eq!(config.max_pages, 5);
        assert!(config.page_delay.is_zero());
        assert!(config.fetch_descriptions);
        assert_eq!(config.cycle_interval, Duration::from_secs(60));
        assert_eq!(config.collect_options().max_pages, 5);
    }

    #[test]
    fn unparsable_numbers_fall_back() {
        let config = from_vars(&[("MAX_PAGES", "many"), ("PORT", "-1")]).unwrap();
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn log_dir_is_known_despite_invalid_settings() {
        let vars = [("STORE_BACKEND", "postgres"), ("LOG_DIR", "/var/log/harvester")];
        let lookup = |name: &str| vars.iter().find(|(k, _)| *k == name).map(|(_, v)| v.to_string());

        assert!(Config::from_lookup(lookup).is_err());
        assert_eq!(log_dir(&lookup), "/var/log/harvester");
        assert_eq!(log_dir(&|_: &str| None), "logs");
    }

    #[test]
    fn invalid_enumerations_are_errors() {
        assert!(matches!(
            from_vars(&[("STORE_BACKEND", "postgres")]),
            Err(ConfigError::Invalid { name: "STORE_BACKEND", .. })
        ));
        assert!(matches!(
            from_vars(&[("DEDUP_KEY", "title")]),
            Err(ConfigError::Invalid { name: "DEDUP_KEY", .. })
        ));
    }
}

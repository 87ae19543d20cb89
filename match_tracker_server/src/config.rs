use std::time::Duration;

use booking_tools::BookingConfig;
use log::*;
use match_tracker_engine::{
    constants::{
        DEFAULT_FULL_MATCH_SIZE,
        DEFAULT_MAX_CONCURRENT_FETCHES,
        DEFAULT_MIN_KNOWN_MEMBERS,
        DEFAULT_REPUBLISH_AFTER_MINS,
        DEFAULT_RESULT_WINDOW_HOURS,
    },
    ClubMatchPredicate,
    EngineOptions,
    FilterConfig,
};
use mt_common::{env_flag, env_or_default, Secret};

const DEFAULT_MT_HOST: &str = "127.0.0.1";
const DEFAULT_MT_PORT: u16 = 8470;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/match_tracker.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_INGESTION_INTERVAL_SECS: u64 = 300;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;
const DEFAULT_CHAT_USERNAME: &str = "Match Tracker";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub ingestion: IngestionConfig,
    /// Which matches count as club matches, and how many detail fetches may run at once.
    pub filter: FilterConfig,
    pub engine: EngineOptions,
    /// Capacity of each in-process event channel.
    pub event_buffer_size: usize,
    pub chat: ChatConfig,
    pub booking: BookingConfig,
}

#[derive(Clone, Debug)]
pub struct IngestionConfig {
    /// When false, the background worker is not started. Ingestion can still be triggered with `POST /ingest`.
    pub enabled: bool,
    pub interval: Duration,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self { enabled: true, interval: Duration::from_secs(DEFAULT_INGESTION_INTERVAL_SECS) }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ChatConfig {
    /// The incoming-webhook URL of the chat channel. If empty, notices are suppressed.
    pub webhook_url: Secret<String>,
    /// The name notices are posted under.
    pub username: String,
}

impl ChatConfig {
    pub fn from_env_or_default() -> Self {
        let webhook_url = Secret::from_env("MT_CHAT_WEBHOOK_URL");
        if webhook_url.is_empty() {
            warn!("🪛️ MT_CHAT_WEBHOOK_URL is not set. Booking and result notices will not be posted.");
        }
        let username = std::env::var("MT_CHAT_USERNAME").unwrap_or_else(|_| DEFAULT_CHAT_USERNAME.to_string());
        Self { webhook_url, username }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MT_HOST.to_string(),
            port: DEFAULT_MT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            ingestion: IngestionConfig::default(),
            filter: FilterConfig::default(),
            engine: EngineOptions::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            chat: ChatConfig::default(),
            booking: BookingConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = std::env::var("MT_HOST").ok().unwrap_or_else(|| DEFAULT_MT_HOST.into());
        let port = env_or_default("MT_PORT", DEFAULT_MT_PORT);
        let database_url = std::env::var("MT_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ MT_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let db_max_connections = env_or_default("MT_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let ingestion = IngestionConfig {
            enabled: env_flag("MT_INGESTION_ENABLED", true),
            interval: Duration::from_secs(
                env_or_default("MT_INGESTION_INTERVAL_SECS", DEFAULT_INGESTION_INTERVAL_SECS).max(1),
            ),
        };
        let filter = configure_filter();
        let dry_run = env_flag("MT_DRY_RUN", false);
        if dry_run {
            warn!("🪛️ Dry-run mode is on. Nothing will be published, persisted or posted to the chat.");
        }
        let result_window =
            chrono::Duration::hours(env_or_default("MT_RESULT_WINDOW_HOURS", DEFAULT_RESULT_WINDOW_HOURS));
        let republish_after = chrono::Duration::minutes(
            env_or_default("MT_REPUBLISH_AFTER_MINS", DEFAULT_REPUBLISH_AFTER_MINS).max(1),
        );
        let event_buffer_size = env_or_default("MT_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            ingestion,
            filter,
            engine: EngineOptions { dry_run, result_window, republish_after },
            event_buffer_size,
            chat: ChatConfig::from_env_or_default(),
            booking: BookingConfig::new_from_env_or_default(),
        }
    }
}

fn configure_filter() -> FilterConfig {
    let max_concurrent_fetches = env_or_default("MT_MAX_CONCURRENT_FETCHES", DEFAULT_MAX_CONCURRENT_FETCHES);
    let full_match_size = env_or_default("MT_FULL_MATCH_SIZE", DEFAULT_FULL_MATCH_SIZE);
    let mut min_known_members = env_or_default("MT_MIN_KNOWN_MEMBERS", DEFAULT_MIN_KNOWN_MEMBERS);
    if min_known_members > full_match_size {
        warn!(
            "🪛️ MT_MIN_KNOWN_MEMBERS ({min_known_members}) is larger than MT_FULL_MATCH_SIZE ({full_match_size}). Full \
             matches would never be accepted, so {full_match_size} is used instead."
        );
        min_known_members = full_match_size;
    }
    if max_concurrent_fetches == 0 {
        warn!("🪛️ MT_MAX_CONCURRENT_FETCHES cannot be zero. Fetching one match at a time.");
    }
    FilterConfig {
        max_concurrent_fetches: max_concurrent_fetches.max(1),
        predicate: ClubMatchPredicate { full_match_size, min_known_members },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8470);
        assert_eq!(config.filter.predicate.min_known_members, 4);
        assert_eq!(config.filter.max_concurrent_fetches, 50);
        assert!(!config.engine.dry_run);
        assert!(config.ingestion.enabled);
        assert_eq!(config.ingestion.interval, Duration::from_secs(300));
        assert_eq!(config.engine.republish_after, chrono::Duration::minutes(60));
    }

    #[test]
    fn new_keeps_the_other_defaults() {
        let config = ServerConfig::new("0.0.0.0", 9000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
    }
}

use chrono::Duration;
use log::*;
use mt_common::{env_list, env_or_default, Secret};

const DEFAULT_API_URL: &str = "https://api.booking.example.com";
const DEFAULT_LOOKBACK_DAYS: i64 = 2;
const DEFAULT_LOOKAHEAD_DAYS: i64 = 7;
const DEFAULT_PAGE_SIZE: usize = 200;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Base URL of the booking platform API, without a trailing slash.
    pub api_url: String,
    pub api_token: Secret<String>,
    /// The venues (tenants) whose matches are listed.
    pub tenant_ids: Vec<String>,
    /// How far into the past the match listing reaches. Matches that finished within this window still need their
    /// results processed.
    pub lookback: Duration,
    /// How far into the future the match listing reaches.
    pub lookahead: Duration,
    pub page_size: usize,
    pub timeout_secs: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: Secret::default(),
            tenant_ids: Vec::new(),
            lookback: Duration::days(DEFAULT_LOOKBACK_DAYS),
            lookahead: Duration::days(DEFAULT_LOOKAHEAD_DAYS),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl BookingConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("MT_BOOKING_API_URL").unwrap_or_else(|_| {
            warn!("MT_BOOKING_API_URL not set, using (probably useless) default");
            DEFAULT_API_URL.to_string()
        });
        let api_token = Secret::from_env("MT_BOOKING_API_TOKEN");
        if api_token.is_empty() {
            warn!("MT_BOOKING_API_TOKEN not set. Requests to the booking platform will be unauthenticated");
        }
        let tenant_ids = env_list("MT_BOOKING_TENANT_IDS");
        if tenant_ids.is_empty() {
            warn!("MT_BOOKING_TENANT_IDS is empty. No matches will be listed.");
        }
        let lookback = Duration::days(env_or_default("MT_BOOKING_LOOKBACK_DAYS", DEFAULT_LOOKBACK_DAYS));
        let lookahead = Duration::days(env_or_default("MT_BOOKING_LOOKAHEAD_DAYS", DEFAULT_LOOKAHEAD_DAYS));
        let page_size = env_or_default("MT_BOOKING_PAGE_SIZE", DEFAULT_PAGE_SIZE);
        let timeout_secs = env_or_default("MT_BOOKING_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token,
            tenant_ids,
            lookback,
            lookahead,
            page_size,
            timeout_secs,
        }
    }
}

use std::{path::PathBuf, time::Duration};

use log::warn;

use crate::poller::DEFAULT_POLL_INTERVAL;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(20);
const PREFERENCES_FILE: &str = "preferences.json";

/// Runtime configuration, read from `MARKETPLACE_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    /// Bearer token of the signed-in user; no token means no polling.
    pub token: Option<String>,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub data_dir: PathBuf,
    pub debug: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base_url = lookup("MARKETPLACE_API_URL")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let token = lookup("MARKETPLACE_TOKEN")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let poll_interval = seconds(&lookup, "MARKETPLACE_POLL_SECS", DEFAULT_POLL_INTERVAL);
        let http_timeout = seconds(&lookup, "MARKETPLACE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT);

        let data_dir = lookup("MARKETPLACE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let debug = lookup("MARKETPLACE_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            api_base_url,
            token,
            poll_interval,
            http_timeout,
            data_dir,
            debug,
        }
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(PREFERENCES_FILE)
    }
}

fn seconds(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: Duration) -> Duration {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!("Ignoring invalid {key}={raw:?}; using {}s", default.as_secs());
                default
            }
        },
    }
}

fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    PathBuf::from(home).join(".marketplace-notifier")
}

use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime settings for the view core. Every field has a default so the core
/// runs against a local node with no configuration at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Config {
    /// Reads `CHAINVIEW_API_URL`, `CHAINVIEW_POLL_INTERVAL_MS` and
    /// `CHAINVIEW_REQUEST_TIMEOUT_MS`, falling back to defaults for anything
    /// unset or unparseable.
    pub fn from_env() -> Self {
        let api_base_url =
            env::var("CHAINVIEW_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let poll_interval = duration_from_env("CHAINVIEW_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL);
        let request_timeout =
            duration_from_env("CHAINVIEW_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT);

        Self {
            api_base_url,
            poll_interval,
            request_timeout,
        }
    }
}

fn duration_from_env(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

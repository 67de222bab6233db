use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config::from_env()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub search_api_url: String,
    pub check_api_url: String,
    pub bind_addr: String,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            search_api_url: get_env_or_default("SEARCH_API_URL", "http://127.0.0.1:8888"),
            check_api_url: get_env_or_default(
                "CHECK_API_URL",
                "http://127.0.0.1/api/v1/links/check",
            ),
            bind_addr: get_env_or_default("BIND_ADDR", "0.0.0.0:1566"),
            request_timeout_secs: get_env_parsed_or_default("REQUEST_TIMEOUT_SECS", 60),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed_or_default(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("invalid value {raw:?} for {key}, using {default}");
            default
        }),
        Err(_) => default,
    }
}

use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub insights: InsightsConfig,
    pub geocoding: GeocodingConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Upstream location-intelligence API (search, demographics, heatmap).
#[derive(Debug, Clone, Deserialize)]
pub struct InsightsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Per-call transport timeout for demographic lookups.
    pub timeout_secs: u64,
    /// Blanket throttle applied before every demographics call.
    pub pre_call_delay_ms: u64,
    /// Backoff before the single rate-limit retry.
    pub rate_limit_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Path of the JSON cache document. None disables persistence (in-memory only).
    pub path: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: parse_env_or("PULSE_HOST", "0.0.0.0".to_string()),
                port: parse_env_or("PULSE_PORT", 3400),
            },
            insights: InsightsConfig {
                base_url: parse_env_or(
                    "PULSE_INSIGHTS_URL",
                    "https://hackathon.api.qloo.com".to_string(),
                ),
                api_key: parse_env_opt("PULSE_INSIGHTS_API_KEY"),
                timeout_secs: parse_env_or("PULSE_INSIGHTS_TIMEOUT_SECS", 10),
                pre_call_delay_ms: parse_env_or("PULSE_DEMOGRAPHICS_DELAY_MS", 100),
                rate_limit_backoff_ms: parse_env_or("PULSE_RATE_LIMIT_BACKOFF_MS", 2000),
            },
            geocoding: GeocodingConfig {
                base_url: parse_env_or(
                    "PULSE_GEOCODING_URL",
                    "https://nominatim.openstreetmap.org".to_string(),
                ),
                timeout_secs: parse_env_or("PULSE_GEOCODING_TIMEOUT_SECS", 10),
            },
            cache: CacheConfig {
                path: parse_env_opt("PULSE_CACHE_PATH"),
            },
        }
    }
}

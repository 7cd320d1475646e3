//! Environment-driven settings, loaded once at startup and passed into the
//! fetcher and resolver constructors.

use crate::error::{Error, Result};
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_MAX_DERIVATION_DEPTH: usize = 5;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_timeout: Duration,
    pub cache_ttl: Duration,
    pub max_derivation_depth: usize,
    pub destatis: Option<DestatisCredentials>,
    pub endpoints: Endpoints,
}

/// Username/password pair for the GENESIS web service.
#[derive(Debug, Clone)]
pub struct DestatisCredentials {
    pub username: String,
    pub password: SecretString,
}

impl DestatisCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Base URLs of the upstream services. Overridable so tests can point at a local server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub oecd: String,
    pub destatis: String,
    pub eurostat: String,
    pub ecb: String,
    pub bundesbank: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            oecd: "https://stats.oecd.org/SDMX-JSON/data".to_string(),
            destatis: "https://www-genesis.destatis.de/genesisWS/rest/2020".to_string(),
            eurostat: "https://ec.europa.eu/eurostat/api/dissemination/statistics/1.0/data".to_string(),
            ecb: "https://data-api.ecb.europa.eu/service/data".to_string(),
            bundesbank: "https://api.statistiken.bundesbank.de/rest/data".to_string(),
        }
    }
}

impl Endpoints {
    /// Every source served from one base URL (mock servers in tests).
    pub fn all(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            oecd: format!("{}/oecd", base),
            destatis: format!("{}/destatis", base),
            eurostat: format!("{}/eurostat", base),
            ecb: format!("{}/ecb", base),
            bundesbank: format!("{}/bundesbank", base),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            max_derivation_depth: DEFAULT_MAX_DERIVATION_DEPTH,
            destatis: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl AppConfig {
    /// Load from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let destatis = match (
            std::env::var("DESTATIS_USERNAME").ok(),
            std::env::var("DESTATIS_PASSWORD").ok(),
        ) {
            (Some(user), Some(pass)) if !user.trim().is_empty() => {
                Some(DestatisCredentials::new(user.trim(), pass))
            }
            (Some(_), None) => {
                return Err(Error::Settings(
                    "DESTATIS_USERNAME is set but DESTATIS_PASSWORD is missing".to_string(),
                ))
            }
            _ => None,
        };

        let max_derivation_depth = env_var_parse("MAX_DERIVATION_DEPTH", DEFAULT_MAX_DERIVATION_DEPTH);
        if max_derivation_depth == 0 {
            return Err(Error::Settings("MAX_DERIVATION_DEPTH must be at least 1".to_string()));
        }

        let defaults = Endpoints::default();
        Ok(Self {
            http_timeout: Duration::from_secs(env_var_parse("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)),
            cache_ttl: Duration::from_secs(env_var_parse("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)),
            max_derivation_depth,
            destatis,
            endpoints: Endpoints {
                oecd: env_var_or("OECD_BASE_URL", defaults.oecd),
                destatis: env_var_or("DESTATIS_BASE_URL", defaults.destatis),
                eurostat: env_var_or("EUROSTAT_BASE_URL", defaults.eurostat),
                ecb: env_var_or("ECB_BASE_URL", defaults.ecb),
                bundesbank: env_var_or("BUNDESBANK_BASE_URL", defaults.bundesbank),
            },
        })
    }
}

/// Parse an env var, falling back to `default` when unset or malformed.
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_var_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .unwrap_or(default)
}

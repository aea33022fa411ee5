use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use ipnet::IpNet;
use pennywise_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

const MIN_ACCESS_TOKEN_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitStoreConfig {
    Memory,
    Redis { redis_url: String },
    Postgres { database_url: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: String,
    pub access_token: String,
    pub auth_username: String,
    pub auth_password: String,
    pub rate_limit_store: RateLimitStoreConfig,
    pub trusted_proxies: Vec<IpNet>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        Url::parse(&frontend_url)
            .map_err(|error| AppError::Validation(format!("invalid FRONTEND_URL: {error}")))?;

        let access_token = required_non_empty_env("API_ACCESS_TOKEN")?;
        if access_token.len() < MIN_ACCESS_TOKEN_LENGTH {
            return Err(AppError::Validation(format!(
                "API_ACCESS_TOKEN must be at least {MIN_ACCESS_TOKEN_LENGTH} characters"
            )));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let rate_limit_store = match env::var("RATE_LIMIT_STORE")
            .unwrap_or_else(|_| "memory".to_owned())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => RateLimitStoreConfig::Memory,
            "redis" => RateLimitStoreConfig::Redis {
                redis_url: required_non_empty_env("REDIS_URL")?,
            },
            "postgres" => RateLimitStoreConfig::Postgres {
                database_url: required_non_empty_env("DATABASE_URL")?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "RATE_LIMIT_STORE must be 'memory', 'redis' or 'postgres', got '{other}'"
                )));
            }
        };

        Ok(Self {
            api_host,
            api_port,
            frontend_url,
            access_token,
            auth_username: required_non_empty_env("AUTH_USERNAME")?,
            auth_password: required_non_empty_env("AUTH_PASSWORD")?,
            rate_limit_store,
            trusted_proxies: parse_trusted_proxies(
                env::var("TRUSTED_PROXIES").unwrap_or_default().as_str(),
            )?,
        })
    }

    /// Store name for logs; connection strings stay out of them.
    pub fn rate_limit_store_kind(&self) -> &'static str {
        match self.rate_limit_store {
            RateLimitStoreConfig::Memory => "memory",
            RateLimitStoreConfig::Redis { .. } => "redis",
            RateLimitStoreConfig::Postgres { .. } => "postgres",
        }
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

/// Parses a comma-separated list of proxy networks. Bare addresses are
/// treated as single-host networks.
pub fn parse_trusted_proxies(value: &str) -> Result<Vec<IpNet>, AppError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse::<IpNet>()
                .or_else(|_| entry.parse::<IpAddr>().map(IpNet::from))
                .map_err(|error| {
                    AppError::Validation(format!(
                        "invalid TRUSTED_PROXIES entry '{entry}': {error}"
                    ))
                })
        })
        .collect()
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

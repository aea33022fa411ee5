use std::env;
use std::path::PathBuf;
use std::time::Duration;

use pennywise_core::{AppError, AppResult};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: Url,
    pub access_token: Option<String>,
    pub offline_queue_path: PathBuf,
    pub probe_interval: Duration,
    pub http_timeout: Duration,
}

impl ClientConfig {
    pub fn load() -> AppResult<Self> {
        let api_base_url = parse_base_url(required_env("API_BASE_URL")?.as_str())?;
        let access_token = env::var("API_ACCESS_TOKEN")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        let offline_queue_path = env::var("OFFLINE_QUEUE_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "pennywise-offline-queue.json".to_owned());
        let probe_interval_ms = parse_env_u64("CONNECTIVITY_PROBE_INTERVAL_MS", 5000)?;
        let http_timeout_seconds = parse_env_u64("HTTP_TIMEOUT_SECONDS", 15)?;

        if probe_interval_ms == 0 {
            return Err(AppError::Validation(
                "CONNECTIVITY_PROBE_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        if http_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "HTTP_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            api_base_url,
            access_token,
            offline_queue_path: PathBuf::from(offline_queue_path),
            probe_interval: Duration::from_millis(probe_interval_ms),
            http_timeout: Duration::from_secs(http_timeout_seconds),
        })
    }

    pub fn health_url(&self) -> AppResult<String> {
        self.endpoint("/health")
    }

    /// Resolves an absolute path such as `/api/entries` against the base URL.
    pub fn endpoint(&self, path: &str) -> AppResult<String> {
        if !path.starts_with('/') {
            return Err(AppError::Validation(format!(
                "request path must start with '/', got '{path}'"
            )));
        }

        let joined = format!(
            "{}{path}",
            self.api_base_url.as_str().trim_end_matches('/')
        );
        Url::parse(&joined).map(String::from).map_err(|error| {
            AppError::Validation(format!("invalid request path '{path}': {error}"))
        })
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

fn parse_base_url(value: &str) -> AppResult<Url> {
    let url = Url::parse(value.trim())
        .map_err(|error| AppError::Validation(format!("invalid API_BASE_URL: {error}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "API_BASE_URL must use http or https, got '{}'",
            url.scheme()
        )));
    }

    Ok(url)
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

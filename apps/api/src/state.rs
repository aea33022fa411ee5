use std::sync::Arc;

use ipnet::IpNet;
use pennywise_application::RateLimitService;
use pennywise_domain::LedgerEntry;
use tokio::sync::RwLock;

/// Credentials accepted by the login route.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub rate_limit_service: RateLimitService,
    pub access_token: Arc<str>,
    pub credentials: Arc<LoginCredentials>,
    pub entries: Arc<RwLock<Vec<LedgerEntry>>>,
    /// Peers whose `X-Forwarded-For` header names the client.
    pub trusted_proxies: Arc<[IpNet]>,
}

impl AppState {
    pub fn new(
        rate_limit_service: RateLimitService,
        access_token: impl Into<Arc<str>>,
        credentials: LoginCredentials,
    ) -> Self {
        Self {
            rate_limit_service,
            access_token: access_token.into(),
            credentials: Arc::new(credentials),
            entries: Arc::new(RwLock::new(Vec::new())),
            trusted_proxies: Arc::from(Vec::new()),
        }
    }

    pub fn with_trusted_proxies(mut self, trusted_proxies: Vec<IpNet>) -> Self {
        self.trusted_proxies = Arc::from(trusted_proxies);
        self
    }
}

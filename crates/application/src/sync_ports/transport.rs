use async_trait::async_trait;
use pennywise_core::AppResult;
use pennywise_domain::{HttpResponse, OutboundRequest};

/// Port for performing one HTTP exchange.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request once and returns whatever response arrives.
    ///
    /// Must return `AppError::Network` when no response was obtained. Error
    /// statuses are responses, not errors.
    async fn send(&self, request: &OutboundRequest) -> AppResult<HttpResponse>;
}

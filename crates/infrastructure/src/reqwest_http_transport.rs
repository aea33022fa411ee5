use async_trait::async_trait;
use pennywise_application::HttpTransport;
use pennywise_core::{AppError, AppResult};
use pennywise_domain::{HttpResponse, OutboundRequest};

/// `reqwest` implementation of the HTTP transport port.
///
/// Any failure before a status line arrives is reported as
/// [`AppError::Network`]; every received status is returned as a response.
#[derive(Clone)]
pub struct ReqwestHttpTransport {
    http_client: reqwest::Client,
}

impl ReqwestHttpTransport {
    /// Creates a transport over a configured client.
    #[must_use]
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn send(&self, request: &OutboundRequest) -> AppResult<HttpResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|error| AppError::Validation(format!("invalid HTTP method: {error}")))?;

        let mut builder = self.http_client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|error| {
            AppError::Network(format!("{} failed: {error}", request.describe()))
        })?;

        let mut received = HttpResponse::new(response.status().as_u16());
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                received = received.with_header(name.as_str(), value);
            }
        }

        received.body = response
            .bytes()
            .await
            .map_err(|error| {
                AppError::Network(format!(
                    "{} response body could not be read: {error}",
                    request.describe()
                ))
            })?
            .to_vec();

        Ok(received)
    }
}

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Extension, Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use ipnet::IpNet;
use pennywise_application::RateLimitRule;
use pennywise_core::AppError;
use pennywise_domain::RateLimitDecision;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::dto::RateLimitErrorResponse;
use crate::error::ApiResult;
use crate::state::AppState;

const UNKNOWN_CLIENT: &str = "unknown";

/// Compares secrets without short-circuiting on the first differing byte.
pub fn constant_time_eq(provided: &str, expected: &str) -> bool {
    if provided.len() != expected.len() {
        return false;
    }

    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized("bearer token required".to_owned()))?;

    if !constant_time_eq(token, &state.access_token) {
        return Err(AppError::Unauthorized("invalid access token".to_owned()).into());
    }

    Ok(next.run(request).await)
}

/// Applies the route's [`RateLimitRule`] to the calling client.
///
/// Store failures let the request through.
pub async fn rate_limit(
    State(state): State<AppState>,
    Extension(rule): Extension<RateLimitRule>,
    request: Request,
    next: Next,
) -> Response {
    let identity = client_identity(&request, &state.trusted_proxies);

    let decision = match state.rate_limit_service.check(&rule, &identity).await {
        Ok(decision) => decision,
        Err(error) => {
            warn!(
                rule = %rule.key_prefix,
                error = %error,
                "rate limit store unavailable, allowing request"
            );
            return next.run(request).await;
        }
    };

    if !decision.allowed {
        let retry_after = decision.retry_after_seconds.unwrap_or(1);
        warn!(
            rule = %rule.key_prefix,
            client = %identity,
            retry_after,
            "rate limit exceeded"
        );

        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(RateLimitErrorResponse {
                error: "Too Many Requests",
                message: "Too many requests, please try again later.".to_owned(),
                retry_after,
            }),
        )
            .into_response();

        let headers = response.headers_mut();
        insert_rate_limit_headers(headers, &decision);
        headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        return response;
    }

    let mut response = next.run(request).await;
    insert_rate_limit_headers(response.headers_mut(), &decision);
    response
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert(
        "x-ratelimit-reset",
        HeaderValue::from(decision.reset_at_epoch_seconds),
    );
}

/// Peer address, or the first `X-Forwarded-For` hop when the peer is a
/// trusted proxy.
fn client_identity(request: &Request, trusted_proxies: &[IpNet]) -> String {
    let Some(peer) = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| address.ip())
    else {
        return UNKNOWN_CLIENT.to_owned();
    };

    if !trusted_proxies.iter().any(|proxy| proxy.contains(&peer)) {
        return peer.to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|hop| hop.trim().parse::<IpAddr>().ok())
        .unwrap_or(peer)
        .to_string()
}

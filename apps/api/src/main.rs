//! Pennywise API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;

use pennywise_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_router::{RouteLimits, build_router};
use crate::api_services::{
    RATE_LIMIT_SWEEP_INTERVAL, build_rate_limit_service, spawn_rate_limit_sweep,
};
use crate::state::{AppState, LoginCredentials};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let rate_limit_service = build_rate_limit_service(&config.rate_limit_store).await?;
    let limits = RouteLimits::default();

    let _sweep = spawn_rate_limit_sweep(
        rate_limit_service.clone(),
        limits.rules(),
        RATE_LIMIT_SWEEP_INTERVAL,
    );

    let app_state = AppState::new(
        rate_limit_service,
        config.access_token.as_str(),
        LoginCredentials {
            username: config.auth_username.clone(),
            password: config.auth_password.clone(),
        },
    )
    .with_trusted_proxies(config.trusted_proxies.clone());
    let app = build_router(app_state, &config.frontend_url, limits)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(
        %address,
        store = config.rate_limit_store_kind(),
        trusted_proxies = config.trusted_proxies.len(),
        "pennywise-api listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

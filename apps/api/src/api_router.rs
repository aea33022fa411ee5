use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use pennywise_application::RateLimitRule;
use pennywise_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

/// Rate limit rules per route class.
#[derive(Debug, Clone)]
pub struct RouteLimits {
    pub auth: RateLimitRule,
    pub api: RateLimitRule,
}

impl Default for RouteLimits {
    fn default() -> Self {
        Self {
            auth: RateLimitRule::auth(),
            api: RateLimitRule::api(),
        }
    }
}

impl RouteLimits {
    pub fn rules(&self) -> Vec<RateLimitRule> {
        vec![self.auth.clone(), self.api.clone()]
    }
}

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    limits: RouteLimits,
) -> Result<Router, AppError> {
    let auth_routes = Router::new()
        .route("/auth/login", post(handlers::auth::login_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::rate_limit,
        ))
        .layer(axum::Extension(limits.auth));

    let api_routes = Router::new()
        .route(
            "/api/entries",
            get(handlers::entries::list_entries_handler)
                .post(handlers::entries::create_entry_handler),
        )
        .route(
            "/api/entries/{entry_id}",
            delete(handlers::entries::delete_entry_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::rate_limit,
        ))
        .layer(axum::Extension(limits.api));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(auth_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}

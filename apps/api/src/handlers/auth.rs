use axum::Json;
use axum::extract::State;
use pennywise_core::AppError;
use tracing::{info, warn};

use crate::dto::{LoginRequest, LoginResponse};
use crate::error::ApiResult;
use crate::middleware::constant_time_eq;
use crate::state::AppState;

pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let credentials = &state.credentials;
    let username_matches = constant_time_eq(&payload.username, &credentials.username);
    let password_matches = constant_time_eq(&payload.password, &credentials.password);
    if !(username_matches && password_matches) {
        warn!(username = %payload.username, "login rejected");
        return Err(AppError::Unauthorized("invalid username or password".to_owned()).into());
    }

    info!(username = %payload.username, "login accepted");
    Ok(Json(LoginResponse {
        token: state.access_token.to_string(),
    }))
}

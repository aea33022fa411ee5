use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use pennywise_core::AppError;
use pennywise_domain::LedgerEntry;
use uuid::Uuid;

use crate::dto::{CreateEntryRequest, EntryResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_entries_handler(State(state): State<AppState>) -> Json<Vec<EntryResponse>> {
    let entries = state.entries.read().await;
    Json(entries.iter().map(EntryResponse::from).collect())
}

pub async fn create_entry_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateEntryRequest>,
) -> ApiResult<(StatusCode, Json<EntryResponse>)> {
    let entry = LedgerEntry::new(
        payload.kind,
        payload.amount,
        payload.category,
        payload.date,
        payload.note,
    )?;
    let response = EntryResponse::from(&entry);

    state.entries.write().await.push(entry);
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn delete_entry_handler(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut entries = state.entries.write().await;
    let position = entries
        .iter()
        .position(|entry| entry.id() == entry_id)
        .ok_or_else(|| AppError::NotFound(format!("entry '{entry_id}' does not exist")))?;

    entries.remove(position);
    Ok(StatusCode::NO_CONTENT)
}

//! Transaction handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use core_kernel::TransactionId;
use uuid::Uuid;

use crate::auth::Claims;
use crate::dto::transactions::*;
use crate::{error::ApiError, AppState};

/// Submits a balanced set of entries as one transaction
pub async fn submit_transaction(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<SubmitTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let actor_id = claims.actor_id()?;
    let actor_type = claims.actor_type()?;
    let entries = request.entries.into_iter().map(Into::into).collect();

    let transaction = state
        .coordinator
        .submit(&request.description, actor_id, actor_type, entries)
        .await?;

    Ok((StatusCode::CREATED, Json(transaction.into())))
}

/// Gets a transaction by ID
pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let transaction = state
        .coordinator
        .get_by_id(TransactionId::from(id), claims.actor_id()?)
        .await?;
    Ok(Json(transaction.into()))
}

/// Lists transactions touching the caller's accounts
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<TransactionPageResponse>, ApiError> {
    let page = state
        .coordinator
        .list(query.into(), claims.actor_id()?)
        .await?;
    Ok(Json(page.into()))
}

//! Account handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use core_kernel::AccountId;
use tracing::info;
use uuid::Uuid;

use crate::auth::{permissions, require_role, Claims};
use crate::dto::accounts::*;
use crate::{error::ApiError, AppState};

/// Gets the cached balance of an account the caller owns
pub async fn get_balance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state
        .coordinator
        .get_owned_balance(AccountId::from(id), claims.actor_id()?)
        .await?;
    Ok(Json(balance.into()))
}

/// Recomputes a balance from history, optionally repairing it
///
/// Auditing needs `ledger:audit`; persisting also needs `ledger:repair`.
pub async fn recompute_balance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Query(query): Query<RecomputeQuery>,
) -> Result<Json<RecomputeResponse>, ApiError> {
    require_role(&claims, permissions::LEDGER_AUDIT)?;
    if query.persist {
        require_role(&claims, permissions::LEDGER_REPAIR)?;
    }

    let report = state
        .coordinator
        .recompute_balance(AccountId::from(id), query.persist)
        .await?;
    if report.repaired {
        info!(account_id = %report.account_id, actor = %claims.sub, "Balance repaired via API");
    }
    Ok(Json(report.into()))
}

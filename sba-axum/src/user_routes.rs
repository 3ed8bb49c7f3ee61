//! User and wallet endpoints: login, balances, deposits, and bid history.

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResponse, flatten, ok};
use crate::AppState;
use axum::Json;
use axum::extract::State;
use sba_core::models::{Bid, LedgerEntry, User};
use sba_core::ports::AuctionStore;
use time::OffsetDateTime;

/// Create the user on first sight, return them either way.
pub(crate) async fn login<R: AuctionStore>(
    State(state): State<AppState<R>>,
    Json(body): Json<LoginRequestBody>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let user = flatten(state.engine.login(&body.username, now).await)?;
    Ok(ok(user))
}

/// The calling user with their balances.
pub(crate) async fn me<R: AuctionStore>(
    State(state): State<AppState<R>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = flatten(state.engine.user(user_id).await)?;
    Ok(ok(user))
}

/// Add funds to the calling user's available balance.
pub(crate) async fn deposit<R: AuctionStore>(
    State(state): State<AppState<R>>,
    CurrentUser(user_id): CurrentUser,
    Json(body): Json<DepositRequestBody>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let user = flatten(state.engine.deposit(user_id, body.amount, now).await)?;
    Ok(ok(user))
}

/// The calling user's winning bids.
pub(crate) async fn wins<R: AuctionStore>(
    State(state): State<AppState<R>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ApiResponse<Vec<Bid>>>, ApiError> {
    let wins = state
        .engine
        .wins(user_id)
        .await
        .map_err(ApiError::internal)?;
    Ok(ok(wins))
}

/// All of the calling user's bids, newest first.
pub(crate) async fn bids<R: AuctionStore>(
    State(state): State<AppState<R>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ApiResponse<Vec<Bid>>>, ApiError> {
    let bids = state
        .engine
        .bid_history(user_id)
        .await
        .map_err(ApiError::internal)?;
    Ok(ok(bids))
}

/// The calling user's wallet transaction log, newest first.
pub(crate) async fn ledger<R: AuctionStore>(
    State(state): State<AppState<R>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ApiResponse<Vec<LedgerEntry>>>, ApiError> {
    let entries = state
        .engine
        .ledger(user_id, state.config.page_limit)
        .await
        .map_err(ApiError::internal)?;
    Ok(ok(entries))
}

/// Request body for login.
#[derive(serde::Deserialize)]
pub(crate) struct LoginRequestBody {
    /// Unique display name, 3-50 characters.
    pub username: String,
}

/// Request body for a deposit.
#[derive(serde::Deserialize)]
pub(crate) struct DepositRequestBody {
    /// Amount to add; at least 1.
    pub amount: i64,
}

//! Auction endpoints: reads, creation, and the bid admission path.

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResponse, flatten, ok};
use crate::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use sba_core::models::{
    Auction, AuctionId, AuctionSummary, BidReceipt, LeaderboardEntry, MyBid, NewAuction,
};
use sba_core::ports::AuctionStore;
use time::OffsetDateTime;

/// Path parameter for auction-scoped endpoints.
#[derive(serde::Deserialize)]
pub(crate) struct Id {
    /// The auction's identifier.
    auction_id: AuctionId,
}

/// All auctions, newest first.
pub(crate) async fn list<R: AuctionStore>(
    State(state): State<AppState<R>>,
) -> Result<Json<ApiResponse<Vec<Auction>>>, ApiError> {
    let auctions = state
        .engine
        .list_auctions()
        .await
        .map_err(ApiError::internal)?;
    Ok(ok(auctions))
}

/// Create an auction and schedule its start.
pub(crate) async fn create<R: AuctionStore>(
    State(state): State<AppState<R>>,
    Json(body): Json<NewAuction>,
) -> Result<Json<ApiResponse<Auction>>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let auction = flatten(state.engine.create_auction(body, now).await)?;
    Ok(ok(auction))
}

/// One auction with its active round, if any.
pub(crate) async fn show<R: AuctionStore>(
    State(state): State<AppState<R>>,
    Path(Id { auction_id }): Path<Id>,
) -> Result<Json<ApiResponse<AuctionSummary>>, ApiError> {
    let summary = flatten(state.engine.auction_summary(auction_id).await)?;
    Ok(ok(summary))
}

/// Query parameter for the leaderboard size.
#[derive(serde::Deserialize)]
pub(crate) struct LeaderboardQuery {
    /// Number of entries to return.
    limit: Option<u32>,
}

/// Top-K of the active round.
pub(crate) async fn leaderboard<R: AuctionStore>(
    State(state): State<AppState<R>>,
    Path(Id { auction_id }): Path<Id>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(state.engine.config().leaderboard_size)
        .min(state.config.page_limit);
    let entries = state
        .engine
        .leaderboard(auction_id, limit)
        .await
        .map_err(ApiError::internal)?;
    Ok(ok(entries))
}

/// Number of active bids in the active round.
#[derive(serde::Serialize)]
pub(crate) struct BidCountResponseBody {
    /// Active bid count; 0 when no round is running.
    count: u32,
}

/// Active bid count for the auction.
pub(crate) async fn bid_count<R: AuctionStore>(
    State(state): State<AppState<R>>,
    Path(Id { auction_id }): Path<Id>,
) -> Result<Json<ApiResponse<BidCountResponseBody>>, ApiError> {
    let count = state
        .engine
        .active_bid_count(auction_id)
        .await
        .map_err(ApiError::internal)?;
    Ok(ok(BidCountResponseBody { count }))
}

/// Request body for placing or raising a bid.
#[derive(serde::Deserialize)]
pub(crate) struct PlaceBidRequestBody {
    /// The bid amount, or the increment when raising.
    amount: i64,
}

/// Place a new bid or raise an existing one.
pub(crate) async fn place_bid<R: AuctionStore>(
    State(state): State<AppState<R>>,
    CurrentUser(user_id): CurrentUser,
    Path(Id { auction_id }): Path<Id>,
    Json(body): Json<PlaceBidRequestBody>,
) -> Result<Json<ApiResponse<BidReceipt>>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let receipt = flatten(
        state
            .engine
            .place_bid(user_id, auction_id, body.amount, now)
            .await,
    )?;
    Ok(ok(receipt))
}

/// The caller's bid in the active round, or null.
pub(crate) async fn my_bid<R: AuctionStore>(
    State(state): State<AppState<R>>,
    CurrentUser(user_id): CurrentUser,
    Path(Id { auction_id }): Path<Id>,
) -> Result<Json<ApiResponse<Option<MyBid>>>, ApiError> {
    let my_bid = state
        .engine
        .my_bid(auction_id, user_id)
        .await
        .map_err(ApiError::internal)?;
    Ok(ok(my_bid))
}

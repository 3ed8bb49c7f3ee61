#![warn(missing_docs)]
//! HTTP and WebSocket transport for the auction engine.
//!
//! The REST surface covers users and wallets, auction reads, auction
//! creation, and the bid endpoint; the WebSocket endpoint streams lifecycle
//! and leaderboard events scoped to joined auction rooms. All responses use
//! the `{success, data, error}` envelope.

mod auction_routes;
mod auth;
mod user_routes;
mod ws;

pub mod config;
pub mod error;
pub mod hub;

use axum::Json;
use axum::routing::{get, post};
use config::ApiConfig;
use error::{ApiResponse, ok};
use hub::EventHub;
use sba_core::ports::AuctionStore;
use sba_core::services::Engine;
use serde::Serialize;
use std::sync::Arc;

/// Everything the handlers need, cloned per request.
#[derive(Clone)]
pub struct AppState<R: AuctionStore> {
    /// The auction engine.
    pub engine: Arc<Engine<R, EventHub>>,
    /// The realtime event hub (the engine's event sink).
    pub hub: EventHub,
    /// Transport configuration.
    pub config: Arc<ApiConfig>,
}

/// Response for the health check endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// Simple liveness endpoint.
async fn health_check() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Construct the full API router over the given state.
pub fn router<R: AuctionStore>(state: AppState<R>) -> axum::Router {
    axum::Router::new()
        .route("/api/health", get(health_check))
        .route("/api/users/login", post(user_routes::login::<R>))
        .route("/api/users/me", get(user_routes::me::<R>))
        .route("/api/users/me/deposit", post(user_routes::deposit::<R>))
        .route("/api/users/me/wins", get(user_routes::wins::<R>))
        .route("/api/users/me/bids", get(user_routes::bids::<R>))
        .route("/api/users/me/ledger", get(user_routes::ledger::<R>))
        .route(
            "/api/auctions",
            get(auction_routes::list::<R>).post(auction_routes::create::<R>),
        )
        .route("/api/auctions/{auction_id}", get(auction_routes::show::<R>))
        .route(
            "/api/auctions/{auction_id}/leaderboard",
            get(auction_routes::leaderboard::<R>),
        )
        .route(
            "/api/auctions/{auction_id}/bids/count",
            get(auction_routes::bid_count::<R>),
        )
        .route(
            "/api/auctions/{auction_id}/bid",
            post(auction_routes::place_bid::<R>),
        )
        .route(
            "/api/auctions/{auction_id}/my-bid",
            get(auction_routes::my_bid::<R>),
        )
        .route("/ws", get(ws::upgrade::<R>))
        .with_state(state)
}

/// Start the HTTP server with the provided state.
pub async fn start_server<R: AuctionStore>(
    config: ApiConfig,
    state: AppState<R>,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    tracing::info!("listening for requests on {}", listener.local_addr()?);

    let service = router(state);
    axum::serve(listener, service).await
}

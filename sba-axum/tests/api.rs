use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use sba_axum::{AppState, hub::EventHub, router};
use sba_core::models::EngineConfig;
use sba_core::services::Engine;
use sba_sqlite::{Db, config::SqliteConfig};
use serde_json::{Value, json};
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

fn user_header(id: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(id).expect("uuid strings are valid header values"),
    )
}

async fn server() -> anyhow::Result<TestServer> {
    let db = Db::open(&SqliteConfig::default()).await?;
    let hub = EventHub::new(64);
    let engine = Arc::new(Engine::new(db, hub.clone(), EngineConfig::default()));
    let state = AppState {
        engine,
        hub,
        config: Arc::new(Default::default()),
    };
    TestServer::new(router(state))
}

fn future_start() -> String {
    (OffsetDateTime::now_utc() + time::Duration::minutes(5))
        .format(&Rfc3339)
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() -> anyhow::Result<()> {
    let server = server().await?;
    let response = server.get("/api/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn login_creates_and_returns_the_user() -> anyhow::Result<()> {
    let server = server().await?;
    let response = server
        .post("/api/users/login")
        .json(&json!({"username": "alice"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["available"], 0);

    // same username, same identity
    let again: Value = server
        .post("/api/users/login")
        .json(&json!({"username": "alice"}))
        .await
        .json();
    assert_eq!(again["data"]["id"], body["data"]["id"]);
    Ok(())
}

#[tokio::test]
async fn short_usernames_are_rejected() -> anyhow::Result<()> {
    let server = server().await?;
    let response = server
        .post("/api/users/login")
        .json(&json!({"username": "ab"}))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("username"));
    Ok(())
}

#[tokio::test]
async fn identified_endpoints_require_the_header() -> anyhow::Result<()> {
    let server = server().await?;
    let response = server.get("/api/users/me").await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn deposits_show_up_in_the_wallet() -> anyhow::Result<()> {
    let server = server().await?;
    let login: Value = server
        .post("/api/users/login")
        .json(&json!({"username": "alice"}))
        .await
        .json();
    let user_id = login["data"]["id"].as_str().unwrap().to_owned();

    let response = server
        .post("/api/users/me/deposit")
        .add_header(user_header(&user_id).0, user_header(&user_id).1)
        .json(&json!({"amount": 500}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["available"], 500);

    let me: Value = server
        .get("/api/users/me")
        .add_header(user_header(&user_id).0, user_header(&user_id).1)
        .await
        .json();
    assert_eq!(me["data"]["available"], 500);
    assert_eq!(me["data"]["frozen"], 0);
    Ok(())
}

#[tokio::test]
async fn auctions_can_be_created_and_listed() -> anyhow::Result<()> {
    let server = server().await?;
    let response = server
        .post("/api/auctions")
        .json(&json!({
            "name": "genesis drop",
            "totalItems": 10,
            "totalRounds": 3,
            "startAt": future_start(),
        }))
        .await;
    response.assert_status_ok();
    let created: Value = response.json();
    assert_eq!(created["data"]["status"], "pending");
    assert_eq!(created["data"]["itemsPerRound"], 4);
    let id = created["data"]["id"].as_str().unwrap().to_owned();

    let list: Value = server.get("/api/auctions").await.json();
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let show: Value = server.get(&format!("/api/auctions/{id}")).await.json();
    assert_eq!(show["data"]["name"], "genesis drop");
    assert!(show["data"]["activeRound"].is_null());
    Ok(())
}

#[tokio::test]
async fn invalid_auction_inputs_are_rejected() -> anyhow::Result<()> {
    let server = server().await?;
    let response = server
        .post("/api/auctions")
        .json(&json!({
            "name": "broken",
            "totalItems": 0,
            "totalRounds": 3,
            "startAt": future_start(),
        }))
        .await;
    response.assert_status_bad_request();
    Ok(())
}

#[tokio::test]
async fn unknown_auctions_are_404() -> anyhow::Result<()> {
    let server = server().await?;
    let response = server
        .get(&format!("/api/auctions/{}", uuid::Uuid::new_v4()))
        .await;
    response.assert_status_not_found();
    Ok(())
}

#[tokio::test]
async fn bids_against_pending_auctions_are_rejected() -> anyhow::Result<()> {
    let server = server().await?;
    let login: Value = server
        .post("/api/users/login")
        .json(&json!({"username": "alice"}))
        .await
        .json();
    let user_id = login["data"]["id"].as_str().unwrap().to_owned();

    let created: Value = server
        .post("/api/auctions")
        .json(&json!({
            "name": "pending drop",
            "totalItems": 1,
            "totalRounds": 1,
            "startAt": future_start(),
        }))
        .await
        .json();
    let id = created["data"]["id"].as_str().unwrap().to_owned();

    let response = server
        .post(&format!("/api/auctions/{id}/bid"))
        .add_header(user_header(&user_id).0, user_header(&user_id).1)
        .json(&json!({"amount": 100}))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "auction is not active");
    Ok(())
}

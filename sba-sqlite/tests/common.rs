#![allow(dead_code)]

use sba_core::models::{Auction, AuctionId, EngineConfig, NewAuction, Round, User};
use sba_core::ports::NullEventSink;
use sba_core::services::Engine;
use sba_sqlite::{Db, config::SqliteConfig};
use time::{Duration, OffsetDateTime};

pub type TestEngine = Engine<Db, NullEventSink>;

pub async fn engine() -> anyhow::Result<TestEngine> {
    let db = Db::open(&SqliteConfig::default()).await?;
    Ok(Engine::new(db, NullEventSink, EngineConfig::default()))
}

pub async fn engine_with(config: EngineConfig) -> anyhow::Result<TestEngine> {
    let db = Db::open(&SqliteConfig::default()).await?;
    Ok(Engine::new(db, NullEventSink, config))
}

/// A deterministic anchor for the simulated clock; every test timestamp is
/// an offset from this.
pub fn t0() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub fn ms(n: i64) -> Duration {
    Duration::milliseconds(n)
}

pub fn auction_input(total_items: u32, total_rounds: u32, start_at: OffsetDateTime) -> NewAuction {
    NewAuction {
        name: "test drop".to_owned(),
        description: None,
        total_items,
        total_rounds,
        winners_per_round: None,
        min_bid: None,
        start_at,
        first_round_duration_ms: Some(10_000),
        other_round_duration_ms: Some(10_000),
    }
}

/// Create and start an auction; returns it with its opening round.
pub async fn running_auction(
    engine: &TestEngine,
    input: NewAuction,
    now: OffsetDateTime,
) -> anyhow::Result<(Auction, Round)> {
    let auction = engine
        .create_auction(input, now)
        .await?
        .map_err(|r| anyhow::anyhow!("create rejected: {r}"))?;
    let round = engine
        .start_auction(auction.id, now)
        .await?
        .map_err(|r| anyhow::anyhow!("start rejected: {r}"))?
        .expect("freshly created auction must start");
    Ok((auction, round))
}

/// A funded user.
pub async fn funded_user(
    engine: &TestEngine,
    username: &str,
    amount: i64,
    now: OffsetDateTime,
) -> anyhow::Result<User> {
    let user = engine
        .login(username, now)
        .await?
        .map_err(|r| anyhow::anyhow!("login rejected: {r}"))?;
    let user = engine
        .deposit(user.id, amount, now)
        .await?
        .map_err(|r| anyhow::anyhow!("deposit rejected: {r}"))?;
    Ok(user)
}

/// The global money invariant: total deposits equal wallet holdings plus
/// consumed winnings, across every user in the store.
pub async fn assert_money_invariant(db: &Db) -> anyhow::Result<()> {
    let (deposits,): (i64,) =
        sqlx::query_as("select coalesce(sum(amount), 0) from ledger where kind = 'deposit'")
            .fetch_one(&db.reader)
            .await?;
    let (held,): (i64,) =
        sqlx::query_as("select coalesce(sum(available + frozen), 0) from users")
            .fetch_one(&db.reader)
            .await?;
    let (won,): (i64,) =
        sqlx::query_as("select coalesce(sum(amount), 0) from bids where status = 'won'")
            .fetch_one(&db.reader)
            .await?;
    anyhow::ensure!(
        deposits == held + won,
        "money invariant broken: deposits {deposits} != held {held} + won {won}"
    );
    Ok(())
}

/// Fetch the auction fresh from the store.
pub async fn reload_auction(engine: &TestEngine, id: AuctionId) -> anyhow::Result<Auction> {
    use sba_core::ports::AuctionRepository as _;
    engine
        .store()
        .get_auction(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("auction vanished"))
}

mod common;

use common::{
    assert_money_invariant, auction_input, engine, funded_user, ms, reload_auction, t0,
};
use sba_core::models::{AuctionStatus, RoundStatus};
use sba_core::ports::RoundRepository as _;

#[tokio::test]
async fn the_worker_drives_an_auction_end_to_end() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();

    // creation enqueues the start job; the worker fires it
    let auction = engine
        .create_auction(auction_input(1, 1, now), now)
        .await?
        .unwrap();
    assert_eq!(engine.run_due_jobs(now, "w1").await?, 1);

    let started = reload_auction(&engine, auction.id).await?;
    assert_eq!(started.status, AuctionStatus::Active);
    assert_eq!(started.current_round, 1);
    let round = engine
        .store()
        .active_round(auction.id)
        .await?
        .expect("round 1 must be open");

    let user = funded_user(&engine, "alice", 500, now).await?;
    engine
        .place_bid(user.id, auction.id, 120, now + ms(1_000))
        .await?
        .unwrap();

    // nothing is due before the round deadline
    assert_eq!(engine.run_due_jobs(now + ms(5_000), "w1").await?, 0);

    // the close job settles the round
    assert_eq!(engine.run_due_jobs(round.end_at, "w1").await?, 1);
    let settled = engine.store().get_round(round.id).await?.unwrap();
    assert_eq!(settled.status, RoundStatus::Completed);
    let auction = reload_auction(&engine, auction.id).await?;
    assert_eq!(auction.status, AuctionStatus::Completed);

    let wallet = engine.user(user.id).await?.unwrap();
    assert_eq!((wallet.available, wallet.frozen), (380, 0));
    assert_money_invariant(engine.store()).await?;
    Ok(())
}

#[tokio::test]
async fn bootstrap_starts_overdue_auctions_and_reschedules_rounds() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();

    // overdue: its start job was scheduled in the past but never ran
    let overdue = engine
        .create_auction(auction_input(1, 1, now - ms(30_000)), now - ms(30_000))
        .await?
        .unwrap();
    // future: should only get its job (re)scheduled
    let future = engine
        .create_auction(auction_input(1, 1, now + ms(60_000)), now)
        .await?
        .unwrap();

    let report = engine.bootstrap(now).await?;
    assert_eq!(report.started, 1);
    assert_eq!(report.stuck_rounds, 0);

    assert_eq!(
        reload_auction(&engine, overdue.id).await?.status,
        AuctionStatus::Active
    );
    assert_eq!(
        reload_auction(&engine, future.id).await?.status,
        AuctionStatus::Pending
    );
    Ok(())
}

#[tokio::test]
async fn the_poller_rescues_overdue_auctions() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();

    let auction = engine
        .create_auction(auction_input(1, 1, now + ms(1_000)), now)
        .await?
        .unwrap();

    assert_eq!(engine.rescue_overdue_auctions(now).await?, 0);
    assert_eq!(engine.rescue_overdue_auctions(now + ms(1_000)).await?, 1);
    // second pass finds nothing pending
    assert_eq!(engine.rescue_overdue_auctions(now + ms(2_000)).await?, 0);

    assert_eq!(
        reload_auction(&engine, auction.id).await?.status,
        AuctionStatus::Active
    );
    Ok(())
}

#[tokio::test]
async fn bootstrap_reports_rounds_stuck_in_processing() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let (_auction, round) = common::running_auction(&engine, auction_input(1, 1, now), now).await?;

    // a settlement that died mid-flight: processing, lock long expired
    assert!(engine.store().mark_round_processing(round.id, now).await?);

    let report = engine.bootstrap(now + ms(600_000)).await?;
    assert_eq!(report.stuck_rounds, 1);

    // never auto-reverted
    let still = engine.store().get_round(round.id).await?.unwrap();
    assert_eq!(still.status, RoundStatus::Processing);
    Ok(())
}

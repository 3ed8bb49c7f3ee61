mod common;

use common::{
    assert_money_invariant, auction_input, engine, funded_user, ms, running_auction, t0,
};
use sba_core::models::BidStatus;
use sba_core::ports::{BidRepository as _, RoundRepository as _};
use sba_core::services::Rejection;

#[tokio::test]
async fn bid_at_minimum_is_accepted_below_is_rejected() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let mut input = auction_input(1, 1, now);
    input.min_bid = Some(100);
    let (auction, _round) = running_auction(&engine, input, now).await?;
    let user = funded_user(&engine, "alice", 500, now).await?;

    let rejected = engine
        .place_bid(user.id, auction.id, 99, now + ms(1))
        .await?;
    assert_eq!(rejected.unwrap_err(), Rejection::BelowMinimum { min_bid: 100 });

    let receipt = engine
        .place_bid(user.id, auction.id, 100, now + ms(2))
        .await?
        .unwrap();
    assert_eq!(receipt.bid.amount, 100);
    assert_eq!(receipt.rank, 1);
    assert_eq!(receipt.total_bids, 1);
    Ok(())
}

#[tokio::test]
async fn bidding_freezes_funds() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let (auction, _round) = running_auction(&engine, auction_input(1, 1, now), now).await?;
    let user = funded_user(&engine, "alice", 500, now).await?;

    engine
        .place_bid(user.id, auction.id, 200, now + ms(1))
        .await?
        .unwrap();

    let wallet = engine.user(user.id).await?.unwrap();
    assert_eq!(wallet.available, 300);
    assert_eq!(wallet.frozen, 200);
    assert_money_invariant(engine.store()).await?;
    Ok(())
}

#[tokio::test]
async fn raise_adds_to_the_existing_bid() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let (auction, round) = running_auction(&engine, auction_input(1, 1, now), now).await?;
    let user = funded_user(&engine, "alice", 1_000, now).await?;

    let first = engine
        .place_bid(user.id, auction.id, 100, now + ms(1))
        .await?
        .unwrap();
    let raised = engine
        .place_bid(user.id, auction.id, 50, now + ms(2))
        .await?
        .unwrap();

    // same bid, accumulated amount, original arrival kept for the tie-break
    assert_eq!(raised.bid.id, first.bid.id);
    assert_eq!(raised.bid.amount, 150);
    assert_eq!(raised.bid.created_at, first.bid.created_at);

    let wallet = engine.user(user.id).await?.unwrap();
    assert_eq!(wallet.available, 850);
    assert_eq!(wallet.frozen, 150);

    // one bid per (auction, round, user), not two
    assert_eq!(engine.store().count_active_bids(round.id).await?, 1);
    Ok(())
}

#[tokio::test]
async fn insufficient_funds_leaves_no_trace() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let (auction, round) = running_auction(&engine, auction_input(1, 1, now), now).await?;
    let user = funded_user(&engine, "alice", 50, now).await?;

    let outcome = engine
        .place_bid(user.id, auction.id, 100, now + ms(1))
        .await?;
    assert_eq!(outcome.unwrap_err(), Rejection::InsufficientFunds);

    // no bid row, no wallet movement, single deposit in the ledger
    assert!(
        engine
            .store()
            .find_bid(auction.id, round.id, user.id)
            .await?
            .is_none()
    );
    let wallet = engine.user(user.id).await?.unwrap();
    assert_eq!(wallet.available, 50);
    assert_eq!(wallet.frozen, 0);
    assert_eq!(engine.ledger(user.id, 10).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn bids_after_the_deadline_are_rejected() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let (auction, round) = running_auction(&engine, auction_input(1, 1, now), now).await?;
    let user = funded_user(&engine, "alice", 500, now).await?;

    let too_late = engine
        .place_bid(user.id, auction.id, 100, round.end_at + ms(1))
        .await?;
    assert_eq!(too_late.unwrap_err(), Rejection::RoundEnded);

    // exactly at the deadline is still admissible
    let at_deadline = engine
        .place_bid(user.id, auction.id, 100, round.end_at)
        .await?;
    assert!(at_deadline.is_ok());
    Ok(())
}

#[tokio::test]
async fn pending_auctions_do_not_take_bids() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let auction = engine
        .create_auction(auction_input(1, 1, now + ms(60_000)), now)
        .await?
        .unwrap();
    let user = funded_user(&engine, "alice", 500, now).await?;

    let outcome = engine
        .place_bid(user.id, auction.id, 100, now + ms(1))
        .await?;
    assert_eq!(outcome.unwrap_err(), Rejection::AuctionNotActive);
    Ok(())
}

#[tokio::test]
async fn my_bid_reports_live_rank() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let (auction, _round) = running_auction(&engine, auction_input(2, 1, now), now).await?;
    let alice = funded_user(&engine, "alice", 500, now).await?;
    let bob = funded_user(&engine, "bob", 500, now).await?;

    engine
        .place_bid(alice.id, auction.id, 100, now + ms(1))
        .await?
        .unwrap();
    engine
        .place_bid(bob.id, auction.id, 200, now + ms(2))
        .await?
        .unwrap();

    let mine = engine.my_bid(auction.id, alice.id).await?.unwrap();
    assert_eq!(mine.rank, 2);
    assert_eq!(mine.amount, 100);
    assert_eq!(mine.status, BidStatus::Active);

    assert!(
        engine
            .my_bid(auction.id, sba_core::models::UserId::random())
            .await?
            .is_none()
    );
    Ok(())
}

#[tokio::test]
async fn leaderboard_orders_by_amount_then_arrival() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let (auction, _round) = running_auction(&engine, auction_input(2, 1, now), now).await?;
    let alice = funded_user(&engine, "alice", 500, now).await?;
    let bob = funded_user(&engine, "bob", 500, now).await?;
    let carol = funded_user(&engine, "carol", 500, now).await?;

    engine
        .place_bid(alice.id, auction.id, 200, now + ms(1))
        .await?
        .unwrap();
    engine
        .place_bid(bob.id, auction.id, 300, now + ms(2))
        .await?
        .unwrap();
    // same amount as alice, later arrival
    engine
        .place_bid(carol.id, auction.id, 200, now + ms(3))
        .await?
        .unwrap();

    let board = engine.leaderboard(auction.id, 10).await?;
    let names: Vec<_> = board.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(names, ["bob", "alice", "carol"]);
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[2].rank, 3);
    Ok(())
}

#[tokio::test]
async fn anti_snipe_triggers_inside_the_window_for_top_ranks() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    // 10s round, 5s window, 30s extension, threshold 3 (engine defaults)
    let (auction, round) = running_auction(&engine, auction_input(1, 1, now), now).await?;
    let alice = funded_user(&engine, "alice", 1_000, now).await?;

    // just outside the window: end_at - now = window + 1ms
    let outside = round.end_at - ms(5_001);
    let receipt = engine
        .place_bid(alice.id, auction.id, 100, outside)
        .await?
        .unwrap();
    assert!(!receipt.anti_snipe_triggered);

    // just inside: end_at - now = window - 1ms
    let inside = round.end_at - ms(4_999);
    let receipt = engine
        .place_bid(alice.id, auction.id, 50, inside)
        .await?
        .unwrap();
    assert!(receipt.anti_snipe_triggered);

    let extended = engine.store().get_round(round.id).await?.unwrap();
    assert_eq!(extended.end_at, round.end_at + ms(30_000));
    assert_eq!(extended.original_end_at, round.original_end_at);
    Ok(())
}

#[tokio::test]
async fn anti_snipe_ignores_ranks_below_the_threshold() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let (auction, round) = running_auction(&engine, auction_input(1, 1, now), now).await?;

    for (i, name) in ["alice", "bob", "carol"].into_iter().enumerate() {
        let user = funded_user(&engine, name, 1_000, now).await?;
        engine
            .place_bid(user.id, auction.id, 500 - i as i64, now + ms(i as i64 + 1))
            .await?
            .unwrap();
    }

    // a fourth bidder lands inside the window but only at rank 4
    let dave = funded_user(&engine, "dave", 1_000, now).await?;
    let receipt = engine
        .place_bid(dave.id, auction.id, 10, round.end_at - ms(1_000))
        .await?
        .unwrap();
    assert_eq!(receipt.rank, 4);
    assert!(!receipt.anti_snipe_triggered);

    let unchanged = engine.store().get_round(round.id).await?.unwrap();
    assert_eq!(unchanged.end_at, round.end_at);
    Ok(())
}

#[tokio::test]
async fn extensions_are_monotonic() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let (_auction, round) = running_auction(&engine, auction_input(1, 1, now), now).await?;

    let far = round.end_at + ms(30_000);
    let extended = engine.store().extend_round(round.id, far, now).await?;
    assert_eq!(extended.end_at, far);

    // a later, shorter extension never pulls the deadline back
    let near = round.end_at + ms(10_000);
    let still = engine.store().extend_round(round.id, near, now).await?;
    assert_eq!(still.end_at, far);
    Ok(())
}

mod common;

use common::{assert_money_invariant, engine, funded_user, ms, t0};
use sba_core::models::{AuctionId, BidId, LedgerKind};
use sba_core::ports::{WalletFailure, WalletRepository as _};
use sba_core::services::Rejection;

#[tokio::test]
async fn login_is_idempotent_per_username() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();

    let first = engine.login("alice", now).await?.unwrap();
    let second = engine.login("alice", now + ms(5)).await?.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.available, 0);
    assert_eq!(second.frozen, 0);
    Ok(())
}

#[tokio::test]
async fn login_rejects_out_of_bounds_usernames() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();

    assert!(matches!(
        engine.login("ab", now).await?,
        Err(Rejection::Invalid(_))
    ));
    assert!(matches!(
        engine.login(&"x".repeat(51), now).await?,
        Err(Rejection::Invalid(_))
    ));
    assert!(engine.login("abc", now).await?.is_ok());
    Ok(())
}

#[tokio::test]
async fn deposit_updates_balance_and_ledger() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();

    let user = funded_user(&engine, "alice", 500, now).await?;
    assert_eq!(user.available, 500);
    assert_eq!(user.frozen, 0);

    let entries = engine.store().ledger_entries(user.id, 10).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, LedgerKind::Deposit);
    assert_eq!(entries[0].amount, 500);
    assert_eq!(entries[0].balance_before, 0);
    assert_eq!(entries[0].balance_after, 500);

    assert_money_invariant(engine.store()).await?;
    Ok(())
}

#[tokio::test]
async fn freeze_then_refund_restores_available() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let user = funded_user(&engine, "alice", 500, now).await?;
    let auction_id = AuctionId::random();
    let bid_id = BidId::random();

    let frozen = engine
        .store()
        .freeze(user.id, 200, auction_id, bid_id, now + ms(1))
        .await?
        .unwrap();
    assert_eq!(frozen.available, 300);
    assert_eq!(frozen.frozen, 200);

    let refunded = engine
        .store()
        .refund(user.id, 200, auction_id, bid_id, now + ms(2))
        .await?
        .unwrap();
    assert_eq!(refunded.available, 500);
    assert_eq!(refunded.frozen, 0);

    assert_money_invariant(engine.store()).await?;
    Ok(())
}

#[tokio::test]
async fn freeze_fails_without_funds_and_writes_nothing() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let user = funded_user(&engine, "alice", 50, now).await?;

    let outcome = engine
        .store()
        .freeze(user.id, 100, AuctionId::random(), BidId::random(), now + ms(1))
        .await?;
    assert_eq!(outcome.unwrap_err(), WalletFailure::InsufficientAvailable);

    // only the deposit is in the log; the refused freeze left no trace
    let entries = engine.store().ledger_entries(user.id, 10).await?;
    assert_eq!(entries.len(), 1);
    let reloaded = engine.store().get_user(user.id).await?.unwrap();
    assert_eq!(reloaded.available, 50);
    assert_eq!(reloaded.frozen, 0);
    Ok(())
}

#[tokio::test]
async fn consume_win_spends_frozen_only() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let user = funded_user(&engine, "alice", 500, now).await?;
    let auction_id = AuctionId::random();
    let bid_id = BidId::random();

    engine
        .store()
        .freeze(user.id, 200, auction_id, bid_id, now + ms(1))
        .await?
        .unwrap();
    let after = engine
        .store()
        .consume_win(user.id, 200, auction_id, bid_id, now + ms(2))
        .await?
        .unwrap();
    assert_eq!(after.available, 300);
    assert_eq!(after.frozen, 0);

    // consuming again finds nothing frozen
    let outcome = engine
        .store()
        .consume_win(user.id, 1, auction_id, bid_id, now + ms(3))
        .await?;
    assert_eq!(outcome.unwrap_err(), WalletFailure::InsufficientFrozen);
    Ok(())
}

#[tokio::test]
async fn ledger_records_balances_on_both_sides() -> anyhow::Result<()> {
    let engine = engine().await?;
    let now = t0();
    let user = funded_user(&engine, "alice", 300, now).await?;
    let auction_id = AuctionId::random();
    let bid_id = BidId::random();

    engine
        .store()
        .freeze(user.id, 100, auction_id, bid_id, now + ms(1))
        .await?
        .unwrap();
    engine
        .store()
        .unfreeze(user.id, 100, auction_id, bid_id, now + ms(2))
        .await?
        .unwrap();

    let entries = engine.store().ledger_entries(user.id, 10).await?;
    // newest first: unfreeze, freeze, deposit
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].kind, LedgerKind::Unfreeze);
    assert_eq!(entries[0].frozen_before, 100);
    assert_eq!(entries[0].frozen_after, 0);
    assert_eq!(entries[1].kind, LedgerKind::Freeze);
    assert_eq!(entries[1].balance_before, 300);
    assert_eq!(entries[1].balance_after, 200);
    assert_eq!(entries[2].kind, LedgerKind::Deposit);
    Ok(())
}

use super::Repository;
use crate::models::{AuctionId, BidId, LedgerEntry, User, UserId};
use std::future::Future;
use time::OffsetDateTime;

/// A wallet operation that could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletFailure {
    /// `available` does not cover the requested freeze.
    InsufficientAvailable,
    /// `frozen` does not cover the requested release or consumption. Outside
    /// of direct ledger use this indicates a broken money invariant.
    InsufficientFrozen,
}

/// Per-user balances plus the append-only transaction log.
///
/// Every operation is atomic end-to-end with its ledger row: either the
/// balance change and the entry both commit, or neither does.
pub trait WalletRepository: Repository {
    /// Fetch a user by id.
    fn get_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send;

    /// Fetch the user with the given username, creating them with zero
    /// balances (and the provided id) on first login.
    fn ensure_user(
        &self,
        id: UserId,
        username: &str,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<User, Self::Error>> + Send;

    /// Add external funds to `available`. The amount is positive. Resolves
    /// to `None` when the user does not exist.
    fn deposit(
        &self,
        user_id: UserId,
        amount: i64,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send;

    /// Move `amount` from `available` to `frozen` against a bid.
    fn freeze(
        &self,
        user_id: UserId,
        amount: i64,
        auction_id: AuctionId,
        bid_id: BidId,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<Result<User, WalletFailure>, Self::Error>> + Send;

    /// Return `amount` from `frozen` to `available` outside settlement.
    fn unfreeze(
        &self,
        user_id: UserId,
        amount: i64,
        auction_id: AuctionId,
        bid_id: BidId,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<Result<User, WalletFailure>, Self::Error>> + Send;

    /// Spend `amount` of `frozen` for a winning bid.
    fn consume_win(
        &self,
        user_id: UserId,
        amount: i64,
        auction_id: AuctionId,
        bid_id: BidId,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<Result<User, WalletFailure>, Self::Error>> + Send;

    /// Return `amount` from `frozen` to `available` for a losing bid.
    fn refund(
        &self,
        user_id: UserId,
        amount: i64,
        auction_id: AuctionId,
        bid_id: BidId,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<Result<User, WalletFailure>, Self::Error>> + Send;

    /// The user's ledger entries, newest first.
    fn ledger_entries(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<LedgerEntry>, Self::Error>> + Send;
}

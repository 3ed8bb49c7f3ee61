use super::Repository;
use crate::models::{AuctionId, Bid, BidId, LeaderboardEntry, RoundId, UserId};
use std::future::Future;
use time::OffsetDateTime;

/// A bid admission the store refused inside its transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidFailure {
    /// `available` does not cover the freeze.
    InsufficientFunds,
    /// The round stopped accepting bids between the admission check and the
    /// write (it was taken into settlement or its deadline passed).
    RoundClosed,
}

/// The write half of a bid admission, applied in one transaction.
#[derive(Debug, Clone)]
pub struct BidWrite {
    /// Id for the bid row: the existing bid's id on a raise, a fresh id on
    /// a first bid.
    pub bid_id: BidId,
    /// Owning auction.
    pub auction_id: AuctionId,
    /// Round being bid into.
    pub round_id: RoundId,
    /// The bidder.
    pub user_id: UserId,
    /// Amount to freeze and add: the full bid on a first bid, the increment
    /// on a raise.
    pub amount: i64,
    /// Admission timestamp.
    pub now: OffsetDateTime,
}

/// Persistence for bids, including the ranked reads settlement and the
/// leaderboard are built on.
pub trait BidRepository: Repository {
    /// The user's bid in the round, regardless of status.
    fn find_bid(
        &self,
        auction_id: AuctionId,
        round_id: RoundId,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<Bid>, Self::Error>> + Send;

    /// Place or raise a bid in one transaction: re-verify the round is
    /// still open, freeze the funds with their ledger row, and insert the
    /// bid or add to the existing amount. The freeze and the bid write
    /// commit together, so no observer ever sees a bid without its frozen
    /// funds.
    fn place_bid(
        &self,
        write: &BidWrite,
    ) -> impl Future<Output = Result<Result<Bid, BidFailure>, Self::Error>> + Send;

    /// Active bids of the round ordered by `(amount DESC, created_at ASC)`.
    fn ranked_bids(
        &self,
        round_id: RoundId,
        limit: Option<u32>,
    ) -> impl Future<Output = Result<Vec<Bid>, Self::Error>> + Send;

    /// Top-K of the round joined with usernames.
    fn leaderboard(
        &self,
        round_id: RoundId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, Self::Error>> + Send;

    /// Number of active bids in the round.
    fn count_active_bids(
        &self,
        round_id: RoundId,
    ) -> impl Future<Output = Result<u32, Self::Error>> + Send;

    /// 1 + the number of active bids strictly ranked above the given bid.
    fn rank_of(
        &self,
        round_id: RoundId,
        bid: &Bid,
    ) -> impl Future<Output = Result<u32, Self::Error>> + Send;

    /// Amount of the `n`-th ranked active bid (1-based), if that many exist.
    fn nth_ranked_amount(
        &self,
        round_id: RoundId,
        n: u32,
    ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send;

    /// All of a user's bids, newest first.
    fn bids_for_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Bid>, Self::Error>> + Send;

    /// The user's winning bids, newest first.
    fn wins_for_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Bid>, Self::Error>> + Send;
}

use super::{JobRequest, Repository};
use crate::models::{AuctionId, BidId, Round, RoundId, UserId};
use std::future::Future;
use time::OffsetDateTime;

/// A winning bid resolved by settlement.
#[derive(Debug, Clone)]
pub struct SettledWin {
    /// The winning bid.
    pub bid_id: BidId,
    /// Its owner, whose frozen funds are consumed.
    pub user_id: UserId,
    /// The consumed amount.
    pub amount: i64,
    /// Sequential item number across the whole auction.
    pub item_number: u32,
}

/// A losing bid resolved by settlement.
#[derive(Debug, Clone)]
pub struct SettledRefund {
    /// The losing bid.
    pub bid_id: BidId,
    /// Its owner, whose frozen funds are released.
    pub user_id: UserId,
    /// The released amount.
    pub amount: i64,
}

/// The round that follows a settled one.
#[derive(Debug, Clone)]
pub struct NextRound {
    /// The new round, `status = active`.
    pub round: Round,
    /// Its `close-round` job, scheduled at the round's `end_at` in the same
    /// transaction as the settlement.
    pub close_job: JobRequest,
}

/// Everything a settlement writes, applied as one transaction.
///
/// The plan is computed by the round service from a ranked snapshot of the
/// round's active bids; the store applies it atomically so a torn settlement
/// is either rolled back whole or completed whole by a retry.
#[derive(Debug, Clone)]
pub struct SettlementPlan {
    /// The round being settled.
    pub round_id: RoundId,
    /// Its auction.
    pub auction_id: AuctionId,
    /// Its 1-based number.
    pub round_number: u32,
    /// Winners in rank order; each consumes its frozen amount.
    pub winners: Vec<SettledWin>,
    /// Losers; each gets its frozen amount back.
    pub losers: Vec<SettledRefund>,
    /// `distributed_items` after this settlement.
    pub distributed_items: u32,
    /// `avg_price` after this settlement.
    pub avg_price: f64,
    /// The follow-up round, when items and rounds remain.
    pub next_round: Option<NextRound>,
    /// Whether the auction is finished after this settlement.
    pub complete_auction: bool,
    /// Settlement timestamp.
    pub now: OffsetDateTime,
}

/// Persistence for the round lifecycle and the atomic settlement.
pub trait RoundRepository: Repository {
    /// Fetch a round by id.
    fn get_round(
        &self,
        round_id: RoundId,
    ) -> impl Future<Output = Result<Option<Round>, Self::Error>> + Send;

    /// The auction's single `active` round, if any.
    fn active_round(
        &self,
        auction_id: AuctionId,
    ) -> impl Future<Output = Result<Option<Round>, Self::Error>> + Send;

    /// Compare-and-set `active -> processing`. Returns `false` when the
    /// round is in any other state; this is the gate that makes settlement
    /// single-winner and retries idempotent.
    fn mark_round_processing(
        &self,
        round_id: RoundId,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Explicit recovery: put a `processing` round back to `active`. Used
    /// only when settlement bails out before writing anything.
    fn revert_round_processing(
        &self,
        round_id: RoundId,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Move the round's `end_at` forward to `new_end_at`. The stored value
    /// never decreases; the returned round carries whatever end the store
    /// settled on.
    fn extend_round(
        &self,
        round_id: RoundId,
        new_end_at: OffsetDateTime,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<Round, Self::Error>> + Send;

    /// Apply a settlement plan in one transaction: bid statuses and item
    /// numbers, wallet consumption and refunds with their ledger rows,
    /// auction statistics, the round's `completed` transition, and the next
    /// round plus its `close-round` job (or the auction's completion).
    ///
    /// The inner error reports a broken money invariant discovered while
    /// applying the plan; the transaction is rolled back and the round left
    /// in `processing` for operator intervention.
    fn apply_settlement(
        &self,
        plan: &SettlementPlan,
    ) -> impl Future<Output = Result<Result<(), String>, Self::Error>> + Send;

    /// All `active` rounds across auctions, for startup reconciliation.
    fn list_active_rounds(&self) -> impl Future<Output = Result<Vec<Round>, Self::Error>> + Send;

    /// Rounds stuck in `processing` since before `older_than`. Reported,
    /// never auto-reverted.
    fn list_stuck_rounds(
        &self,
        older_than: OffsetDateTime,
    ) -> impl Future<Output = Result<Vec<Round>, Self::Error>> + Send;
}

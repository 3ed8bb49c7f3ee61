use super::{JobRequest, Repository};
use crate::models::{Auction, AuctionId, Round};
use std::future::Future;
use time::OffsetDateTime;

/// Persistence for the auction aggregate.
pub trait AuctionRepository: Repository {
    /// Insert a freshly created auction.
    fn insert_auction(
        &self,
        auction: &Auction,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Fetch an auction by id.
    fn get_auction(
        &self,
        auction_id: AuctionId,
    ) -> impl Future<Output = Result<Option<Auction>, Self::Error>> + Send;

    /// All auctions, newest first.
    fn list_auctions(&self) -> impl Future<Output = Result<Vec<Auction>, Self::Error>> + Send;

    /// Auctions still waiting to start.
    fn list_pending_auctions(
        &self,
    ) -> impl Future<Output = Result<Vec<Auction>, Self::Error>> + Send;

    /// Atomically start an auction: compare-and-set `pending -> active`,
    /// set `current_round = 1`, insert the opening round, and enqueue its
    /// `close-round` job — all in one transaction.
    ///
    /// Returns `false` without side effects when the CAS loses (the auction
    /// was already started or completed), which makes the operation
    /// idempotent.
    fn start_auction_txn(
        &self,
        auction_id: AuctionId,
        round: &Round,
        close_job: &JobRequest,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}

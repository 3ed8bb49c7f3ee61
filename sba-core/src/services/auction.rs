use super::{Engine, EngineResult, Rejection};
use crate::models::{
    ActiveRoundSummary, Auction, AuctionEvent, AuctionId, AuctionStatus, AuctionSummary,
    LeaderboardEntry, MyBid, NewAuction, Round, RoundId, RoundStatus, UserId,
};
use crate::ports::{
    AuctionRepository as _, AuctionStore, BidRepository as _, EventSink, JobRepository as _,
    JobRequest, RoundRepository as _,
};
use time::{Duration, OffsetDateTime};
use tracing::{Level, event};

impl<R: AuctionStore, S: EventSink> Engine<R, S> {
    /// Create an auction and schedule its start.
    ///
    /// Omitted fields are populated from the engine defaults. The auction is
    /// persisted `pending`; a `start-auction` job fires at `start_at` (the
    /// fallback poller rescues it if the schedule write is lost).
    pub async fn create_auction(
        &self,
        input: NewAuction,
        now: OffsetDateTime,
    ) -> EngineResult<Auction, R::Error> {
        if let Err(reason) = validate_new_auction(&input) {
            return Ok(Err(Rejection::Invalid(reason)));
        }

        let items_per_round = input
            .winners_per_round
            .unwrap_or_else(|| input.total_items.div_ceil(input.total_rounds));

        let auction = Auction {
            id: AuctionId::random(),
            name: input.name,
            description: input.description,
            total_items: input.total_items,
            total_rounds: input.total_rounds,
            items_per_round,
            min_bid: input.min_bid.unwrap_or(self.config.default_min_bid),
            current_round: 0,
            status: AuctionStatus::Pending,
            start_at: input.start_at,
            first_round_duration_ms: input
                .first_round_duration_ms
                .unwrap_or(self.config.default_first_round_duration_ms),
            other_round_duration_ms: input
                .other_round_duration_ms
                .unwrap_or(self.config.default_other_round_duration_ms),
            anti_snipe_window_ms: self.config.anti_snipe_window_ms,
            anti_snipe_extension_ms: self.config.anti_snipe_extension_ms,
            anti_snipe_threshold: self.config.anti_snipe_threshold,
            distributed_items: 0,
            avg_price: 0.0,
            created_at: now,
        };

        self.store.insert_auction(&auction).await?;
        self.store
            .schedule_job(
                &JobRequest::start_auction(
                    auction.id,
                    auction.start_at,
                    self.config.start_auction_attempts,
                ),
                now,
            )
            .await?;

        event!(Level::INFO, auction = %auction.id, name = %auction.name, "auction created");
        Ok(Ok(auction))
    }

    /// Start a pending auction: open round 1 and schedule its closure.
    ///
    /// Idempotent; resolves to `None` when the auction was already started
    /// or completed (another worker, or a duplicate job delivery).
    pub async fn start_auction(
        &self,
        auction_id: AuctionId,
        now: OffsetDateTime,
    ) -> EngineResult<Option<Round>, R::Error> {
        let Some(auction) = self.store.get_auction(auction_id).await? else {
            return Ok(Err(Rejection::NotFound("auction")));
        };
        if auction.status != AuctionStatus::Pending {
            return Ok(Ok(None));
        }

        let end_at = now + Duration::milliseconds(auction.first_round_duration_ms);
        let round = Round {
            id: RoundId::random(),
            auction_id,
            round_number: 1,
            start_at: now,
            end_at,
            original_end_at: end_at,
            status: RoundStatus::Active,
            winners_count: auction.items_per_round.min(auction.total_items),
            updated_at: now,
        };
        let close_job =
            JobRequest::close_round(round.id, round.end_at, self.config.close_round_attempts);

        if !self
            .store
            .start_auction_txn(auction_id, &round, &close_job, now)
            .await?
        {
            // lost the CAS to a concurrent starter
            return Ok(Ok(None));
        }

        event!(Level::INFO, auction = %auction_id, end_at = %round.end_at, "auction started");
        self.events.broadcast(
            auction_id,
            AuctionEvent::AuctionStart {
                auction_id,
                name: auction.name,
                round_number: round.round_number,
                end_at: round.end_at,
            },
        );
        self.events.publish(
            auction_id,
            AuctionEvent::RoundStart {
                round_number: round.round_number,
                end_at: round.end_at,
                winners_count: round.winners_count,
            },
        );

        Ok(Ok(Some(round)))
    }

    /// All auctions, newest first.
    pub async fn list_auctions(&self) -> Result<Vec<Auction>, R::Error> {
        self.store.list_auctions().await
    }

    /// An auction joined with its active round, if any.
    pub async fn auction_summary(
        &self,
        auction_id: AuctionId,
    ) -> EngineResult<AuctionSummary, R::Error> {
        let Some(auction) = self.store.get_auction(auction_id).await? else {
            return Ok(Err(Rejection::NotFound("auction")));
        };

        let active_round = match self.store.active_round(auction_id).await? {
            Some(round) => {
                let min_bid_for_win = self.min_bid_for_win(&round).await?;
                let total_bids = self.store.count_active_bids(round.id).await?;
                Some(ActiveRoundSummary {
                    id: round.id,
                    round_number: round.round_number,
                    start_at: round.start_at,
                    end_at: round.end_at,
                    winners_count: round.winners_count,
                    min_bid_for_win,
                    total_bids,
                })
            }
            None => None,
        };

        Ok(Ok(AuctionSummary {
            auction,
            active_round,
        }))
    }

    /// Top-K of the auction's active round; empty when no round is running.
    pub async fn leaderboard(
        &self,
        auction_id: AuctionId,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, R::Error> {
        match self.store.active_round(auction_id).await? {
            Some(round) => self.store.leaderboard(round.id, limit).await,
            None => Ok(Vec::new()),
        }
    }

    /// Number of active bids in the auction's active round.
    pub async fn active_bid_count(&self, auction_id: AuctionId) -> Result<u32, R::Error> {
        match self.store.active_round(auction_id).await? {
            Some(round) => self.store.count_active_bids(round.id).await,
            None => Ok(0),
        }
    }

    /// The caller's bid in the active round, with its live rank.
    pub async fn my_bid(
        &self,
        auction_id: AuctionId,
        user_id: UserId,
    ) -> Result<Option<MyBid>, R::Error> {
        let Some(round) = self.store.active_round(auction_id).await? else {
            return Ok(None);
        };
        let Some(bid) = self.store.find_bid(auction_id, round.id, user_id).await? else {
            return Ok(None);
        };
        let rank = self.store.rank_of(round.id, &bid).await?;
        Ok(Some(MyBid {
            id: bid.id,
            amount: bid.amount,
            rank,
            status: bid.status,
        }))
    }
}

fn validate_new_auction(input: &NewAuction) -> Result<(), String> {
    if input.name.trim().is_empty() {
        return Err("name must not be empty".to_owned());
    }
    if input.total_items == 0 {
        return Err("totalItems must be positive".to_owned());
    }
    if input.total_rounds == 0 {
        return Err("totalRounds must be at least 1".to_owned());
    }
    if input.winners_per_round.is_some_and(|w| w == 0) {
        return Err("winnersPerRound must be positive".to_owned());
    }
    if input.min_bid.is_some_and(|m| m < 1) {
        return Err("minBid must be at least 1".to_owned());
    }
    if input.first_round_duration_ms.is_some_and(|d| d <= 0)
        || input.other_round_duration_ms.is_some_and(|d| d <= 0)
    {
        return Err("round durations must be positive".to_owned());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> NewAuction {
        NewAuction {
            name: "drop".to_owned(),
            description: None,
            total_items: 10,
            total_rounds: 3,
            winners_per_round: None,
            min_bid: None,
            start_at: OffsetDateTime::UNIX_EPOCH,
            first_round_duration_ms: None,
            other_round_duration_ms: None,
        }
    }

    #[test]
    fn items_per_round_defaults_to_ceiling() {
        let input = base_input();
        assert_eq!(input.total_items.div_ceil(input.total_rounds), 4);
    }

    #[test]
    fn rejects_zero_items() {
        let mut input = base_input();
        input.total_items = 0;
        assert!(validate_new_auction(&input).is_err());
    }

    #[test]
    fn rejects_blank_name() {
        let mut input = base_input();
        input.name = "  ".to_owned();
        assert!(validate_new_auction(&input).is_err());
    }

    #[test]
    fn accepts_minimal_input() {
        assert!(validate_new_auction(&base_input()).is_ok());
    }
}

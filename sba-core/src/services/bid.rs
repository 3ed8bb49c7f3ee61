use super::{Engine, EngineResult, Rejection};
use crate::models::{
    Auction, AuctionEvent, AuctionId, AuctionStatus, Bid, BidId, BidReceipt, Round, UserId,
};
use crate::ports::{
    AuctionRepository as _, AuctionStore, BidFailure, BidRepository as _, BidWrite, EventSink,
    JobRepository as _, JobRequest, RoundRepository as _,
};
use time::{Duration, OffsetDateTime};
use tracing::{Level, event};

/// A bid admitted under the per-(auction, user) lock, before events go out.
struct AdmittedBid {
    bid: Bid,
    rank: u32,
    total_bids: u32,
    snipe: Option<(OffsetDateTime, i64)>,
}

impl<R: AuctionStore, S: EventSink> Engine<R, S> {
    /// Place a new bid or raise an existing one.
    ///
    /// Serialized per `(auction, user)` by the distributed lock. The freeze
    /// and the bid write commit together; an anti-snipe trigger extends the
    /// round and moves its `close-round` job before the lock releases.
    /// Events go out afterwards.
    pub async fn place_bid(
        &self,
        user_id: UserId,
        auction_id: AuctionId,
        amount: i64,
        now: OffsetDateTime,
    ) -> EngineResult<BidReceipt, R::Error> {
        if amount < 1 {
            return Ok(Err(Rejection::Invalid(
                "bid amount must be at least 1".to_owned(),
            )));
        }

        let key = format!("bid:{auction_id}:{user_id}");
        let admitted = match self
            .with_lock(&key, async || {
                self.admit_bid(user_id, auction_id, amount, now).await
            })
            .await?
        {
            Ok(admitted) => admitted,
            Err(rejection) => return Ok(Err(rejection)),
        };

        self.events.publish(
            auction_id,
            AuctionEvent::BidNew {
                rank: admitted.rank,
                amount: admitted.bid.amount,
                user_id,
                total_bids: admitted.total_bids,
            },
        );
        if let Some((new_end_at, extension)) = admitted.snipe {
            event!(
                Level::INFO,
                auction = %auction_id,
                round = %admitted.bid.round_id,
                new_end_at = %new_end_at,
                "anti-snipe extension"
            );
            self.events.publish(
                auction_id,
                AuctionEvent::AntiSnipe {
                    new_end_at,
                    extension,
                },
            );
        }
        let leaderboard = self
            .store
            .leaderboard(admitted.bid.round_id, self.config.leaderboard_size)
            .await?;
        self.events
            .publish(auction_id, AuctionEvent::LeaderboardUpdate(leaderboard));

        Ok(Ok(BidReceipt {
            anti_snipe_triggered: admitted.snipe.is_some(),
            rank: admitted.rank,
            total_bids: admitted.total_bids,
            bid: admitted.bid,
        }))
    }

    /// The admission path proper, run while holding the bid lock.
    async fn admit_bid(
        &self,
        user_id: UserId,
        auction_id: AuctionId,
        amount: i64,
        now: OffsetDateTime,
    ) -> EngineResult<AdmittedBid, R::Error> {
        let Some(auction) = self.store.get_auction(auction_id).await? else {
            return Ok(Err(Rejection::NotFound("auction")));
        };
        if auction.status != AuctionStatus::Active {
            return Ok(Err(Rejection::AuctionNotActive));
        }
        if amount < auction.min_bid {
            return Ok(Err(Rejection::BelowMinimum {
                min_bid: auction.min_bid,
            }));
        }
        let Some(round) = self.store.active_round(auction_id).await? else {
            return Ok(Err(Rejection::NoActiveRound));
        };
        if now > round.end_at {
            return Ok(Err(Rejection::RoundEnded));
        }

        // The lock serializes us against ourselves, so any existing row is
        // this user's earlier bid in this round and still active.
        let existing = self.store.find_bid(auction_id, round.id, user_id).await?;
        let write = BidWrite {
            bid_id: existing.as_ref().map(|b| b.id).unwrap_or_else(BidId::random),
            auction_id,
            round_id: round.id,
            user_id,
            amount,
            now,
        };
        let bid = match self.store.place_bid(&write).await? {
            Ok(bid) => bid,
            Err(BidFailure::InsufficientFunds) => return Ok(Err(Rejection::InsufficientFunds)),
            Err(BidFailure::RoundClosed) => return Ok(Err(Rejection::RoundEnded)),
        };

        let rank = self.store.rank_of(round.id, &bid).await?;
        let total_bids = self.store.count_active_bids(round.id).await?;

        let snipe = self.check_anti_snipe(&auction, &round, rank, now).await?;

        Ok(Ok(AdmittedBid {
            bid,
            rank,
            total_bids,
            snipe,
        }))
    }

    /// Extend the round when an accepted bid lands inside the anti-snipe
    /// window and ranks within the threshold.
    async fn check_anti_snipe(
        &self,
        auction: &Auction,
        round: &Round,
        rank: u32,
        now: OffsetDateTime,
    ) -> Result<Option<(OffsetDateTime, i64)>, R::Error> {
        let remaining_ms = (round.end_at - now).whole_milliseconds();
        if remaining_ms > auction.anti_snipe_window_ms as i128
            || rank > auction.anti_snipe_threshold
        {
            return Ok(None);
        }

        let new_end_at = round.end_at + Duration::milliseconds(auction.anti_snipe_extension_ms);
        let updated = self.store.extend_round(round.id, new_end_at, now).await?;
        self.store
            .reschedule_job(
                &JobRequest::close_round(
                    round.id,
                    updated.end_at,
                    self.config.close_round_attempts,
                ),
                now,
            )
            .await?;

        Ok(Some((updated.end_at, auction.anti_snipe_extension_ms)))
    }

    /// The smallest amount that currently wins an item in the round: the
    /// `winners_count`-th ranked bid's amount, or 1 while the round is
    /// undersubscribed.
    pub async fn min_bid_for_win(&self, round: &Round) -> Result<i64, R::Error> {
        Ok(self
            .store
            .nth_ranked_amount(round.id, round.winners_count)
            .await?
            .unwrap_or(1))
    }
}

use super::{Engine, EngineResult, Rejection};
use crate::models::{AuctionEvent, AuctionId, Round, RoundId, RoundStatus};
use crate::ports::{
    AuctionRepository as _, AuctionStore, BidRepository as _, EventSink, JobRepository as _,
    JobRequest, NextRound, RoundRepository as _, SettledRefund, SettledWin, SettlementPlan,
};
use time::{Duration, OffsetDateTime};
use tracing::{Level, event};

/// What a `process_round` invocation did.
#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    /// The round was settled by this invocation.
    Settled {
        /// The owning auction.
        auction_id: AuctionId,
        /// The settled round's number.
        round_number: u32,
        /// Items actually awarded.
        winners: u32,
        /// The follow-up round, when one was created.
        next_round: Option<Round>,
        /// Whether this settlement finished the auction.
        auction_completed: bool,
    },
    /// Another worker is settling or already settled the round.
    Skipped,
    /// A stale delivery fired before the (extended) deadline; the close job
    /// was pointed back at the real `end_at`.
    Rescheduled {
        /// The round's actual close time.
        end_at: OffsetDateTime,
    },
}

impl<R: AuctionStore, S: EventSink> Engine<R, S> {
    /// Settle a round: resolve winners and refunds, update auction
    /// statistics, and open the next round or complete the auction.
    ///
    /// Serialized per round by the distributed lock and gated by the
    /// `active -> processing` compare-and-set, so repeated invocations are
    /// safe: the loser of the CAS returns [`SettlementOutcome::Skipped`].
    pub async fn process_round(
        &self,
        round_id: RoundId,
        now: OffsetDateTime,
    ) -> EngineResult<SettlementOutcome, R::Error> {
        let key = format!("round:{round_id}");
        let outcome = match self
            .with_lock(&key, async || self.settle_round(round_id, now).await)
            .await?
        {
            Ok(outcome) => outcome,
            Err(rejection) => return Ok(Err(rejection)),
        };

        if let SettlementOutcome::Settled {
            auction_id,
            round_number,
            winners,
            next_round,
            auction_completed,
        } = &outcome
        {
            self.events.publish(
                *auction_id,
                AuctionEvent::RoundEnd {
                    round_number: *round_number,
                    winners_count: *winners,
                },
            );
            if let Some(next) = next_round {
                self.events.publish(
                    *auction_id,
                    AuctionEvent::RoundStart {
                        round_number: next.round_number,
                        end_at: next.end_at,
                        winners_count: next.winners_count,
                    },
                );
            } else if *auction_completed {
                self.events.broadcast(
                    *auction_id,
                    AuctionEvent::AuctionComplete {
                        auction_id: *auction_id,
                    },
                );
            }
        }

        Ok(Ok(outcome))
    }

    /// The settlement proper, run while holding the round lock.
    async fn settle_round(
        &self,
        round_id: RoundId,
        now: OffsetDateTime,
    ) -> EngineResult<SettlementOutcome, R::Error> {
        if !self.store.mark_round_processing(round_id, now).await? {
            return Ok(Ok(SettlementOutcome::Skipped));
        }

        let Some(round) = self.store.get_round(round_id).await? else {
            return Ok(Err(Rejection::NotFound("round")));
        };

        // At-least-once delivery can replay a close job that was superseded
        // by an anti-snipe reschedule. Put the round back and point the job
        // at the real deadline.
        if round.end_at > now {
            self.store.revert_round_processing(round_id, now).await?;
            self.store
                .reschedule_job(
                    &JobRequest::close_round(
                        round_id,
                        round.end_at,
                        self.config.close_round_attempts,
                    ),
                    now,
                )
                .await?;
            return Ok(Ok(SettlementOutcome::Rescheduled {
                end_at: round.end_at,
            }));
        }

        let Some(auction) = self.store.get_auction(round.auction_id).await? else {
            // data-integrity failure; undo the CAS and surface it
            self.store.revert_round_processing(round_id, now).await?;
            event!(Level::ERROR, round = %round_id, "settling a round whose auction is missing");
            return Ok(Err(Rejection::NotFound("auction")));
        };

        let bids = self.store.ranked_bids(round_id, None).await?;
        let winner_count = (round.winners_count as usize).min(bids.len());

        let mut winners = Vec::with_capacity(winner_count);
        let mut total_spent = 0i64;
        for (i, bid) in bids[..winner_count].iter().enumerate() {
            total_spent += bid.amount;
            winners.push(SettledWin {
                bid_id: bid.id,
                user_id: bid.user_id,
                amount: bid.amount,
                item_number: auction.distributed_items + 1 + i as u32,
            });
        }
        let losers = bids[winner_count..]
            .iter()
            .map(|bid| SettledRefund {
                bid_id: bid.id,
                user_id: bid.user_id,
                amount: bid.amount,
            })
            .collect::<Vec<_>>();

        let distributed_items = auction.distributed_items + winner_count as u32;
        let avg_price = if distributed_items == 0 {
            0.0
        } else {
            (auction.avg_price * auction.distributed_items as f64 + total_spent as f64)
                / distributed_items as f64
        };

        let has_more =
            distributed_items < auction.total_items && round.round_number < auction.total_rounds;
        let next_round = has_more.then(|| {
            let end_at = now + Duration::milliseconds(auction.other_round_duration_ms);
            let next = Round {
                id: RoundId::random(),
                auction_id: auction.id,
                round_number: round.round_number + 1,
                start_at: now,
                end_at,
                original_end_at: end_at,
                status: RoundStatus::Active,
                winners_count: auction
                    .items_per_round
                    .min(auction.total_items - distributed_items),
                updated_at: now,
            };
            let close_job =
                JobRequest::close_round(next.id, next.end_at, self.config.close_round_attempts);
            NextRound {
                round: next,
                close_job,
            }
        });

        let plan = SettlementPlan {
            round_id,
            auction_id: auction.id,
            round_number: round.round_number,
            winners,
            losers,
            distributed_items,
            avg_price,
            next_round,
            complete_auction: !has_more,
            now,
        };

        if let Err(violation) = self.store.apply_settlement(&plan).await? {
            // the round stays in processing, flagged for the operator
            event!(
                Level::ERROR,
                round = %round_id,
                auction = %auction.id,
                violation = %violation,
                "settlement halted on invariant violation"
            );
            return Ok(Err(Rejection::Invariant(violation)));
        }

        event!(
            Level::INFO,
            auction = %auction.id,
            round = round.round_number,
            winners = winner_count,
            refunded = plan.losers.len(),
            completed = plan.complete_auction,
            "round settled"
        );

        Ok(Ok(SettlementOutcome::Settled {
            auction_id: auction.id,
            round_number: round.round_number,
            winners: winner_count as u32,
            next_round: plan.next_round.map(|n| n.round),
            auction_completed: plan.complete_auction,
        }))
    }
}

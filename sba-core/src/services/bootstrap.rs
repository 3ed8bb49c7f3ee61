use super::{Engine, Rejection};
use crate::ports::{
    AuctionRepository as _, AuctionStore, EventSink, JobRepository as _, JobRequest,
    RoundRepository as _,
};
use time::{Duration, OffsetDateTime};
use tracing::{Level, event};

/// What startup reconciliation found and did.
#[derive(Debug, Clone, Copy, Default)]
pub struct BootstrapReport {
    /// Overdue pending auctions started immediately.
    pub started: u32,
    /// Future `start-auction` jobs (re)scheduled.
    pub scheduled_starts: u32,
    /// `close-round` jobs (re)scheduled for active rounds.
    pub scheduled_closes: u32,
    /// Rounds found stuck in `processing`, reported for the operator.
    pub stuck_rounds: u32,
    /// Finished job rows pruned.
    pub pruned_jobs: u64,
}

impl<R: AuctionStore, S: EventSink> Engine<R, S> {
    /// Reconcile outstanding auctions and rounds against the job queue.
    ///
    /// Run once per worker at startup. Scheduling is deduplicated by job
    /// key, so several workers booting at once is harmless. Rounds stuck in
    /// `processing` are reported but never auto-reverted: the original
    /// worker may still be alive holding an expired lock, and reverting
    /// would risk a double settlement.
    pub async fn bootstrap(&self, now: OffsetDateTime) -> Result<BootstrapReport, R::Error> {
        let mut report = BootstrapReport::default();

        for auction in self.store.list_pending_auctions().await? {
            if auction.start_at <= now {
                match self.start_auction(auction.id, now).await? {
                    Ok(Some(_)) => report.started += 1,
                    Ok(None) => {}
                    Err(rejection) => {
                        event!(Level::WARN, auction = %auction.id, %rejection, "bootstrap start failed");
                    }
                }
            } else if self
                .store
                .schedule_job(
                    &JobRequest::start_auction(
                        auction.id,
                        auction.start_at,
                        self.config.start_auction_attempts,
                    ),
                    now,
                )
                .await?
            {
                report.scheduled_starts += 1;
            }
        }

        for round in self.store.list_active_rounds().await? {
            if self
                .store
                .schedule_job(
                    &JobRequest::close_round(
                        round.id,
                        round.end_at,
                        self.config.close_round_attempts,
                    ),
                    now,
                )
                .await?
            {
                report.scheduled_closes += 1;
            }
        }

        let stuck_cutoff = now - Duration::milliseconds(2 * self.config.lock_ttl_ms);
        let stuck = self.store.list_stuck_rounds(stuck_cutoff).await?;
        for round in &stuck {
            event!(
                Level::ERROR,
                round = %round.id,
                auction = %round.auction_id,
                since = %round.updated_at,
                "round stuck in processing; investigate before reverting"
            );
        }
        report.stuck_rounds = stuck.len() as u32;

        report.pruned_jobs = self
            .store
            .prune_jobs(now - Duration::milliseconds(self.config.job_retention_ms))
            .await?;

        event!(
            Level::INFO,
            started = report.started,
            scheduled_starts = report.scheduled_starts,
            scheduled_closes = report.scheduled_closes,
            stuck_rounds = report.stuck_rounds,
            "bootstrap reconciliation done"
        );
        Ok(report)
    }

    /// Start any pending auction whose `start_at` has passed.
    ///
    /// The safety net behind the queue: a lost `start-auction` job only
    /// delays the auction by one poller period. Round closure has no such
    /// net on purpose; it is driven solely by the queue so duplicate
    /// settlements never race the lock from a second direction.
    pub async fn rescue_overdue_auctions(&self, now: OffsetDateTime) -> Result<u32, R::Error> {
        let mut rescued = 0;
        for auction in self.store.list_pending_auctions().await? {
            if auction.start_at > now {
                continue;
            }
            match self.start_auction(auction.id, now).await? {
                Ok(Some(_)) => {
                    event!(Level::WARN, auction = %auction.id, "poller rescued an overdue auction");
                    rescued += 1;
                }
                Ok(None) => {}
                Err(Rejection::NotFound(_)) => {}
                Err(rejection) => {
                    event!(Level::WARN, auction = %auction.id, %rejection, "poller start failed");
                }
            }
        }
        Ok(rescued)
    }

    /// The fallback poller: runs [`Self::rescue_overdue_auctions`] and job
    /// retention pruning on a coarse period, forever.
    pub async fn run_poller(&self) {
        let period = std::time::Duration::from_millis(self.config.poller_period_ms);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let now = OffsetDateTime::now_utc();
            if let Err(err) = self.rescue_overdue_auctions(now).await {
                event!(Level::WARN, err = %err, "poller pass failed");
            }
            let cutoff = now - Duration::milliseconds(self.config.job_retention_ms);
            if let Err(err) = self.store.prune_jobs(cutoff).await {
                event!(Level::WARN, err = %err, "job pruning failed");
            }
        }
    }
}

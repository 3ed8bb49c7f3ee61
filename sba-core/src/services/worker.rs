use super::{Engine, Rejection};
use crate::ports::{AuctionStore, ClaimedJob, EventSink, JobPayload, JobRepository as _};
use time::{Duration, OffsetDateTime};
use tracing::{Instrument as _, Level, event, span};

impl<R: AuctionStore, S: EventSink> Engine<R, S> {
    /// The job worker: claims due jobs and dispatches them, forever.
    ///
    /// Any number of these can run across processes; claims are exclusive
    /// and abandoned claims are redelivered after the claim timeout.
    pub async fn run_worker(&self, worker_id: &str) {
        let period = std::time::Duration::from_millis(self.config.worker_poll_ms);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(err) = self.run_due_jobs(OffsetDateTime::now_utc(), worker_id).await {
                event!(Level::WARN, worker = worker_id, err = %err, "worker pass failed");
            }
        }
    }

    /// Claim and execute one batch of due jobs. Returns how many ran.
    pub async fn run_due_jobs(
        &self,
        now: OffsetDateTime,
        worker_id: &str,
    ) -> Result<u32, R::Error> {
        let stale_before = now - Duration::milliseconds(self.config.job_claim_timeout_ms);
        let jobs = self
            .store
            .claim_due_jobs(now, stale_before, self.config.worker_batch, worker_id)
            .await?;
        let claimed = jobs.len() as u32;
        for job in jobs {
            let job_span = span!(Level::INFO, "job", key = %job.key, attempt = job.attempt);
            self.execute_job(job, now).instrument(job_span).await?;
        }
        Ok(claimed)
    }

    /// Run one claimed job and record its outcome.
    ///
    /// Domain rejections other than lock contention are permanent: retrying
    /// cannot make a missing auction appear, and an invariant breach needs
    /// an operator. Storage errors and lock timeouts requeue with backoff
    /// until the attempt budget runs out.
    async fn execute_job(&self, job: ClaimedJob, now: OffsetDateTime) -> Result<(), R::Error> {
        let outcome = match job.payload {
            JobPayload::StartAuction { auction_id } => self
                .start_auction(auction_id, now)
                .await
                .map(|r| r.map(|_| ())),
            JobPayload::CloseRound { round_id } => self
                .process_round(round_id, now)
                .await
                .map(|r| r.map(|_| ())),
        };

        match outcome {
            Ok(Ok(())) => self.store.complete_job(job.id, now).await,
            Ok(Err(rejection @ Rejection::LockTimeout { .. })) => {
                self.retry_or_park(&job, &rejection.to_string(), now).await
            }
            Ok(Err(rejection)) => {
                event!(Level::ERROR, key = %job.key, %rejection, "job parked");
                self.store
                    .fail_job(job.id, &rejection.to_string(), None, now)
                    .await
            }
            Err(err) => {
                let retried = self.retry_or_park(&job, &err.to_string(), now).await;
                event!(Level::WARN, key = %job.key, err = %err, "job execution failed");
                retried
            }
        }
    }

    async fn retry_or_park(
        &self,
        job: &ClaimedJob,
        error: &str,
        now: OffsetDateTime,
    ) -> Result<(), R::Error> {
        let retry_at = (job.attempt < job.max_attempts).then(|| {
            let exp = job.attempt.saturating_sub(1).min(6);
            now + Duration::seconds((1i64 << exp).min(60))
        });
        if retry_at.is_none() {
            event!(Level::ERROR, key = %job.key, error, "job exhausted its attempts");
        }
        self.store.fail_job(job.id, error, retry_at, now).await
    }
}

use super::Repository;
use crate::models::{AuctionId, RoundId};
use serde::{Deserialize, Serialize};
use std::future::Future;
use time::OffsetDateTime;

/// What a delayed job does when it fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum JobPayload {
    /// Start a pending auction at its `start_at`.
    StartAuction {
        /// The auction to start.
        auction_id: AuctionId,
    },
    /// Settle a round at its `end_at`.
    CloseRound {
        /// The round to settle.
        round_id: RoundId,
    },
}

/// A job to enqueue.
///
/// The key deduplicates against outstanding jobs: scheduling an already
/// outstanding key is a no-op, rescheduling replaces it.
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Dedup key, `auction-{id}` or `round-{id}`.
    pub key: String,
    /// What to do.
    pub payload: JobPayload,
    /// When to fire.
    pub run_at: OffsetDateTime,
    /// Delivery attempts before the job is parked as failed.
    pub max_attempts: u32,
}

impl JobRequest {
    /// A `start-auction` job keyed by the auction.
    pub fn start_auction(auction_id: AuctionId, run_at: OffsetDateTime, max_attempts: u32) -> Self {
        Self {
            key: format!("auction-{auction_id}"),
            payload: JobPayload::StartAuction { auction_id },
            run_at,
            max_attempts,
        }
    }

    /// A `close-round` job keyed by the round.
    pub fn close_round(round_id: RoundId, run_at: OffsetDateTime, max_attempts: u32) -> Self {
        Self {
            key: format!("round-{round_id}"),
            payload: JobPayload::CloseRound { round_id },
            run_at,
            max_attempts,
        }
    }
}

/// A due job handed to a worker.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    /// Storage id, used to complete or fail the claim.
    pub id: i64,
    /// Dedup key.
    pub key: String,
    /// What to do.
    pub payload: JobPayload,
    /// 1-based delivery attempt this claim represents.
    pub attempt: u32,
    /// Attempts before the job is parked as failed.
    pub max_attempts: u32,
}

/// At-least-once delayed job delivery with per-key deduplication.
pub trait JobRepository: Repository {
    /// Enqueue unless an outstanding job with the same key exists. Returns
    /// whether a job was actually enqueued.
    fn schedule_job(
        &self,
        request: &JobRequest,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Drop any outstanding job with the key, then enqueue this one.
    fn reschedule_job(
        &self,
        request: &JobRequest,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Drop any outstanding job with the key.
    fn cancel_job(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Claim up to `limit` due jobs for this worker, incrementing their
    /// attempt counts. Claims taken out before `stale_before` are treated
    /// as abandoned by a dead worker and become claimable again.
    fn claim_due_jobs(
        &self,
        now: OffsetDateTime,
        stale_before: OffsetDateTime,
        limit: u32,
        worker: &str,
    ) -> impl Future<Output = Result<Vec<ClaimedJob>, Self::Error>> + Send;

    /// Mark a claimed job done. The row is retained for observability.
    fn complete_job(
        &self,
        id: i64,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Record a failed delivery: requeue at `retry_at`, or park the job as
    /// failed when `retry_at` is `None`.
    fn fail_job(
        &self,
        id: i64,
        error: &str,
        retry_at: Option<OffsetDateTime>,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Delete completed and failed jobs finished before `older_than`.
    fn prune_jobs(
        &self,
        older_than: OffsetDateTime,
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_keys_are_scoped_by_entity() {
        let auction_id = AuctionId(uuid::Uuid::nil());
        let round_id = RoundId(uuid::Uuid::nil());
        let start = JobRequest::start_auction(auction_id, OffsetDateTime::UNIX_EPOCH, 3);
        let close = JobRequest::close_round(round_id, OffsetDateTime::UNIX_EPOCH, 10);
        assert_eq!(start.key, format!("auction-{auction_id}"));
        assert_eq!(close.key, format!("round-{round_id}"));
    }

    #[test]
    fn payloads_survive_the_queue_encoding() {
        let payload = JobPayload::CloseRound {
            round_id: RoundId(uuid::Uuid::nil()),
        };
        let encoded = serde_json::to_string(&payload).unwrap();
        assert!(encoded.contains("close-round"));
        let decoded: JobPayload = serde_json::from_str(&encoded).unwrap();
        assert!(matches!(decoded, JobPayload::CloseRound { .. }));
    }
}

//! Engine configuration: per-auction defaults and operational knobs.

use serde::{Deserialize, Serialize};

/// Tunable parameters of the auction engine.
///
/// Auction-level fields are defaults applied at creation time when the
/// request omits them; the rest govern the lock, queue, and worker cadence.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Default duration of round 1 (20 minutes).
    #[serde(default = "default_first_round_duration_ms")]
    pub default_first_round_duration_ms: i64,

    /// Default duration of rounds 2..N (3 minutes).
    #[serde(default = "default_other_round_duration_ms")]
    pub default_other_round_duration_ms: i64,

    /// Default minimum bid.
    #[serde(default = "default_min_bid")]
    pub default_min_bid: i64,

    /// A qualifying bid this close (ms) to the round end triggers an
    /// extension.
    #[serde(default = "default_anti_snipe_window_ms")]
    pub anti_snipe_window_ms: i64,

    /// How much (ms) a trigger moves the round end.
    #[serde(default = "default_anti_snipe_extension_ms")]
    pub anti_snipe_extension_ms: i64,

    /// Only bids ranking within this many of the top trigger.
    #[serde(default = "default_anti_snipe_threshold")]
    pub anti_snipe_threshold: u32,

    /// TTL on distributed lock acquisitions. Must cover the worst-case
    /// settlement latency.
    #[serde(default = "default_lock_ttl_ms")]
    pub lock_ttl_ms: i64,

    /// Attempts before lock acquisition gives up.
    #[serde(default = "default_lock_attempts")]
    pub lock_attempts: u32,

    /// Initial backoff between lock attempts; doubles per attempt.
    #[serde(default = "default_lock_backoff_ms")]
    pub lock_backoff_ms: u64,

    /// Delivery attempts for `close-round` jobs.
    #[serde(default = "default_close_round_attempts")]
    pub close_round_attempts: u32,

    /// Delivery attempts for `start-auction` jobs.
    #[serde(default = "default_start_auction_attempts")]
    pub start_auction_attempts: u32,

    /// How often the job worker looks for due jobs.
    #[serde(default = "default_worker_poll_ms")]
    pub worker_poll_ms: u64,

    /// Due jobs claimed per worker pass.
    #[serde(default = "default_worker_batch")]
    pub worker_batch: u32,

    /// Period of the fallback poller that rescues overdue auctions.
    #[serde(default = "default_poller_period_ms")]
    pub poller_period_ms: u64,

    /// How long completed and failed jobs are retained for observability.
    #[serde(default = "default_job_retention_ms")]
    pub job_retention_ms: i64,

    /// A claim older than this is treated as abandoned by a dead worker and
    /// becomes claimable again.
    #[serde(default = "default_job_claim_timeout_ms")]
    pub job_claim_timeout_ms: i64,

    /// Leaderboard size published with `leaderboard:update`.
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: u32,
}

fn default_first_round_duration_ms() -> i64 {
    20 * 60 * 1000
}

fn default_other_round_duration_ms() -> i64 {
    3 * 60 * 1000
}

fn default_min_bid() -> i64 {
    1
}

fn default_anti_snipe_window_ms() -> i64 {
    5_000
}

fn default_anti_snipe_extension_ms() -> i64 {
    30_000
}

fn default_anti_snipe_threshold() -> u32 {
    3
}

fn default_lock_ttl_ms() -> i64 {
    30_000
}

fn default_lock_attempts() -> u32 {
    10
}

fn default_lock_backoff_ms() -> u64 {
    50
}

fn default_close_round_attempts() -> u32 {
    10
}

fn default_start_auction_attempts() -> u32 {
    3
}

fn default_worker_poll_ms() -> u64 {
    250
}

fn default_worker_batch() -> u32 {
    16
}

fn default_poller_period_ms() -> u64 {
    5_000
}

fn default_job_retention_ms() -> i64 {
    24 * 60 * 60 * 1000
}

fn default_job_claim_timeout_ms() -> i64 {
    60_000
}

fn default_leaderboard_size() -> u32 {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_first_round_duration_ms: default_first_round_duration_ms(),
            default_other_round_duration_ms: default_other_round_duration_ms(),
            default_min_bid: default_min_bid(),
            anti_snipe_window_ms: default_anti_snipe_window_ms(),
            anti_snipe_extension_ms: default_anti_snipe_extension_ms(),
            anti_snipe_threshold: default_anti_snipe_threshold(),
            lock_ttl_ms: default_lock_ttl_ms(),
            lock_attempts: default_lock_attempts(),
            lock_backoff_ms: default_lock_backoff_ms(),
            close_round_attempts: default_close_round_attempts(),
            start_auction_attempts: default_start_auction_attempts(),
            worker_poll_ms: default_worker_poll_ms(),
            worker_batch: default_worker_batch(),
            poller_period_ms: default_poller_period_ms(),
            job_retention_ms: default_job_retention_ms(),
            job_claim_timeout_ms: default_job_claim_timeout_ms(),
            leaderboard_size: default_leaderboard_size(),
        }
    }
}

use super::{AuctionId, RoundId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifecycle states of an auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    /// Created but not yet started; waiting for `start_at`.
    Pending,
    /// Rounds are running.
    Active,
    /// All items distributed or all rounds exhausted.
    Completed,
}

impl std::fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
        })
    }
}

impl std::str::FromStr for AuctionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown auction status {other:?}")),
        }
    }
}

/// The top-level aggregate distributing a fixed pool of items across rounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    /// Auction identity.
    pub id: AuctionId,
    /// Human-readable name.
    pub name: String,
    /// Optional longer description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Total number of indivisible items to distribute. Always positive.
    pub total_items: u32,
    /// Number of rounds the items are spread across. At least 1.
    pub total_rounds: u32,
    /// Number of winners in a full round; the last round may be capped by
    /// the remaining item count.
    pub items_per_round: u32,
    /// Smallest admissible bid amount.
    pub min_bid: i64,
    /// 0 until the auction starts, then the 1-based number of the round
    /// currently running (or the last round once completed).
    pub current_round: u32,
    /// Lifecycle status.
    pub status: AuctionStatus,
    /// When the first round opens.
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    /// Duration of round 1 in milliseconds.
    #[serde(rename = "firstRoundDuration")]
    pub first_round_duration_ms: i64,
    /// Duration of rounds 2..N in milliseconds.
    #[serde(rename = "otherRoundDuration")]
    pub other_round_duration_ms: i64,
    /// Anti-snipe: a qualifying bid this close (ms) to the round end
    /// triggers an extension.
    pub anti_snipe_window_ms: i64,
    /// Anti-snipe: how much (ms) the round end moves on a trigger.
    pub anti_snipe_extension_ms: i64,
    /// Anti-snipe: only bids ranking within this many of the top trigger.
    pub anti_snipe_threshold: u32,
    /// Running count of items awarded so far. Never exceeds `total_items`.
    pub distributed_items: u32,
    /// Cumulative mean price over all items ever awarded; 0 until the first
    /// item is won.
    pub avg_price: f64,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Auction {
    /// Items not yet awarded.
    pub fn remaining_items(&self) -> u32 {
        self.total_items - self.distributed_items
    }

    /// Round duration for the given 1-based round number, in milliseconds.
    pub fn round_duration_ms(&self, round_number: u32) -> i64 {
        if round_number <= 1 {
            self.first_round_duration_ms
        } else {
            self.other_round_duration_ms
        }
    }
}

/// Input for creating an auction. Omitted fields are populated from the
/// engine defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuction {
    /// Human-readable name.
    pub name: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Total number of items to distribute.
    pub total_items: u32,
    /// Number of rounds.
    pub total_rounds: u32,
    /// Winners per round; defaults to `ceil(total_items / total_rounds)`.
    #[serde(default)]
    pub winners_per_round: Option<u32>,
    /// Smallest admissible bid; defaults to 1.
    #[serde(default)]
    pub min_bid: Option<i64>,
    /// When the first round opens.
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    /// Duration of round 1 in milliseconds.
    #[serde(default, rename = "firstRoundDuration")]
    pub first_round_duration_ms: Option<i64>,
    /// Duration of subsequent rounds in milliseconds.
    #[serde(default, rename = "otherRoundDuration")]
    pub other_round_duration_ms: Option<i64>,
}

/// The currently running round of an auction, as exposed on the read side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRoundSummary {
    /// Round identity.
    pub id: RoundId,
    /// 1-based round number.
    pub round_number: u32,
    /// When the round opened.
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    /// Current (possibly extended) close time.
    #[serde(with = "time::serde::rfc3339")]
    pub end_at: OffsetDateTime,
    /// Number of items awarded when this round settles.
    pub winners_count: u32,
    /// Smallest amount that currently wins an item; 1 while the round is
    /// undersubscribed.
    pub min_bid_for_win: i64,
    /// Number of active bids in the round.
    pub total_bids: u32,
}

/// An auction joined with its active round, if any.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSummary {
    /// The auction aggregate.
    #[serde(flatten)]
    pub auction: Auction,
    /// The running round, or `None` between rounds / outside the active
    /// lifecycle.
    pub active_round: Option<ActiveRoundSummary>,
}

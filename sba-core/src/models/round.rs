use super::{AuctionId, RoundId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifecycle states of a round.
///
/// At most one round per auction is ever `Active` or `Processing`.
/// `Processing` marks a settlement in flight; it only moves forward to
/// `Completed`, never back to `Active` except through explicit recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    /// Created ahead of its open time.
    Pending,
    /// Accepting bids.
    Active,
    /// Settlement in flight.
    Processing,
    /// Settled.
    Completed,
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Processing => "processing",
            Self::Completed => "completed",
        })
    }
}

impl std::str::FromStr for RoundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown round status {other:?}")),
        }
    }
}

/// A single sealed-bid phase within an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// Round identity.
    pub id: RoundId,
    /// Owning auction.
    pub auction_id: AuctionId,
    /// 1-based position within the auction. Unique per auction.
    pub round_number: u32,
    /// When the round opened.
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    /// Close time. Monotonically non-decreasing: anti-snipe extensions move
    /// it forward, nothing moves it back.
    #[serde(with = "time::serde::rfc3339")]
    pub end_at: OffsetDateTime,
    /// The close time the round was created with; immutable, kept for
    /// observability.
    #[serde(with = "time::serde::rfc3339")]
    pub original_end_at: OffsetDateTime,
    /// Lifecycle status.
    pub status: RoundStatus,
    /// Number of items awarded when the round settles. Never exceeds the
    /// items remaining at creation time.
    pub winners_count: u32,
    /// Last lifecycle transition. Used to spot settlements stuck in
    /// `Processing`.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

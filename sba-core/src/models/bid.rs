use super::{AuctionId, BidId, RoundId, UserId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifecycle states of a bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BidStatus {
    /// Standing in the current round; the amount is frozen in the wallet.
    Active,
    /// Won an item at settlement; the amount was consumed.
    Won,
    /// Lost at settlement; the amount was returned to the wallet.
    Refunded,
}

impl std::fmt::Display for BidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Won => "won",
            Self::Refunded => "refunded",
        })
    }
}

impl std::str::FromStr for BidStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "won" => Ok(Self::Won),
            "refunded" => Ok(Self::Refunded),
            other => Err(format!("unknown bid status {other:?}")),
        }
    }
}

/// A user's standing offer in a round.
///
/// At most one bid exists per `(auction, round, user)`; a raise adds to the
/// existing amount rather than replacing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    /// Bid identity.
    pub id: BidId,
    /// Owning auction.
    pub auction_id: AuctionId,
    /// Round the bid stands in.
    pub round_id: RoundId,
    /// The bidder.
    pub user_id: UserId,
    /// Total offered amount, including all raises. At least the auction's
    /// minimum bid.
    pub amount: i64,
    /// Lifecycle status.
    pub status: BidStatus,
    /// Round number the bid won in; `None` unless `status` is `Won`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub won_in_round: Option<u32>,
    /// Sequential item number awarded across the whole auction; `None`
    /// unless `status` is `Won`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_number: Option<u32>,
    /// When the bid was first placed. Ties on amount break by this, earlier
    /// first.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the bid was last raised.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Result of a bid admission, as returned to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidReceipt {
    /// The bid after the place or raise.
    pub bid: Bid,
    /// Whether this admission extended the round.
    pub anti_snipe_triggered: bool,
    /// The bid's rank in the round after admission, 1-based.
    pub rank: u32,
    /// Active bids in the round after admission.
    pub total_bids: u32,
}

/// A user's own bid in the active round, with its current rank.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyBid {
    /// Bid identity.
    pub id: BidId,
    /// Total offered amount.
    pub amount: i64,
    /// 1-based rank under `(amount DESC, created_at ASC)`.
    pub rank: u32,
    /// Lifecycle status.
    pub status: BidStatus,
}

use super::{AuctionId, BidId, UserId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The kind of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    /// External funds added to `available`.
    Deposit,
    /// `available` moved to `frozen` against a bid.
    Freeze,
    /// `frozen` returned to `available` outside settlement.
    Unfreeze,
    /// `frozen` consumed by a winning bid.
    Win,
    /// `frozen` returned to `available` for a losing bid.
    Refund,
}

impl std::fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Deposit => "deposit",
            Self::Freeze => "freeze",
            Self::Unfreeze => "unfreeze",
            Self::Win => "win",
            Self::Refund => "refund",
        })
    }
}

impl std::str::FromStr for LedgerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "freeze" => Ok(Self::Freeze),
            "unfreeze" => Ok(Self::Unfreeze),
            "win" => Ok(Self::Win),
            "refund" => Ok(Self::Refund),
            other => Err(format!("unknown ledger kind {other:?}")),
        }
    }
}

/// One row of the append-only wallet transaction log.
///
/// Every wallet mutation writes exactly one entry, atomically with the
/// balance change, recording the available and frozen balances on both
/// sides of the operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Monotonically increasing entry id.
    pub id: i64,
    /// The wallet the entry belongs to.
    pub user_id: UserId,
    /// Operation kind.
    pub kind: LedgerKind,
    /// Amount moved. Always positive.
    pub amount: i64,
    /// Auction context, when the operation came from bidding or settlement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction_id: Option<AuctionId>,
    /// Bid context, when the operation came from bidding or settlement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_id: Option<BidId>,
    /// `available` before the operation.
    pub balance_before: i64,
    /// `available` after the operation.
    pub balance_after: i64,
    /// `frozen` before the operation.
    pub frozen_before: i64,
    /// `frozen` after the operation.
    pub frozen_after: i64,
    /// When the entry was written.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

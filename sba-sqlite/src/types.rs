//! Row types and conversions between storage and domain representations.
//!
//! SQLite stores ids as uuid strings, timestamps as unix milliseconds, and
//! status enums as their lowercase names. The row structs here mirror that
//! layout and convert into the `sba-core` records, so the domain models
//! stay free of storage concerns.

use crate::Error;
use sba_core::models::{Auction, Bid, LeaderboardEntry, LedgerEntry, Round, User};
use time::OffsetDateTime;

/// Unix milliseconds for storage.
pub(crate) fn to_ms(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Back from unix milliseconds.
pub(crate) fn from_ms(ms: i64) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000)
        .map_err(|err| Error::Corrupt(format!("timestamp {ms}: {err}")))
}

fn to_u32(value: i64, field: &'static str) -> Result<u32, Error> {
    u32::try_from(value).map_err(|_| Error::Corrupt(format!("{field} = {value}")))
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: String,
    pub username: String,
    pub available: i64,
    pub frozen: i64,
    pub created_at: i64,
}

impl TryFrom<UserRow> for User {
    type Error = Error;

    fn try_from(row: UserRow) -> Result<Self, Error> {
        Ok(User {
            id: row.id.parse::<uuid::Uuid>()?.into(),
            username: row.username,
            available: row.available,
            frozen: row.frozen,
            created_at: from_ms(row.created_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct AuctionRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub total_items: i64,
    pub total_rounds: i64,
    pub items_per_round: i64,
    pub min_bid: i64,
    pub current_round: i64,
    pub status: String,
    pub start_at: i64,
    pub first_round_duration_ms: i64,
    pub other_round_duration_ms: i64,
    pub anti_snipe_window_ms: i64,
    pub anti_snipe_extension_ms: i64,
    pub anti_snipe_threshold: i64,
    pub distributed_items: i64,
    pub avg_price: f64,
    pub created_at: i64,
}

impl TryFrom<AuctionRow> for Auction {
    type Error = Error;

    fn try_from(row: AuctionRow) -> Result<Self, Error> {
        Ok(Auction {
            id: row.id.parse::<uuid::Uuid>()?.into(),
            name: row.name,
            description: row.description,
            total_items: to_u32(row.total_items, "total_items")?,
            total_rounds: to_u32(row.total_rounds, "total_rounds")?,
            items_per_round: to_u32(row.items_per_round, "items_per_round")?,
            min_bid: row.min_bid,
            current_round: to_u32(row.current_round, "current_round")?,
            status: row
                .status
                .parse()
                .map_err(Error::Corrupt)?,
            start_at: from_ms(row.start_at)?,
            first_round_duration_ms: row.first_round_duration_ms,
            other_round_duration_ms: row.other_round_duration_ms,
            anti_snipe_window_ms: row.anti_snipe_window_ms,
            anti_snipe_extension_ms: row.anti_snipe_extension_ms,
            anti_snipe_threshold: to_u32(row.anti_snipe_threshold, "anti_snipe_threshold")?,
            distributed_items: to_u32(row.distributed_items, "distributed_items")?,
            avg_price: row.avg_price,
            created_at: from_ms(row.created_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct RoundRow {
    pub id: String,
    pub auction_id: String,
    pub round_number: i64,
    pub start_at: i64,
    pub end_at: i64,
    pub original_end_at: i64,
    pub status: String,
    pub winners_count: i64,
    pub updated_at: i64,
}

impl TryFrom<RoundRow> for Round {
    type Error = Error;

    fn try_from(row: RoundRow) -> Result<Self, Error> {
        Ok(Round {
            id: row.id.parse::<uuid::Uuid>()?.into(),
            auction_id: row.auction_id.parse::<uuid::Uuid>()?.into(),
            round_number: to_u32(row.round_number, "round_number")?,
            start_at: from_ms(row.start_at)?,
            end_at: from_ms(row.end_at)?,
            original_end_at: from_ms(row.original_end_at)?,
            status: row
                .status
                .parse()
                .map_err(Error::Corrupt)?,
            winners_count: to_u32(row.winners_count, "winners_count")?,
            updated_at: from_ms(row.updated_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct BidRow {
    pub id: String,
    pub auction_id: String,
    pub round_id: String,
    pub user_id: String,
    pub amount: i64,
    pub status: String,
    pub won_in_round: Option<i64>,
    pub item_number: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<BidRow> for Bid {
    type Error = Error;

    fn try_from(row: BidRow) -> Result<Self, Error> {
        Ok(Bid {
            id: row.id.parse::<uuid::Uuid>()?.into(),
            auction_id: row.auction_id.parse::<uuid::Uuid>()?.into(),
            round_id: row.round_id.parse::<uuid::Uuid>()?.into(),
            user_id: row.user_id.parse::<uuid::Uuid>()?.into(),
            amount: row.amount,
            status: row
                .status
                .parse()
                .map_err(Error::Corrupt)?,
            won_in_round: row
                .won_in_round
                .map(|n| to_u32(n, "won_in_round"))
                .transpose()?,
            item_number: row
                .item_number
                .map(|n| to_u32(n, "item_number"))
                .transpose()?,
            created_at: from_ms(row.created_at)?,
            updated_at: from_ms(row.updated_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct LedgerRow {
    pub id: i64,
    pub user_id: String,
    pub kind: String,
    pub amount: i64,
    pub auction_id: Option<String>,
    pub bid_id: Option<String>,
    pub balance_before: i64,
    pub balance_after: i64,
    pub frozen_before: i64,
    pub frozen_after: i64,
    pub created_at: i64,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = Error;

    fn try_from(row: LedgerRow) -> Result<Self, Error> {
        Ok(LedgerEntry {
            id: row.id,
            user_id: row.user_id.parse::<uuid::Uuid>()?.into(),
            kind: row.kind.parse().map_err(Error::Corrupt)?,
            amount: row.amount,
            auction_id: row
                .auction_id
                .map(|id| id.parse::<uuid::Uuid>().map(Into::into))
                .transpose()?,
            bid_id: row
                .bid_id
                .map(|id| id.parse::<uuid::Uuid>().map(Into::into))
                .transpose()?,
            balance_before: row.balance_before,
            balance_after: row.balance_after,
            frozen_before: row.frozen_before,
            frozen_after: row.frozen_after,
            created_at: from_ms(row.created_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct LeaderboardRow {
    pub user_id: String,
    pub username: String,
    pub amount: i64,
}

impl LeaderboardRow {
    /// Attach the 1-based rank the query ordering implies.
    pub(crate) fn into_entry(self, rank: u32) -> Result<LeaderboardEntry, Error> {
        Ok(LeaderboardEntry {
            rank,
            user_id: self.user_id.parse::<uuid::Uuid>()?.into(),
            username: self.username,
            amount: self.amount,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ClaimRow {
    pub id: i64,
    pub key: String,
    pub payload: String,
    pub attempts: i64,
    pub max_attempts: i64,
}

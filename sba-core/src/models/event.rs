use super::{AuctionId, UserId};
use serde::Serialize;
use time::OffsetDateTime;

/// A single row of a leaderboard snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based rank under `(amount DESC, created_at ASC)`.
    pub rank: u32,
    /// The bidder.
    pub user_id: UserId,
    /// The bidder's display name.
    pub username: String,
    /// Total offered amount.
    pub amount: i64,
}

/// Lifecycle and leaderboard events delivered to realtime subscribers.
///
/// Delivery is best-effort and scoped to the auction's room; a reconnecting
/// client reconciles by refetching auction state. `AuctionStart` and
/// `AuctionComplete` additionally go out to every connected client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum AuctionEvent {
    /// The auction started and its first round opened.
    #[serde(rename = "auction:start", rename_all = "camelCase")]
    AuctionStart {
        /// The auction that started.
        auction_id: AuctionId,
        /// Auction name.
        name: String,
        /// The opening round number (always 1).
        round_number: u32,
        /// Close time of the opening round.
        #[serde(with = "time::serde::rfc3339")]
        end_at: OffsetDateTime,
    },
    /// A round opened.
    #[serde(rename = "round:start", rename_all = "camelCase")]
    RoundStart {
        /// 1-based round number.
        round_number: u32,
        /// Close time.
        #[serde(with = "time::serde::rfc3339")]
        end_at: OffsetDateTime,
        /// Items awarded when the round settles.
        winners_count: u32,
    },
    /// A bid was placed or raised.
    #[serde(rename = "bid:new", rename_all = "camelCase")]
    BidNew {
        /// The bid's rank after admission.
        rank: u32,
        /// The bid's total amount after admission.
        amount: i64,
        /// The bidder.
        user_id: UserId,
        /// Active bids in the round.
        total_bids: u32,
    },
    /// Fresh top-K snapshot after an admission.
    #[serde(rename = "leaderboard:update")]
    LeaderboardUpdate(Vec<LeaderboardEntry>),
    /// An anti-snipe trigger extended the round.
    #[serde(rename = "timer:antiSnipe", rename_all = "camelCase")]
    AntiSnipe {
        /// The extended close time.
        #[serde(with = "time::serde::rfc3339")]
        new_end_at: OffsetDateTime,
        /// Extension length in milliseconds.
        extension: i64,
    },
    /// A round settled.
    #[serde(rename = "round:end", rename_all = "camelCase")]
    RoundEnd {
        /// 1-based round number.
        round_number: u32,
        /// Number of items actually awarded.
        winners_count: u32,
    },
    /// The auction finished distributing items.
    #[serde(rename = "auction:complete", rename_all = "camelCase")]
    AuctionComplete {
        /// The finished auction.
        auction_id: AuctionId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AuctionEvent::RoundStart { round_number: 1, end_at: OffsetDateTime::UNIX_EPOCH, winners_count: 2 }, "round:start")]
    #[case(AuctionEvent::RoundEnd { round_number: 1, winners_count: 2 }, "round:end")]
    #[case(AuctionEvent::AntiSnipe { new_end_at: OffsetDateTime::UNIX_EPOCH, extension: 30_000 }, "timer:antiSnipe")]
    #[case(AuctionEvent::AuctionComplete { auction_id: AuctionId(uuid::Uuid::nil()) }, "auction:complete")]
    #[case(AuctionEvent::LeaderboardUpdate(Vec::new()), "leaderboard:update")]
    fn events_carry_their_wire_names(#[case] event: AuctionEvent, #[case] expected: &str) {
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], expected);
    }

    #[test]
    fn payload_fields_are_camel_cased() {
        let event = AuctionEvent::BidNew {
            rank: 1,
            amount: 100,
            user_id: UserId(uuid::Uuid::nil()),
            total_bids: 3,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert!(value["data"].get("totalBids").is_some());
        assert!(value["data"].get("total_bids").is_none());
    }
}

use super::wallet::apply_wallet_op;
use crate::types::{BidRow, LeaderboardRow, to_ms};
use crate::{Db, Error};
use sba_core::models::{AuctionId, Bid, LeaderboardEntry, LedgerKind, RoundId, UserId};
use sba_core::ports::{BidFailure, BidRepository, BidWrite};

/// Deterministic ranking order shared by every ranked read. The id breaks
/// the (rare) millisecond tie so settlement and rank reads agree.
const RANK_ORDER: &str = "order by amount desc, created_at asc, id asc";

impl BidRepository for Db {
    async fn find_bid(
        &self,
        auction_id: AuctionId,
        round_id: RoundId,
        user_id: UserId,
    ) -> Result<Option<Bid>, Error> {
        let row: Option<BidRow> = sqlx::query_as(
            "select * from bids where auction_id = ?1 and round_id = ?2 and user_id = ?3",
        )
        .bind(auction_id.to_string())
        .bind(round_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.reader)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn place_bid(&self, write: &BidWrite) -> Result<Result<Bid, BidFailure>, Error> {
        let now_ms = to_ms(write.now);
        let mut tx = self.writer.begin().await?;

        // Re-verify under the write transaction: a settlement that won the
        // race has already flipped the round to processing, and committing
        // a bid after its snapshot would strand frozen funds.
        let round: Option<(String, i64)> =
            sqlx::query_as("select status, end_at from rounds where id = ?1")
                .bind(write.round_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
        let open = round.is_some_and(|(status, end_at)| status == "active" && end_at >= now_ms);
        if !open {
            tx.rollback().await?;
            return Ok(Err(BidFailure::RoundClosed));
        }

        let frozen = apply_wallet_op(
            &mut tx,
            write.user_id,
            LedgerKind::Freeze,
            write.amount,
            Some(write.auction_id),
            Some(write.bid_id),
            write.now,
        )
        .await?;
        if frozen.is_err() {
            tx.rollback().await?;
            return Ok(Err(BidFailure::InsufficientFunds));
        }

        // A raise adds to the existing amount; the original id and
        // created_at (the tie-break) stay put.
        sqlx::query(
            r#"
            insert into bids
                (id, auction_id, round_id, user_id, amount, status, created_at, updated_at)
            values
                (?1, ?2, ?3, ?4, ?5, 'active', ?6, ?6)
            on conflict (auction_id, round_id, user_id) do update
            set amount = bids.amount + excluded.amount, updated_at = excluded.updated_at
            "#,
        )
        .bind(write.bid_id.to_string())
        .bind(write.auction_id.to_string())
        .bind(write.round_id.to_string())
        .bind(write.user_id.to_string())
        .bind(write.amount)
        .bind(now_ms)
        .execute(&mut *tx)
        .await?;

        let row: BidRow = sqlx::query_as(
            "select * from bids where auction_id = ?1 and round_id = ?2 and user_id = ?3",
        )
        .bind(write.auction_id.to_string())
        .bind(write.round_id.to_string())
        .bind(write.user_id.to_string())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Ok(row.try_into()?))
    }

    async fn ranked_bids(&self, round_id: RoundId, limit: Option<u32>) -> Result<Vec<Bid>, Error> {
        let rows: Vec<BidRow> = sqlx::query_as(&format!(
            "select * from bids where round_id = ?1 and status = 'active' {RANK_ORDER} limit ?2"
        ))
        .bind(round_id.to_string())
        // LIMIT -1 is sqlite for "no limit"
        .bind(limit.map(|n| n as i64).unwrap_or(-1))
        .fetch_all(&self.reader)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn leaderboard(
        &self,
        round_id: RoundId,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, Error> {
        let rows: Vec<LeaderboardRow> = sqlx::query_as(&format!(
            r#"
            select b.user_id as user_id, u.username as username, b.amount as amount
            from bids b join users u on u.id = b.user_id
            where b.round_id = ?1 and b.status = 'active'
            {RANK_ORDER}
            limit ?2
            "#,
        ))
        .bind(round_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.reader)
        .await?;
        rows.into_iter()
            .enumerate()
            .map(|(i, row)| row.into_entry(i as u32 + 1))
            .collect()
    }

    async fn count_active_bids(&self, round_id: RoundId) -> Result<u32, Error> {
        let (count,): (i64,) =
            sqlx::query_as("select count(*) from bids where round_id = ?1 and status = 'active'")
                .bind(round_id.to_string())
                .fetch_one(&self.reader)
                .await?;
        Ok(count as u32)
    }

    async fn rank_of(&self, round_id: RoundId, bid: &Bid) -> Result<u32, Error> {
        let created_ms = to_ms(bid.created_at);
        let (above,): (i64,) = sqlx::query_as(
            r#"
            select count(*) from bids
            where round_id = ?1 and status = 'active'
              and (amount > ?2
                or (amount = ?2 and created_at < ?3)
                or (amount = ?2 and created_at = ?3 and id < ?4))
            "#,
        )
        .bind(round_id.to_string())
        .bind(bid.amount)
        .bind(created_ms)
        .bind(bid.id.to_string())
        .fetch_one(&self.reader)
        .await?;
        Ok(above as u32 + 1)
    }

    async fn nth_ranked_amount(&self, round_id: RoundId, n: u32) -> Result<Option<i64>, Error> {
        if n == 0 {
            return Ok(None);
        }
        let row: Option<(i64,)> = sqlx::query_as(&format!(
            "select amount from bids where round_id = ?1 and status = 'active' \
             {RANK_ORDER} limit 1 offset ?2"
        ))
        .bind(round_id.to_string())
        .bind((n - 1) as i64)
        .fetch_optional(&self.reader)
        .await?;
        Ok(row.map(|(amount,)| amount))
    }

    async fn bids_for_user(&self, user_id: UserId) -> Result<Vec<Bid>, Error> {
        let rows: Vec<BidRow> = sqlx::query_as(
            "select * from bids where user_id = ?1 order by created_at desc, id desc",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.reader)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn wins_for_user(&self, user_id: UserId) -> Result<Vec<Bid>, Error> {
        let rows: Vec<BidRow> = sqlx::query_as(
            "select * from bids where user_id = ?1 and status = 'won' \
             order by updated_at desc, id desc",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.reader)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

use super::wallet::apply_wallet_op;
use crate::types::{RoundRow, to_ms};
use crate::{Db, Error};
use sba_core::models::{AuctionId, LedgerKind, Round, RoundId};
use sba_core::ports::{RoundRepository, SettlementPlan};
use sqlx::SqliteExecutor;
use time::OffsetDateTime;

/// Insert a round row. Shared with the auction-start transaction.
pub(crate) async fn insert_round<'e>(
    executor: impl SqliteExecutor<'e>,
    round: &Round,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        insert into rounds
            (id, auction_id, round_number, start_at, end_at, original_end_at,
             status, winners_count, updated_at)
        values
            (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(round.id.to_string())
    .bind(round.auction_id.to_string())
    .bind(round.round_number as i64)
    .bind(to_ms(round.start_at))
    .bind(to_ms(round.end_at))
    .bind(to_ms(round.original_end_at))
    .bind(round.status.to_string())
    .bind(round.winners_count as i64)
    .bind(to_ms(round.updated_at))
    .execute(executor)
    .await?;
    Ok(())
}

impl RoundRepository for Db {
    async fn get_round(&self, round_id: RoundId) -> Result<Option<Round>, Error> {
        let row: Option<RoundRow> = sqlx::query_as("select * from rounds where id = ?1")
            .bind(round_id.to_string())
            .fetch_optional(&self.reader)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn active_round(&self, auction_id: AuctionId) -> Result<Option<Round>, Error> {
        let row: Option<RoundRow> =
            sqlx::query_as("select * from rounds where auction_id = ?1 and status = 'active'")
                .bind(auction_id.to_string())
                .fetch_optional(&self.reader)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn mark_round_processing(
        &self,
        round_id: RoundId,
        now: OffsetDateTime,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            "update rounds set status = 'processing', updated_at = ?2 \
             where id = ?1 and status = 'active'",
        )
        .bind(round_id.to_string())
        .bind(to_ms(now))
        .execute(&self.writer)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn revert_round_processing(
        &self,
        round_id: RoundId,
        now: OffsetDateTime,
    ) -> Result<(), Error> {
        sqlx::query(
            "update rounds set status = 'active', updated_at = ?2 \
             where id = ?1 and status = 'processing'",
        )
        .bind(round_id.to_string())
        .bind(to_ms(now))
        .execute(&self.writer)
        .await?;
        Ok(())
    }

    async fn extend_round(
        &self,
        round_id: RoundId,
        new_end_at: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Result<Round, Error> {
        // max() keeps end_at monotonic under concurrent extensions
        sqlx::query(
            "update rounds set end_at = max(end_at, ?2), updated_at = ?3 where id = ?1",
        )
        .bind(round_id.to_string())
        .bind(to_ms(new_end_at))
        .bind(to_ms(now))
        .execute(&self.writer)
        .await?;

        let row: RoundRow = sqlx::query_as("select * from rounds where id = ?1")
            .bind(round_id.to_string())
            .fetch_one(&self.reader)
            .await?;
        row.try_into()
    }

    async fn apply_settlement(&self, plan: &SettlementPlan) -> Result<Result<(), String>, Error> {
        let now_ms = to_ms(plan.now);
        let mut tx = self.writer.begin().await?;

        for win in &plan.winners {
            let updated = sqlx::query(
                "update bids set status = 'won', won_in_round = ?2, item_number = ?3, \
                 updated_at = ?4 where id = ?1 and status = 'active'",
            )
            .bind(win.bid_id.to_string())
            .bind(plan.round_number as i64)
            .bind(win.item_number as i64)
            .bind(now_ms)
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() != 1 {
                tx.rollback().await?;
                return Ok(Err(format!("winning bid {} is not active", win.bid_id)));
            }
            if apply_wallet_op(
                &mut tx,
                win.user_id,
                LedgerKind::Win,
                win.amount,
                Some(plan.auction_id),
                Some(win.bid_id),
                plan.now,
            )
            .await?
            .is_err()
            {
                tx.rollback().await?;
                return Ok(Err(format!(
                    "frozen balance of user {} cannot cover win of {}",
                    win.user_id, win.amount
                )));
            }
        }

        for refund in &plan.losers {
            let updated = sqlx::query(
                "update bids set status = 'refunded', updated_at = ?2 \
                 where id = ?1 and status = 'active'",
            )
            .bind(refund.bid_id.to_string())
            .bind(now_ms)
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() != 1 {
                tx.rollback().await?;
                return Ok(Err(format!("losing bid {} is not active", refund.bid_id)));
            }
            if apply_wallet_op(
                &mut tx,
                refund.user_id,
                LedgerKind::Refund,
                refund.amount,
                Some(plan.auction_id),
                Some(refund.bid_id),
                plan.now,
            )
            .await?
            .is_err()
            {
                tx.rollback().await?;
                return Ok(Err(format!(
                    "frozen balance of user {} cannot cover refund of {}",
                    refund.user_id, refund.amount
                )));
            }
        }

        match &plan.next_round {
            Some(next) => {
                sqlx::query(
                    "update auctions set distributed_items = ?2, avg_price = ?3, \
                     current_round = ?4 where id = ?1",
                )
                .bind(plan.auction_id.to_string())
                .bind(plan.distributed_items as i64)
                .bind(plan.avg_price)
                .bind(next.round.round_number as i64)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query(
                    "update auctions set distributed_items = ?2, avg_price = ?3, \
                     status = 'completed' where id = ?1",
                )
                .bind(plan.auction_id.to_string())
                .bind(plan.distributed_items as i64)
                .bind(plan.avg_price)
                .execute(&mut *tx)
                .await?;
            }
        }

        let completed = sqlx::query(
            "update rounds set status = 'completed', updated_at = ?2 \
             where id = ?1 and status = 'processing'",
        )
        .bind(plan.round_id.to_string())
        .bind(now_ms)
        .execute(&mut *tx)
        .await?;
        if completed.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(Err(format!("round {} is not processing", plan.round_id)));
        }

        if let Some(next) = &plan.next_round {
            insert_round(&mut *tx, &next.round).await?;
            super::queue::insert_job(&mut *tx, &next.close_job, plan.now).await?;
        }

        tx.commit().await?;
        Ok(Ok(()))
    }

    async fn list_active_rounds(&self) -> Result<Vec<Round>, Error> {
        let rows: Vec<RoundRow> =
            sqlx::query_as("select * from rounds where status = 'active' order by end_at asc")
                .fetch_all(&self.reader)
                .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_stuck_rounds(&self, older_than: OffsetDateTime) -> Result<Vec<Round>, Error> {
        let rows: Vec<RoundRow> = sqlx::query_as(
            "select * from rounds where status = 'processing' and updated_at < ?1 \
             order by updated_at asc",
        )
        .bind(to_ms(older_than))
        .fetch_all(&self.reader)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

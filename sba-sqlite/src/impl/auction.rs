use super::queue::insert_job;
use crate::types::{AuctionRow, to_ms};
use crate::{Db, Error};
use sba_core::models::{Auction, AuctionId, Round};
use sba_core::ports::{AuctionRepository, JobRequest};
use time::OffsetDateTime;

impl AuctionRepository for Db {
    async fn insert_auction(&self, auction: &Auction) -> Result<(), Error> {
        sqlx::query(
            r#"
            insert into auctions
                (id, name, description, total_items, total_rounds, items_per_round,
                 min_bid, current_round, status, start_at,
                 first_round_duration_ms, other_round_duration_ms,
                 anti_snipe_window_ms, anti_snipe_extension_ms, anti_snipe_threshold,
                 distributed_items, avg_price, created_at)
            values
                (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#,
        )
        .bind(auction.id.to_string())
        .bind(&auction.name)
        .bind(&auction.description)
        .bind(auction.total_items as i64)
        .bind(auction.total_rounds as i64)
        .bind(auction.items_per_round as i64)
        .bind(auction.min_bid)
        .bind(auction.current_round as i64)
        .bind(auction.status.to_string())
        .bind(to_ms(auction.start_at))
        .bind(auction.first_round_duration_ms)
        .bind(auction.other_round_duration_ms)
        .bind(auction.anti_snipe_window_ms)
        .bind(auction.anti_snipe_extension_ms)
        .bind(auction.anti_snipe_threshold as i64)
        .bind(auction.distributed_items as i64)
        .bind(auction.avg_price)
        .bind(to_ms(auction.created_at))
        .execute(&self.writer)
        .await?;
        Ok(())
    }

    async fn get_auction(&self, auction_id: AuctionId) -> Result<Option<Auction>, Error> {
        let row: Option<AuctionRow> = sqlx::query_as("select * from auctions where id = ?1")
            .bind(auction_id.to_string())
            .fetch_optional(&self.reader)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_auctions(&self) -> Result<Vec<Auction>, Error> {
        let rows: Vec<AuctionRow> =
            sqlx::query_as("select * from auctions order by created_at desc, id desc")
                .fetch_all(&self.reader)
                .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_pending_auctions(&self) -> Result<Vec<Auction>, Error> {
        let rows: Vec<AuctionRow> =
            sqlx::query_as("select * from auctions where status = 'pending' order by start_at asc")
                .fetch_all(&self.reader)
                .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn start_auction_txn(
        &self,
        auction_id: AuctionId,
        round: &Round,
        close_job: &JobRequest,
        now: OffsetDateTime,
    ) -> Result<bool, Error> {
        let mut tx = self.writer.begin().await?;

        let cas = sqlx::query(
            "update auctions set current_round = 1, status = 'active' \
             where id = ?1 and status = 'pending'",
        )
        .bind(auction_id.to_string())
        .execute(&mut *tx)
        .await?;
        if cas.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        super::round::insert_round(&mut *tx, round).await?;
        insert_job(&mut *tx, close_job, now).await?;

        tx.commit().await?;
        Ok(true)
    }
}

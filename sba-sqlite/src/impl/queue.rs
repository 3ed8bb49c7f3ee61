use crate::types::{ClaimRow, to_ms};
use crate::{Db, Error};
use sba_core::ports::{ClaimedJob, JobRepository, JobRequest};
use sqlx::SqliteExecutor;
use time::OffsetDateTime;

/// Enqueue a job unless an outstanding one holds the same key.
///
/// Runs against any executor so callers can fold the insert into a larger
/// transaction (settlement enqueues the next round's close job this way).
/// The `insert or ignore` bounces off the partial unique index over
/// outstanding jobs; finished rows never collide.
pub(crate) async fn insert_job<'e>(
    executor: impl SqliteExecutor<'e>,
    request: &JobRequest,
    now: OffsetDateTime,
) -> Result<bool, Error> {
    let payload = serde_json::to_string(&request.payload)?;
    let result = sqlx::query(
        r#"
        insert or ignore into jobs
            (key, payload, run_at, attempts, max_attempts, status, created_at, updated_at)
        values
            (?1, ?2, ?3, 0, ?4, 'queued', ?5, ?5)
        "#,
    )
    .bind(&request.key)
    .bind(payload)
    .bind(to_ms(request.run_at))
    .bind(request.max_attempts as i64)
    .bind(to_ms(now))
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

impl JobRepository for Db {
    async fn schedule_job(&self, request: &JobRequest, now: OffsetDateTime) -> Result<bool, Error> {
        insert_job(&self.writer, request, now).await
    }

    async fn reschedule_job(&self, request: &JobRequest, now: OffsetDateTime) -> Result<(), Error> {
        let mut tx = self.writer.begin().await?;
        sqlx::query("delete from jobs where key = ?1 and status in ('queued', 'claimed')")
            .bind(&request.key)
            .execute(&mut *tx)
            .await?;
        insert_job(&mut *tx, request, now).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn cancel_job(&self, key: &str) -> Result<(), Error> {
        sqlx::query("delete from jobs where key = ?1 and status in ('queued', 'claimed')")
            .bind(key)
            .execute(&self.writer)
            .await?;
        Ok(())
    }

    async fn claim_due_jobs(
        &self,
        now: OffsetDateTime,
        stale_before: OffsetDateTime,
        limit: u32,
        worker: &str,
    ) -> Result<Vec<ClaimedJob>, Error> {
        let rows: Vec<ClaimRow> = sqlx::query_as(
            r#"
            update jobs
            set status = 'claimed', claimed_by = ?1, claimed_at = ?2,
                attempts = attempts + 1, updated_at = ?2
            where id in (
                select id from jobs
                where (status = 'queued' and run_at <= ?2)
                   or (status = 'claimed' and claimed_at <= ?3)
                order by run_at asc
                limit ?4
            )
            returning id, key, payload, attempts, max_attempts
            "#,
        )
        .bind(worker)
        .bind(to_ms(now))
        .bind(to_ms(stale_before))
        .bind(limit as i64)
        .fetch_all(&self.writer)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ClaimedJob {
                    id: row.id,
                    payload: serde_json::from_str(&row.payload)?,
                    key: row.key,
                    attempt: u32::try_from(row.attempts)
                        .map_err(|_| Error::Corrupt(format!("attempts = {}", row.attempts)))?,
                    max_attempts: u32::try_from(row.max_attempts)
                        .map_err(|_| Error::Corrupt(format!("max_attempts = {}", row.max_attempts)))?,
                })
            })
            .collect()
    }

    async fn complete_job(&self, id: i64, now: OffsetDateTime) -> Result<(), Error> {
        sqlx::query("update jobs set status = 'completed', updated_at = ?2 where id = ?1")
            .bind(id)
            .bind(to_ms(now))
            .execute(&self.writer)
            .await?;
        Ok(())
    }

    async fn fail_job(
        &self,
        id: i64,
        error: &str,
        retry_at: Option<OffsetDateTime>,
        now: OffsetDateTime,
    ) -> Result<(), Error> {
        match retry_at {
            Some(retry_at) => {
                sqlx::query(
                    r#"
                    update jobs
                    set status = 'queued', run_at = ?2, last_error = ?3,
                        claimed_by = null, claimed_at = null, updated_at = ?4
                    where id = ?1
                    "#,
                )
                .bind(id)
                .bind(to_ms(retry_at))
                .bind(error)
                .bind(to_ms(now))
                .execute(&self.writer)
                .await?;
            }
            None => {
                sqlx::query(
                    r#"
                    update jobs
                    set status = 'failed', last_error = ?2, updated_at = ?3
                    where id = ?1
                    "#,
                )
                .bind(id)
                .bind(error)
                .bind(to_ms(now))
                .execute(&self.writer)
                .await?;
            }
        }
        Ok(())
    }

    async fn prune_jobs(&self, older_than: OffsetDateTime) -> Result<u64, Error> {
        let result = sqlx::query(
            "delete from jobs where status in ('completed', 'failed') and updated_at < ?1",
        )
        .bind(to_ms(older_than))
        .execute(&self.writer)
        .await?;
        Ok(result.rows_affected())
    }
}

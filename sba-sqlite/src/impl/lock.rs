use crate::types::to_ms;
use crate::{Db, Error};
use sba_core::ports::LockRepository;
use time::OffsetDateTime;

impl LockRepository for Db {
    async fn try_acquire_lock(
        &self,
        key: &str,
        owner: &str,
        ttl_ms: i64,
        now: OffsetDateTime,
    ) -> Result<bool, Error> {
        let now_ms = to_ms(now);
        // take the key when free, or steal it when the lease lapsed
        let result = sqlx::query(
            r#"
            insert into locks (key, owner, expires_at)
            values (?1, ?2, ?3)
            on conflict (key) do update
            set owner = excluded.owner, expires_at = excluded.expires_at
            where locks.expires_at <= ?4
            "#,
        )
        .bind(key)
        .bind(owner)
        .bind(now_ms + ttl_ms)
        .bind(now_ms)
        .execute(&self.writer)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn release_lock(&self, key: &str, owner: &str) -> Result<(), Error> {
        sqlx::query("delete from locks where key = ?1 and owner = ?2")
            .bind(key)
            .bind(owner)
            .execute(&self.writer)
            .await?;
        Ok(())
    }

    async fn extend_lock(
        &self,
        key: &str,
        owner: &str,
        ttl_ms: i64,
        now: OffsetDateTime,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            "update locks set expires_at = ?3 where key = ?1 and owner = ?2",
        )
        .bind(key)
        .bind(owner)
        .bind(to_ms(now) + ttl_ms)
        .execute(&self.writer)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

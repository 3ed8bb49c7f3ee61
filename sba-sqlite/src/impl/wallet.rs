use crate::types::{LedgerRow, UserRow, to_ms};
use crate::{Db, Error};
use sba_core::models::{AuctionId, BidId, LedgerEntry, LedgerKind, User, UserId};
use sba_core::ports::{WalletFailure, WalletRepository};
use sqlx::{Sqlite, Transaction};
use time::OffsetDateTime;

/// Apply one wallet mutation inside an open transaction, writing its ledger
/// row in the same breath.
///
/// This is the only code path that touches balances. Standalone wallet
/// operations wrap it in their own transaction; bid admission and round
/// settlement call it from theirs, so every freeze, win, and refund shares
/// the identical precondition checks and ledger bookkeeping.
pub(crate) async fn apply_wallet_op(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: UserId,
    kind: LedgerKind,
    amount: i64,
    auction_id: Option<AuctionId>,
    bid_id: Option<BidId>,
    now: OffsetDateTime,
) -> Result<Result<User, WalletFailure>, Error> {
    let user: UserRow = sqlx::query_as("select * from users where id = ?1")
        .bind(user_id.to_string())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(Error::MissingRow("user"))?;

    let (available, frozen) = match kind {
        LedgerKind::Deposit => (user.available + amount, user.frozen),
        LedgerKind::Freeze => {
            if user.available < amount {
                return Ok(Err(WalletFailure::InsufficientAvailable));
            }
            (user.available - amount, user.frozen + amount)
        }
        LedgerKind::Unfreeze | LedgerKind::Refund => {
            if user.frozen < amount {
                return Ok(Err(WalletFailure::InsufficientFrozen));
            }
            (user.available + amount, user.frozen - amount)
        }
        LedgerKind::Win => {
            if user.frozen < amount {
                return Ok(Err(WalletFailure::InsufficientFrozen));
            }
            (user.available, user.frozen - amount)
        }
    };

    sqlx::query("update users set available = ?2, frozen = ?3 where id = ?1")
        .bind(&user.id)
        .bind(available)
        .bind(frozen)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        r#"
        insert into ledger
            (user_id, kind, amount, auction_id, bid_id,
             balance_before, balance_after, frozen_before, frozen_after, created_at)
        values
            (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&user.id)
    .bind(kind.to_string())
    .bind(amount)
    .bind(auction_id.map(|id| id.to_string()))
    .bind(bid_id.map(|id| id.to_string()))
    .bind(user.available)
    .bind(available)
    .bind(user.frozen)
    .bind(frozen)
    .bind(to_ms(now))
    .execute(&mut **tx)
    .await?;

    let updated = UserRow {
        available,
        frozen,
        ..user
    };
    Ok(Ok(updated.try_into()?))
}

impl Db {
    /// One standalone wallet op: its own transaction around
    /// [`apply_wallet_op`].
    async fn wallet_op(
        &self,
        user_id: UserId,
        kind: LedgerKind,
        amount: i64,
        auction_id: AuctionId,
        bid_id: BidId,
        now: OffsetDateTime,
    ) -> Result<Result<User, WalletFailure>, Error> {
        let mut tx = self.writer.begin().await?;
        let outcome =
            apply_wallet_op(&mut tx, user_id, kind, amount, Some(auction_id), Some(bid_id), now)
                .await?;
        match outcome {
            Ok(user) => {
                tx.commit().await?;
                Ok(Ok(user))
            }
            Err(failure) => {
                tx.rollback().await?;
                Ok(Err(failure))
            }
        }
    }
}

impl WalletRepository for Db {
    async fn get_user(&self, user_id: UserId) -> Result<Option<User>, Error> {
        let row: Option<UserRow> = sqlx::query_as("select * from users where id = ?1")
            .bind(user_id.to_string())
            .fetch_optional(&self.reader)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn ensure_user(
        &self,
        id: UserId,
        username: &str,
        now: OffsetDateTime,
    ) -> Result<User, Error> {
        sqlx::query(
            r#"
            insert into users (id, username, available, frozen, created_at)
            values (?1, ?2, 0, 0, ?3)
            on conflict (username) do nothing
            "#,
        )
        .bind(id.to_string())
        .bind(username)
        .bind(to_ms(now))
        .execute(&self.writer)
        .await?;

        let row: UserRow = sqlx::query_as("select * from users where username = ?1")
            .bind(username)
            .fetch_one(&self.reader)
            .await?;
        row.try_into()
    }

    async fn deposit(
        &self,
        user_id: UserId,
        amount: i64,
        now: OffsetDateTime,
    ) -> Result<Option<User>, Error> {
        let mut tx = self.writer.begin().await?;
        let exists: Option<(i64,)> = sqlx::query_as("select 1 from users where id = ?1")
            .bind(user_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }
        let user = apply_wallet_op(&mut tx, user_id, LedgerKind::Deposit, amount, None, None, now)
            .await?
            .map_err(|_| Error::Corrupt("deposit refused".to_owned()))?;
        tx.commit().await?;
        Ok(Some(user))
    }

    async fn freeze(
        &self,
        user_id: UserId,
        amount: i64,
        auction_id: AuctionId,
        bid_id: BidId,
        now: OffsetDateTime,
    ) -> Result<Result<User, WalletFailure>, Error> {
        self.wallet_op(user_id, LedgerKind::Freeze, amount, auction_id, bid_id, now)
            .await
    }

    async fn unfreeze(
        &self,
        user_id: UserId,
        amount: i64,
        auction_id: AuctionId,
        bid_id: BidId,
        now: OffsetDateTime,
    ) -> Result<Result<User, WalletFailure>, Error> {
        self.wallet_op(user_id, LedgerKind::Unfreeze, amount, auction_id, bid_id, now)
            .await
    }

    async fn consume_win(
        &self,
        user_id: UserId,
        amount: i64,
        auction_id: AuctionId,
        bid_id: BidId,
        now: OffsetDateTime,
    ) -> Result<Result<User, WalletFailure>, Error> {
        self.wallet_op(user_id, LedgerKind::Win, amount, auction_id, bid_id, now)
            .await
    }

    async fn refund(
        &self,
        user_id: UserId,
        amount: i64,
        auction_id: AuctionId,
        bid_id: BidId,
        now: OffsetDateTime,
    ) -> Result<Result<User, WalletFailure>, Error> {
        self.wallet_op(user_id, LedgerKind::Refund, amount, auction_id, bid_id, now)
            .await
    }

    async fn ledger_entries(&self, user_id: UserId, limit: u32) -> Result<Vec<LedgerEntry>, Error> {
        let rows: Vec<LedgerRow> = sqlx::query_as(
            r#"
            select * from ledger
            where user_id = ?1
            order by created_at desc, id desc
            limit ?2
            "#,
        )
        .bind(user_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.reader)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

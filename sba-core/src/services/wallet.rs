use super::{Engine, EngineResult, Rejection};
use crate::models::{Bid, LedgerEntry, USERNAME_MAX, USERNAME_MIN, User, UserId};
use crate::ports::{AuctionStore, BidRepository as _, EventSink, WalletRepository as _};
use time::OffsetDateTime;
use tracing::{Level, event};

impl<R: AuctionStore, S: EventSink> Engine<R, S> {
    /// Log a user in by username, creating them on first sight.
    pub async fn login(&self, username: &str, now: OffsetDateTime) -> EngineResult<User, R::Error> {
        let len = username.chars().count();
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
            return Ok(Err(Rejection::Invalid(format!(
                "username must be {USERNAME_MIN}-{USERNAME_MAX} characters"
            ))));
        }
        let user = self
            .store
            .ensure_user(UserId::random(), username, now)
            .await?;
        Ok(Ok(user))
    }

    /// Fetch a user by id.
    pub async fn user(&self, user_id: UserId) -> EngineResult<User, R::Error> {
        match self.store.get_user(user_id).await? {
            Some(user) => Ok(Ok(user)),
            None => Ok(Err(Rejection::NotFound("user"))),
        }
    }

    /// Add funds to a user's available balance.
    pub async fn deposit(
        &self,
        user_id: UserId,
        amount: i64,
        now: OffsetDateTime,
    ) -> EngineResult<User, R::Error> {
        if amount < 1 {
            return Ok(Err(Rejection::Invalid(
                "deposit amount must be at least 1".to_owned(),
            )));
        }
        match self.store.deposit(user_id, amount, now).await? {
            Some(user) => {
                event!(Level::INFO, user = %user_id, amount, "deposit");
                Ok(Ok(user))
            }
            None => Ok(Err(Rejection::NotFound("user"))),
        }
    }

    /// The user's winning bids, newest first.
    pub async fn wins(&self, user_id: UserId) -> Result<Vec<Bid>, R::Error> {
        self.store.wins_for_user(user_id).await
    }

    /// All of the user's bids, newest first.
    pub async fn bid_history(&self, user_id: UserId) -> Result<Vec<Bid>, R::Error> {
        self.store.bids_for_user(user_id).await
    }

    /// The user's wallet transaction log, newest first.
    pub async fn ledger(&self, user_id: UserId, limit: u32) -> Result<Vec<LedgerEntry>, R::Error> {
        self.store.ledger_entries(user_id, limit).await
    }
}

use super::{Engine, EngineResult, Rejection};
use crate::ports::{AuctionStore, EventSink, LockRepository as _};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{Level, event};

impl<R: AuctionStore, S: EventSink> Engine<R, S> {
    /// Run `f` while holding the distributed lock on `key`.
    ///
    /// Acquisition retries with exponential backoff up to the configured
    /// attempt budget and gives up with [`Rejection::LockTimeout`]. The lock
    /// is released on every exit path except a panic, where the TTL lapses
    /// instead.
    pub(crate) async fn with_lock<T>(
        &self,
        key: &str,
        f: impl AsyncFnOnce() -> EngineResult<T, R::Error>,
    ) -> EngineResult<T, R::Error> {
        let owner = uuid::Uuid::new_v4().to_string();

        let mut acquired = false;
        for attempt in 0..self.config.lock_attempts {
            if attempt > 0 {
                let backoff = self.config.lock_backoff_ms << (attempt - 1).min(6);
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
            if self
                .store
                .try_acquire_lock(
                    key,
                    &owner,
                    self.config.lock_ttl_ms,
                    OffsetDateTime::now_utc(),
                )
                .await?
            {
                acquired = true;
                break;
            }
        }
        if !acquired {
            return Ok(Err(Rejection::LockTimeout {
                key: key.to_owned(),
            }));
        }

        let result = f().await;

        if let Err(err) = self.store.release_lock(key, &owner).await {
            // the lease will expire on its own
            event!(Level::WARN, key, err = %err, "failed to release lock");
        }

        result
    }
}

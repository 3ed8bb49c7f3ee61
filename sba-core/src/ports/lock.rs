use super::Repository;
use std::future::Future;
use time::OffsetDateTime;

/// Key-scoped mutual exclusion across all workers.
///
/// A lock is held by an owner token until released or until its TTL lapses,
/// so a crashed holder cannot wedge the key forever. Release and extension
/// are guarded by the token: a worker that lost its lease cannot release a
/// successor's acquisition.
pub trait LockRepository: Repository {
    /// Try to take the key. Succeeds when the key is free or its current
    /// lease has expired.
    fn try_acquire_lock(
        &self,
        key: &str,
        owner: &str,
        ttl_ms: i64,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Release the key if still held by `owner`.
    fn release_lock(
        &self,
        key: &str,
        owner: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Push the lease out by another TTL if still held by `owner`.
    fn extend_lock(
        &self,
        key: &str,
        owner: &str,
        ttl_ms: i64,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}

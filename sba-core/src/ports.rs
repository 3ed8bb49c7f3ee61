mod auction;
mod bid;
mod events;
mod lock;
mod queue;
mod round;
mod wallet;

pub use auction::AuctionRepository;
pub use bid::{BidFailure, BidRepository, BidWrite};
pub use events::{EventSink, NullEventSink};
pub use lock::LockRepository;
pub use queue::{ClaimedJob, JobPayload, JobRepository, JobRequest};
pub use round::{NextRound, RoundRepository, SettledRefund, SettledWin, SettlementPlan};
pub use wallet::{WalletFailure, WalletRepository};

/// Base trait for everything the engine persists through.
///
/// Adapters surface their own failure type here; the engine treats it as
/// opaque and transient (I/O-shaped), while domain rejections travel in the
/// inner result of the individual operations.
pub trait Repository {
    /// The adapter's error type.
    type Error: std::error::Error + Send + Sync + 'static;
}

/// A marker trait combining every port the engine needs.
///
/// This is the single bound consumers depend on; an adapter implements the
/// individual ports and then declares itself an [`AuctionStore`].
pub trait AuctionStore:
    WalletRepository
    + AuctionRepository
    + RoundRepository
    + BidRepository
    + LockRepository
    + JobRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

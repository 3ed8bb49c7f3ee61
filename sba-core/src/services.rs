mod auction;
mod bid;
mod bootstrap;
mod lock;
mod round;
mod wallet;
mod worker;

pub use bootstrap::BootstrapReport;
pub use round::SettlementOutcome;

use crate::models::EngineConfig;
use crate::ports::{AuctionStore, EventSink};
use thiserror::Error;

/// A request the engine refused for a domain reason.
///
/// Rejections are the business-rule half of the error surface; adapter
/// failures travel in the outer `Result` of [`EngineResult`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The auction is not accepting bids.
    #[error("auction is not active")]
    AuctionNotActive,
    /// The auction has no round currently accepting bids.
    #[error("no active round")]
    NoActiveRound,
    /// The round's deadline has passed.
    #[error("round has ended")]
    RoundEnded,
    /// The bid is below the auction's minimum.
    #[error("bid is below the minimum of {min_bid}")]
    BelowMinimum {
        /// The auction's minimum bid.
        min_bid: i64,
    },
    /// The wallet cannot cover the freeze.
    #[error("insufficient available funds")]
    InsufficientFunds,
    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// The request failed validation.
    #[error("{0}")]
    Invalid(String),
    /// Lock acquisition gave up after its bounded retries.
    #[error("could not acquire lock {key}")]
    LockTimeout {
        /// The contested key.
        key: String,
    },
    /// A money invariant was found broken; the affected aggregate is halted
    /// for operator intervention.
    #[error("invariant violation: {0}")]
    Invariant(String),
}

/// The engine's two-level result: adapter errors outside, domain
/// rejections inside.
pub type EngineResult<T, E> = Result<Result<T, Rejection>, E>;

/// The auction engine.
///
/// One instance per worker, shared by the HTTP handlers, the job worker,
/// and the fallback poller. All state lives behind the store; the engine
/// itself is just configuration plus the two handles.
#[derive(Debug, Clone)]
pub struct Engine<R, S> {
    store: R,
    events: S,
    config: EngineConfig,
}

impl<R: AuctionStore, S: EventSink> Engine<R, S> {
    /// Construct an engine over a store and an event sink.
    pub fn new(store: R, events: S, config: EngineConfig) -> Self {
        Self {
            store,
            events,
            config,
        }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Direct access to the store, for read-only call sites.
    pub fn store(&self) -> &R {
        &self.store
    }
}

mod auction;
mod bid;
mod config;
mod event;
mod ids;
mod ledger;
mod round;
mod user;

pub use auction::{ActiveRoundSummary, Auction, AuctionStatus, AuctionSummary, NewAuction};
pub use bid::{Bid, BidReceipt, BidStatus, MyBid};
pub use config::EngineConfig;
pub use event::{AuctionEvent, LeaderboardEntry};
pub use ids::{AuctionId, BidId, RoundId, UserId};
pub use ledger::{LedgerEntry, LedgerKind};
pub use round::{Round, RoundStatus};
pub use user::{USERNAME_MAX, USERNAME_MIN, User};

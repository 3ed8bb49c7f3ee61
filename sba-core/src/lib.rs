#![warn(missing_docs)]
//! Core domain for multi-round sealed-bid auctions.
//!
//! Each auction distributes a fixed pool of indivisible items across a fixed
//! number of rounds. Within a round the top-K bids (ordered by amount, then
//! arrival) win items and everyone else is refunded in full. Bids are funded
//! from a per-user wallet: placing or raising a bid freezes the amount, a win
//! consumes the frozen funds, and a loss releases them.
//!
//! This crate is the hexagonal core: plain data structures, the port traits
//! that adapters implement, and the engine services that drive the round
//! lifecycle. It has no knowledge of any particular database or transport.

/// Core domain models for the auction system.
///
/// The aggregates here are structurally fixed, typed records: users with
/// wallet balances, auctions, rounds, bids, and the append-only ledger.
pub mod models;

/// Interface traits for the auction system.
///
/// These traits define the contract between the engine and external adapters
/// (persistence, the job queue, the distributed lock, the event fan-out)
/// without specifying implementation details.
pub mod ports;

/// The engine services: bid admission, round settlement, auction lifecycle,
/// the job worker, and startup reconciliation.
pub mod services;

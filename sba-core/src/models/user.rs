use super::UserId;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A user and their wallet balances.
///
/// Created on first login. Both balances are integer amounts and never go
/// negative; every mutation happens through the wallet ledger and writes a
/// matching [`super::LedgerEntry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Opaque user identity.
    pub id: UserId,
    /// Unique display name, 3-50 characters.
    pub username: String,
    /// Funds available for new bids or raises.
    pub available: i64,
    /// Funds reserved against active bids.
    pub frozen: i64,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Bounds on usernames accepted at login.
pub const USERNAME_MIN: usize = 3;
/// Upper bound on username length.
pub const USERNAME_MAX: usize = 50;

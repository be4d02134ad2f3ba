//! Core data model: identities, round state and the persisted snapshot.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::RaffleError;

/// Stake and payout amounts, in the ledger's smallest unit.
pub type Amount = u64;

/// Identifier the oracle assigns to a randomness request.
pub type RequestId = u64;

/// Seconds since the Unix epoch.
pub type UnixTimestamp = i64;

/// 32-byte identity of a participant or vault on the entry ledger.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub const fn new(bytes: [u8; 32]) -> Self {
        AccountId(bytes)
    }

    /// Returns an identity unique within this process. Intended for tests
    /// and demos; real deployments carry ledger-assigned identities.
    pub fn new_unique() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&n.to_le_bytes());
        AccountId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", hex::encode(self.0))
    }
}

/// Status of the active round.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundStatus {
    /// Round is open for entries.
    Open,
    /// Draw in flight, waiting on the oracle.
    Calculating,
}

/// One draw cycle, from opening to winner selection.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Round {
    /// Sequential round number, starting at 1.
    pub index: u64,
    /// Whether the round accepts entries or waits on a draw.
    pub status: RoundStatus,
    /// When this round opened.
    pub started_at: UnixTimestamp,
}

impl Round {
    pub fn open(index: u64, started_at: UnixTimestamp) -> Self {
        Self {
            index,
            status: RoundStatus::Open,
            started_at,
        }
    }
}

/// Engine configuration, fixed for the lifetime of a raffle instance.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Minimum stake required to join a round.
    pub entrance_fee: Amount,
    /// Seconds a round must have been open before a draw may start.
    pub interval: u64,
    /// Seconds after which an unanswered randomness request may be
    /// expired via `Raffle::expire_stale_draw`. `None` waits forever.
    pub request_timeout: Option<u64>,
}

impl RaffleConfig {
    pub fn new(entrance_fee: Amount, interval: u64) -> Self {
        Self {
            entrance_fee,
            interval,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout = Some(secs);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), RaffleError> {
        if self.entrance_fee == 0 {
            return Err(RaffleError::InvalidConfig(
                "entrance fee must be greater than zero",
            ));
        }
        if self.interval == 0 {
            return Err(RaffleError::InvalidConfig(
                "interval must be greater than zero",
            ));
        }
        if self.request_timeout == Some(0) {
            return Err(RaffleError::InvalidConfig(
                "request timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// One participant entry in the current round.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub identity: AccountId,
    pub stake: Amount,
}

/// An issued randomness request awaiting fulfillment.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutstandingRequest {
    pub request_id: RequestId,
    /// Round that was moved to `Calculating` when this request was issued.
    pub round: u64,
    pub requested_at: UnixTimestamp,
}

/// A selected winner whose payout transfer has not succeeded yet.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingPayout {
    pub winner: AccountId,
    pub round: u64,
    pub amount: Amount,
}

/// Outcome of a completed round.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WinnerRecord {
    pub identity: AccountId,
    pub round: u64,
    pub payout: Amount,
}

/// Durable engine state, as captured by `Raffle::snapshot`.
///
/// Pooled stake is not stored; `Raffle::restore` recomputes it from the
/// entries so the two can never disagree.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RaffleSnapshot {
    pub config: RaffleConfig,
    pub vault: AccountId,
    pub round: Round,
    /// Entries in entry order; order drives winner selection.
    pub entries: Vec<Entry>,
    /// Outstanding randomness requests, sorted by request id.
    pub outstanding: Vec<OutstandingRequest>,
    pub pending_payout: Option<PendingPayout>,
    pub recent_winner: Option<WinnerRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_ids_do_not_collide() {
        let a = AccountId::new_unique();
        let b = AccountId::new_unique();
        assert_ne!(a, b);
    }

    #[test]
    fn account_id_displays_as_hex() {
        let id = AccountId::new([0xab; 32]);
        assert_eq!(id.to_string(), "ab".repeat(32));
    }

    #[test]
    fn config_rejects_zero_fee() {
        let config = RaffleConfig::new(0, 30);
        assert!(matches!(
            config.validate(),
            Err(RaffleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_rejects_zero_interval() {
        let config = RaffleConfig::new(1, 0);
        assert!(matches!(
            config.validate(),
            Err(RaffleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_rejects_zero_timeout() {
        let config = RaffleConfig::new(1, 30).with_request_timeout(0);
        assert!(matches!(
            config.validate(),
            Err(RaffleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_accepts_sane_values() {
        let config = RaffleConfig::new(25_000_000, 3600).with_request_timeout(600);
        assert!(config.validate().is_ok());
    }
}

//! Errors surfaced by the raffle engine.

use thiserror::Error;

use crate::ledger::LedgerError;
use crate::state::{Amount, RequestId};
use crate::upkeep::UpkeepReason;

/// Errors that may be returned by the raffle engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Entry stake below the entrance fee.
    #[error("stake of {provided} is below the entrance fee of {required}")]
    InsufficientStake { provided: Amount, required: Amount },

    /// The vault tried to stake into itself.
    #[error("the vault cannot enter its own raffle")]
    VaultEntry,

    /// Entry attempted while a draw is in flight.
    #[error("round is not open for entries")]
    NotOpen,

    /// Draw attempted while the upkeep predicate does not hold.
    #[error("upkeep not needed: {0}")]
    UpkeepNotNeeded(UpkeepReason),

    /// Fulfillment for a request id that is not tracked for the
    /// current round. Covers ids that were never issued, already
    /// consumed, or expired.
    #[error("unknown randomness request {0}")]
    UnknownRequest(RequestId),

    /// The oracle delivered an empty word list.
    #[error("randomness fulfillment carried no words")]
    EmptyRandomWords,

    /// The entry ledger refused a stake or payout transfer.
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] LedgerError),

    /// Participant lookup outside the registry bounds.
    #[error("entry index {index} out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    /// Checked arithmetic on pooled stake wrapped.
    #[error("arithmetic overflow")]
    Overflow,

    /// Configuration rejected at construction.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),

    /// Payout retry requested while no payout is parked.
    #[error("no payout is pending")]
    NoPendingPayout,

    /// Expiry requested while no request qualifies as stale.
    #[error("no stale randomness request to expire")]
    NoStaleDraw,
}

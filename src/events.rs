//! Lifecycle events emitted by the engine for external listeners.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::state::{AccountId, Amount, RequestId, UnixTimestamp};

/// Observable steps of the round lifecycle, in emission order.
///
/// Events accumulate in an internal journal until drained with
/// `Raffle::take_events`; embedders that care about them should drain
/// regularly.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    /// A round opened and is accepting entries.
    RoundOpened {
        round: u64,
        started_at: UnixTimestamp,
    },
    /// A participant joined the current round.
    EntryRecorded {
        identity: AccountId,
        /// Ordinal position of the entry within the round.
        index: u64,
        amount: Amount,
    },
    /// The draw started and randomness was requested from the oracle.
    DrawRequested { round: u64, request_id: RequestId },
    /// A stale randomness request was abandoned and the round reopened.
    DrawAborted { round: u64, request_id: RequestId },
    /// The oracle answered and the pooled stake went to the winner.
    WinnerPicked {
        identity: AccountId,
        round: u64,
        payout: Amount,
    },
}

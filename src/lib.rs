// Tombola
// A timed, verifiably-random, single-winner raffle engine

//! Rounds open, collect staked entries, and after a configured interval
//! any caller can start the draw. Winner selection is driven by random
//! words delivered asynchronously by a pluggable oracle; the full
//! pooled stake goes to the winner and the next round opens.
//!
//! Funds and randomness live behind the [`EntryLedger`] and
//! [`RandomnessOracle`] traits, so the engine embeds anywhere those two
//! collaborators can be provided. [`InMemoryLedger`] and
//! [`SequenceOracle`] cover tests and demos.
//!
//! ```
//! use std::sync::Arc;
//! use tombola::{AccountId, InMemoryLedger, ManualClock, Raffle, RaffleConfig, SequenceOracle};
//!
//! let ledger = Arc::new(InMemoryLedger::new());
//! let oracle = Arc::new(SequenceOracle::new());
//! let clock = Arc::new(ManualClock::new(1_700_000_000));
//!
//! let raffle = Raffle::new(
//!     RaffleConfig::new(25_000_000, 30),
//!     AccountId::new_unique(),
//!     ledger.clone(),
//!     oracle,
//!     clock.clone(),
//! )
//! .unwrap();
//!
//! let player = AccountId::new_unique();
//! ledger.credit(player, 100_000_000);
//! raffle.enter(player, 25_000_000).unwrap();
//!
//! clock.advance(30);
//! assert!(raffle.check_upkeep().needed);
//! let request_id = raffle.perform_upkeep().unwrap();
//!
//! // The oracle answers out of band; its words drive the draw.
//! let winner = raffle.fulfill_randomness(request_id, &[7]).unwrap();
//! assert_eq!(winner.identity, player);
//! ```

pub mod clock;
pub mod error;
pub mod events;
pub mod ledger;
pub mod oracle;
pub mod raffle;
pub(crate) mod registry;
pub mod state;
pub(crate) mod tracker;
pub mod upkeep;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::RaffleError;
pub use events::RaffleEvent;
pub use ledger::{EntryLedger, InMemoryLedger, LedgerError};
pub use oracle::{RandomnessOracle, SequenceOracle};
pub use raffle::Raffle;
pub use state::{
    AccountId, Amount, Entry, OutstandingRequest, PendingPayout, RaffleConfig, RaffleSnapshot,
    RequestId, Round, RoundStatus, UnixTimestamp, WinnerRecord,
};
pub use upkeep::{time_passed, UpkeepCheck, UpkeepReason};

//! The round state machine coordinating entries, draws and payouts.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::error::RaffleError;
use crate::events::RaffleEvent;
use crate::ledger::EntryLedger;
use crate::oracle::RandomnessOracle;
use crate::registry::EntryRegistry;
use crate::state::{
    AccountId, Amount, PendingPayout, RaffleConfig, RaffleSnapshot, RequestId, Round, RoundStatus,
    UnixTimestamp, WinnerRecord,
};
use crate::tracker::RequestTracker;
use crate::upkeep::{self, UpkeepCheck};

/// Timed, verifiably-random, single-winner raffle engine.
///
/// A raffle runs an endless sequence of rounds. While a round is
/// `Open`, participants enter by staking at least the entrance fee into
/// the vault. Once the configured interval has elapsed and at least one
/// funded entry exists, any caller may start the draw: the round moves
/// to `Calculating`, a randomness request is issued to the oracle, and
/// entries are frozen. When the oracle answers, the first random word
/// selects the winner by entry position, the full pooled stake is paid
/// out, and the next round opens.
///
/// All mutable state sits behind one lock, so transitions are atomic
/// with respect to concurrent callers: of several racing
/// `perform_upkeep` calls, exactly one starts the draw.
pub struct Raffle {
    config: RaffleConfig,
    vault: AccountId,
    ledger: Arc<dyn EntryLedger>,
    oracle: Arc<dyn RandomnessOracle>,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

struct Inner {
    round: Round,
    registry: EntryRegistry,
    tracker: RequestTracker,
    pending_payout: Option<PendingPayout>,
    recent_winner: Option<WinnerRecord>,
    events: Vec<RaffleEvent>,
}

impl Raffle {
    /// Opens round 1 at the current time.
    pub fn new(
        config: RaffleConfig,
        vault: AccountId,
        ledger: Arc<dyn EntryLedger>,
        oracle: Arc<dyn RandomnessOracle>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RaffleError> {
        config.validate()?;
        let started_at = clock.now_ts();
        let round = Round::open(1, started_at);
        info!(
            round = round.index,
            started_at,
            entrance_fee = config.entrance_fee,
            interval = config.interval,
            "raffle opened"
        );
        Ok(Self {
            config,
            vault,
            ledger,
            oracle,
            clock,
            inner: Mutex::new(Inner {
                round,
                registry: EntryRegistry::new(),
                tracker: RequestTracker::new(),
                pending_payout: None,
                recent_winner: None,
                events: vec![RaffleEvent::RoundOpened {
                    round: round.index,
                    started_at,
                }],
            }),
        })
    }

    /// Rebuilds an engine from a snapshot and live collaborators.
    ///
    /// Only bytes produced by [`Raffle::snapshot`] are supported. The
    /// event journal is not persisted; a restored engine starts with an
    /// empty one.
    pub fn restore(
        snapshot: RaffleSnapshot,
        ledger: Arc<dyn EntryLedger>,
        oracle: Arc<dyn RandomnessOracle>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RaffleError> {
        snapshot.config.validate()?;
        let registry = EntryRegistry::from_entries(snapshot.entries)?;
        let tracker = RequestTracker::from_outstanding(snapshot.outstanding);
        info!(
            round = snapshot.round.index,
            status = ?snapshot.round.status,
            players = registry.player_count(),
            stake = registry.total_stake(),
            "raffle restored"
        );
        Ok(Self {
            config: snapshot.config,
            vault: snapshot.vault,
            ledger,
            oracle,
            clock,
            inner: Mutex::new(Inner {
                round: snapshot.round,
                registry,
                tracker,
                pending_payout: snapshot.pending_payout,
                recent_winner: snapshot.recent_winner,
                events: Vec::new(),
            }),
        })
    }

    /// Joins the current round with `amount` staked.
    ///
    /// The stake moves into the vault through the entry ledger before
    /// the participant is appended; a refused transfer leaves the
    /// registry untouched. The vault itself cannot enter: its
    /// self-transfer moves nothing, so the entry would pool stake the
    /// vault does not hold. Returns the assigned entry position.
    pub fn enter(&self, identity: AccountId, amount: Amount) -> Result<usize, RaffleError> {
        let mut inner = self.inner.lock();
        if amount < self.config.entrance_fee {
            return Err(RaffleError::InsufficientStake {
                provided: amount,
                required: self.config.entrance_fee,
            });
        }
        if identity == self.vault {
            warn!(%identity, round = inner.round.index, "entry rejected: vault cannot enter");
            return Err(RaffleError::VaultEntry);
        }
        if inner.round.status != RoundStatus::Open {
            warn!(%identity, round = inner.round.index, "entry rejected: draw in flight");
            return Err(RaffleError::NotOpen);
        }
        inner.registry.can_accept(amount)?;
        self.ledger.transfer(identity, self.vault, amount)?;
        let index = inner.registry.record(identity, amount)?;
        let round = inner.round.index;
        inner.events.push(RaffleEvent::EntryRecorded {
            identity,
            index: index as u64,
            amount,
        });
        info!(%identity, index, amount, round, "entry recorded");
        Ok(index)
    }

    /// Evaluates whether a draw may start. Side-effect-free: repeated
    /// calls observe, they never transition.
    pub fn check_upkeep(&self) -> UpkeepCheck {
        let inner = self.inner.lock();
        let check = upkeep::evaluate(
            &inner.round,
            &inner.registry,
            self.clock.now_ts(),
            self.config.interval,
        );
        debug!(needed = check.needed, reason = %check.reason, "upkeep checked");
        check
    }

    /// Starts the draw: re-verifies the upkeep predicate under the
    /// lock, moves the round to `Calculating` and issues a randomness
    /// request. Returns the oracle-assigned request id.
    ///
    /// Exactly one caller wins this transition per round; the rest see
    /// `UpkeepNotNeeded`.
    pub fn perform_upkeep(&self) -> Result<RequestId, RaffleError> {
        let mut inner = self.inner.lock();
        let now = self.clock.now_ts();
        let check = upkeep::evaluate(&inner.round, &inner.registry, now, self.config.interval);
        if !check.needed {
            debug!(reason = %check.reason, "upkeep rejected");
            return Err(RaffleError::UpkeepNotNeeded(check.reason));
        }
        inner.round.status = RoundStatus::Calculating;
        let round = inner.round.index;
        let request_id = inner
            .tracker
            .register(self.oracle.as_ref(), self.vault, round, now);
        inner.events.push(RaffleEvent::DrawRequested { round, request_id });
        info!(
            round,
            request_id,
            players = inner.registry.player_count(),
            stake = inner.registry.total_stake(),
            "draw requested"
        );
        Ok(request_id)
    }

    /// Delivers the oracle's random words for `request_id`.
    ///
    /// The request is consumed one-shot: a second delivery for the same
    /// id fails with `UnknownRequest`, as does any id that was never
    /// issued for the current round. The first word selects the winner
    /// by entry position, the full pooled stake is transferred from the
    /// vault, and the next round opens.
    ///
    /// If the payout transfer fails the winner is parked and the round
    /// stays `Calculating` until [`Raffle::retry_payout`] succeeds; the
    /// stake never silently dissolves.
    pub fn fulfill_randomness(
        &self,
        request_id: RequestId,
        random_words: &[u64],
    ) -> Result<WinnerRecord, RaffleError> {
        if random_words.is_empty() {
            // Rejected before the request is consumed, so a correct
            // delivery can still follow.
            warn!(request_id, "fulfillment rejected: no random words");
            return Err(RaffleError::EmptyRandomWords);
        }
        let mut inner = self.inner.lock();
        let tracked_round = match inner.tracker.get(request_id) {
            Some(request) => request.round,
            None => {
                warn!(request_id, "fulfillment rejected: unknown request");
                return Err(RaffleError::UnknownRequest(request_id));
            }
        };
        if tracked_round != inner.round.index || inner.round.status != RoundStatus::Calculating {
            warn!(
                request_id,
                tracked_round,
                round = inner.round.index,
                "fulfillment rejected: request does not match the current draw"
            );
            return Err(RaffleError::UnknownRequest(request_id));
        }
        // One-shot from here on: the id is gone even if the payout
        // still fails downstream.
        inner.tracker.consume(request_id)?;
        let (winner_index, entry) = inner.registry.pick(random_words[0])?;
        let payout = inner.registry.total_stake();
        let round = inner.round.index;
        info!(
            round,
            request_id,
            winner_index,
            winner = %entry.identity,
            payout,
            "winner selected"
        );
        self.settle(&mut inner, entry.identity, payout, round)
    }

    /// Re-drives a payout whose ledger transfer failed during
    /// fulfillment. The randomness request was already consumed and is
    /// not reissued; the round reopens once the transfer goes through.
    pub fn retry_payout(&self) -> Result<WinnerRecord, RaffleError> {
        let mut inner = self.inner.lock();
        let pending = inner.pending_payout.ok_or(RaffleError::NoPendingPayout)?;
        info!(
            winner = %pending.winner,
            amount = pending.amount,
            round = pending.round,
            "retrying payout"
        );
        self.settle(&mut inner, pending.winner, pending.amount, pending.round)
    }

    /// Abandons a randomness request that outlived the configured
    /// `request_timeout`.
    ///
    /// The id is consumed, so a late oracle delivery for it fails with
    /// `UnknownRequest`. Entries and the opening timestamp survive, so
    /// the reopened round passes the upkeep gate immediately and a
    /// fresh request can be issued. Fails with `NoStaleDraw` when no
    /// timeout is configured or nothing qualifies.
    pub fn expire_stale_draw(&self) -> Result<RequestId, RaffleError> {
        let timeout = self.config.request_timeout.ok_or(RaffleError::NoStaleDraw)?;
        let mut inner = self.inner.lock();
        if inner.round.status != RoundStatus::Calculating {
            return Err(RaffleError::NoStaleDraw);
        }
        let now = self.clock.now_ts();
        let request_id = inner
            .tracker
            .stale_request(now, timeout)
            .ok_or(RaffleError::NoStaleDraw)?;
        inner.tracker.consume(request_id)?;
        inner.round.status = RoundStatus::Open;
        let round = inner.round.index;
        inner.events.push(RaffleEvent::DrawAborted { round, request_id });
        warn!(round, request_id, "stale draw aborted; round reopened");
        Ok(request_id)
    }

    /// Captures all durable state for persistence.
    pub fn snapshot(&self) -> RaffleSnapshot {
        let inner = self.inner.lock();
        RaffleSnapshot {
            config: self.config,
            vault: self.vault,
            round: inner.round,
            entries: inner.registry.entries().to_vec(),
            outstanding: inner.tracker.outstanding(),
            pending_payout: inner.pending_payout,
            recent_winner: inner.recent_winner,
        }
    }

    /// Drains the event journal, returning events in emission order.
    pub fn take_events(&self) -> Vec<RaffleEvent> {
        std::mem::take(&mut self.inner.lock().events)
    }

    pub fn round_status(&self) -> RoundStatus {
        self.inner.lock().round.status
    }

    pub fn round_index(&self) -> u64 {
        self.inner.lock().round.index
    }

    /// When the current round opened.
    pub fn last_round_timestamp(&self) -> UnixTimestamp {
        self.inner.lock().round.started_at
    }

    pub fn entrance_fee(&self) -> Amount {
        self.config.entrance_fee
    }

    pub fn interval(&self) -> u64 {
        self.config.interval
    }

    pub fn vault(&self) -> AccountId {
        self.vault
    }

    pub fn player_count(&self) -> usize {
        self.inner.lock().registry.player_count()
    }

    /// Participant at entry position `index` in the current round.
    pub fn player_at(&self, index: usize) -> Result<AccountId, RaffleError> {
        self.inner.lock().registry.player_at(index)
    }

    /// Stake pooled in the current round.
    pub fn total_stake(&self) -> Amount {
        self.inner.lock().registry.total_stake()
    }

    pub fn recent_winner(&self) -> Option<WinnerRecord> {
        self.inner.lock().recent_winner
    }

    /// Winner whose payout transfer has not gone through yet, if any.
    pub fn pending_payout(&self) -> Option<PendingPayout> {
        self.inner.lock().pending_payout
    }

    /// Pays `amount` from the vault to `winner` and reopens the round,
    /// or parks the payout if the ledger refuses.
    fn settle(
        &self,
        inner: &mut Inner,
        winner: AccountId,
        amount: Amount,
        round: u64,
    ) -> Result<WinnerRecord, RaffleError> {
        if let Err(cause) = self.ledger.transfer(self.vault, winner, amount) {
            inner.pending_payout = Some(PendingPayout {
                winner,
                round,
                amount,
            });
            error!(%winner, amount, round, %cause, "payout transfer failed; parked for retry");
            return Err(RaffleError::TransferFailed(cause));
        }
        let record = WinnerRecord {
            identity: winner,
            round,
            payout: amount,
        };
        inner.registry.reset_all();
        inner.pending_payout = None;
        inner.recent_winner = Some(record);
        let started_at = self.clock.now_ts();
        inner.round = Round::open(round + 1, started_at);
        inner.events.push(RaffleEvent::WinnerPicked {
            identity: winner,
            round,
            payout: amount,
        });
        inner.events.push(RaffleEvent::RoundOpened {
            round: inner.round.index,
            started_at,
        });
        info!(
            %winner,
            payout = amount,
            round,
            next_round = inner.round.index,
            "winner paid, round reopened"
        );
        Ok(record)
    }
}

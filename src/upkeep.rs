//! Side-effect-free evaluation of whether a draw may start.

use std::fmt;

use crate::registry::EntryRegistry;
use crate::state::{Round, RoundStatus, UnixTimestamp};

/// True iff at least `interval` seconds elapsed between `last` and
/// `now`. The boundary counts: exactly `interval` seconds passes the
/// gate.
pub fn time_passed(now: UnixTimestamp, last: UnixTimestamp, interval: u64) -> bool {
    now.saturating_sub(last) >= i64::try_from(interval).unwrap_or(i64::MAX)
}

/// First condition blocking a draw, or `Ready`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpkeepReason {
    /// All conditions hold; a draw may start.
    Ready,
    /// A draw is already in flight.
    RoundNotOpen,
    /// The round has not been open for the full interval yet.
    IntervalNotElapsed,
    /// Nobody entered the round.
    NoParticipants,
    /// Entries exist but carry no stake.
    NoStake,
}

impl fmt::Display for UpkeepReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            UpkeepReason::Ready => "ready",
            UpkeepReason::RoundNotOpen => "round not open",
            UpkeepReason::IntervalNotElapsed => "interval not elapsed",
            UpkeepReason::NoParticipants => "no participants",
            UpkeepReason::NoStake => "no stake pooled",
        };
        f.write_str(reason)
    }
}

/// Result of evaluating the upkeep predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepCheck {
    pub needed: bool,
    pub reason: UpkeepReason,
}

/// Combines round status, the interval gate and registry state.
///
/// Pure over its inputs, so it is safe to call repeatedly and
/// concurrently; `Raffle::perform_upkeep` re-evaluates under the engine
/// lock before mutating anything.
pub(crate) fn evaluate(
    round: &Round,
    registry: &EntryRegistry,
    now: UnixTimestamp,
    interval: u64,
) -> UpkeepCheck {
    let reason = if round.status != RoundStatus::Open {
        UpkeepReason::RoundNotOpen
    } else if !time_passed(now, round.started_at, interval) {
        UpkeepReason::IntervalNotElapsed
    } else if registry.player_count() == 0 {
        UpkeepReason::NoParticipants
    } else if registry.total_stake() == 0 {
        UpkeepReason::NoStake
    } else {
        UpkeepReason::Ready
    };
    UpkeepCheck {
        needed: reason == UpkeepReason::Ready,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AccountId;

    const INTERVAL: u64 = 30;

    fn registry_with_entries(n: usize) -> EntryRegistry {
        let mut registry = EntryRegistry::new();
        for _ in 0..n {
            registry.record(AccountId::new_unique(), 10).unwrap();
        }
        registry
    }

    #[test]
    fn boundary_is_inclusive() {
        assert!(!time_passed(124, 100, 25));
        assert!(time_passed(125, 100, 25));
        assert!(time_passed(126, 100, 25));
    }

    #[test]
    fn elapsed_interval_with_funded_entries_is_ready() {
        let round = Round::open(1, 100);
        let registry = registry_with_entries(2);

        let check = evaluate(&round, &registry, 100 + INTERVAL as i64, INTERVAL);
        assert!(check.needed);
        assert_eq!(check.reason, UpkeepReason::Ready);
    }

    #[test]
    fn short_of_interval_is_not_ready() {
        let round = Round::open(1, 100);
        let registry = registry_with_entries(2);

        let check = evaluate(&round, &registry, 100 + INTERVAL as i64 - 5, INTERVAL);
        assert!(!check.needed);
        assert_eq!(check.reason, UpkeepReason::IntervalNotElapsed);
    }

    #[test]
    fn calculating_round_reports_not_open() {
        let mut round = Round::open(1, 100);
        round.status = RoundStatus::Calculating;
        let registry = registry_with_entries(2);

        // Status outranks the other conditions even with the gate
        // otherwise satisfied.
        let check = evaluate(&round, &registry, 1_000, INTERVAL);
        assert!(!check.needed);
        assert_eq!(check.reason, UpkeepReason::RoundNotOpen);
    }

    #[test]
    fn empty_registry_reports_no_participants() {
        let round = Round::open(1, 100);
        let registry = EntryRegistry::new();

        let check = evaluate(&round, &registry, 1_000, INTERVAL);
        assert!(!check.needed);
        assert_eq!(check.reason, UpkeepReason::NoParticipants);
    }

    #[test]
    fn unstaked_entries_report_no_stake() {
        let round = Round::open(1, 100);
        let mut registry = EntryRegistry::new();
        registry.record(AccountId::new_unique(), 0).unwrap();

        let check = evaluate(&round, &registry, 1_000, INTERVAL);
        assert!(!check.needed);
        assert_eq!(check.reason, UpkeepReason::NoStake);
    }
}

//! Ordered participant entries and pooled stake for the current round.

use crate::error::RaffleError;
use crate::state::{AccountId, Amount, Entry};

/// Accumulates entries for one round.
///
/// Insertion order is entry order and drives winner selection: the same
/// random value against the same entry order must select the same
/// winner.
#[derive(Debug, Clone, Default)]
pub struct EntryRegistry {
    entries: Vec<Entry>,
    total_stake: Amount,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a registry from persisted entries, recomputing the pool.
    pub(crate) fn from_entries(entries: Vec<Entry>) -> Result<Self, RaffleError> {
        let mut total_stake: Amount = 0;
        for entry in &entries {
            total_stake = total_stake
                .checked_add(entry.stake)
                .ok_or(RaffleError::Overflow)?;
        }
        Ok(Self {
            entries,
            total_stake,
        })
    }

    /// Checks that `stake` fits into the pool without wrapping. Callers
    /// verify this before moving funds; `record` then cannot fail for
    /// the same stake.
    pub(crate) fn can_accept(&self, stake: Amount) -> Result<(), RaffleError> {
        self.total_stake
            .checked_add(stake)
            .map(|_| ())
            .ok_or(RaffleError::Overflow)
    }

    /// Appends an entry and returns its ordinal position.
    pub(crate) fn record(
        &mut self,
        identity: AccountId,
        stake: Amount,
    ) -> Result<usize, RaffleError> {
        let total_stake = self
            .total_stake
            .checked_add(stake)
            .ok_or(RaffleError::Overflow)?;
        let index = self.entries.len();
        self.entries.push(Entry { identity, stake });
        self.total_stake = total_stake;
        Ok(index)
    }

    /// Maps a raw random value onto an entry as `value mod count`.
    pub(crate) fn pick(&self, random_value: u64) -> Result<(usize, Entry), RaffleError> {
        if self.entries.is_empty() {
            return Err(RaffleError::IndexOutOfRange { index: 0, len: 0 });
        }
        let index = (random_value % self.entries.len() as u64) as usize;
        Ok((index, self.entries[index]))
    }

    /// Identity at ordinal position `index`.
    pub fn player_at(&self, index: usize) -> Result<AccountId, RaffleError> {
        self.entries
            .get(index)
            .map(|entry| entry.identity)
            .ok_or(RaffleError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    pub fn player_count(&self) -> usize {
        self.entries.len()
    }

    pub fn total_stake(&self) -> Amount {
        self.total_stake
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Clears all entries and the pool. Called only after the payout
    /// succeeded.
    pub(crate) fn reset_all(&mut self) {
        self.entries.clear();
        self.total_stake = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_preserve_entry_order() {
        let mut registry = EntryRegistry::new();
        let a = AccountId::new_unique();
        let b = AccountId::new_unique();
        let c = AccountId::new_unique();

        assert_eq!(registry.record(a, 10).unwrap(), 0);
        assert_eq!(registry.record(b, 20).unwrap(), 1);
        assert_eq!(registry.record(c, 30).unwrap(), 2);

        assert_eq!(registry.player_count(), 3);
        assert_eq!(registry.total_stake(), 60);
        assert_eq!(registry.player_at(0).unwrap(), a);
        assert_eq!(registry.player_at(1).unwrap(), b);
        assert_eq!(registry.player_at(2).unwrap(), c);
    }

    #[test]
    fn repeat_identities_get_separate_entries() {
        let mut registry = EntryRegistry::new();
        let a = AccountId::new_unique();
        registry.record(a, 10).unwrap();
        registry.record(a, 10).unwrap();
        assert_eq!(registry.player_count(), 2);
        assert_eq!(registry.total_stake(), 20);
    }

    #[test]
    fn player_at_out_of_range_fails() {
        let registry = EntryRegistry::new();
        assert_eq!(
            registry.player_at(0),
            Err(RaffleError::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn stake_overflow_is_rejected() {
        let mut registry = EntryRegistry::new();
        registry.record(AccountId::new_unique(), u64::MAX).unwrap();
        assert_eq!(registry.can_accept(1), Err(RaffleError::Overflow));
        assert_eq!(
            registry.record(AccountId::new_unique(), 1),
            Err(RaffleError::Overflow)
        );
        // The failed record leaves the registry untouched.
        assert_eq!(registry.player_count(), 1);
        assert_eq!(registry.total_stake(), u64::MAX);
    }

    #[test]
    fn pick_maps_value_modulo_count() {
        let mut registry = EntryRegistry::new();
        let ids: Vec<_> = (0..5)
            .map(|_| {
                let id = AccountId::new_unique();
                registry.record(id, 10).unwrap();
                id
            })
            .collect();

        let (index, entry) = registry.pick(7).unwrap();
        assert_eq!(index, 2);
        assert_eq!(entry.identity, ids[2]);

        let (index, entry) = registry.pick(u64::MAX).unwrap();
        assert_eq!(index, (u64::MAX % 5) as usize);
        assert_eq!(entry.identity, ids[index]);
    }

    #[test]
    fn pick_on_empty_registry_fails() {
        let registry = EntryRegistry::new();
        assert_eq!(
            registry.pick(42),
            Err(RaffleError::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn reset_clears_entries_and_pool() {
        let mut registry = EntryRegistry::new();
        registry.record(AccountId::new_unique(), 10).unwrap();
        registry.reset_all();
        assert_eq!(registry.player_count(), 0);
        assert_eq!(registry.total_stake(), 0);
    }

    #[test]
    fn rebuild_recomputes_pool() {
        let entries = vec![
            Entry {
                identity: AccountId::new_unique(),
                stake: 10,
            },
            Entry {
                identity: AccountId::new_unique(),
                stake: 15,
            },
        ];
        let registry = EntryRegistry::from_entries(entries).unwrap();
        assert_eq!(registry.total_stake(), 25);

        let overflowing = vec![
            Entry {
                identity: AccountId::new_unique(),
                stake: u64::MAX,
            },
            Entry {
                identity: AccountId::new_unique(),
                stake: 1,
            },
        ];
        assert_eq!(
            EntryRegistry::from_entries(overflowing).unwrap_err(),
            RaffleError::Overflow
        );
    }
}

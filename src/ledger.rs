//! Narrow interface to the external ledger holding participant funds.

use std::collections::HashMap;

use parking_lot::Mutex;
use thiserror::Error;

use crate::state::{AccountId, Amount};

/// Failure of a ledger transfer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("account {account} holds {available}, transfer needs {required}")]
    InsufficientBalance {
        account: AccountId,
        available: Amount,
        required: Amount,
    },
    /// The ledger refused the transfer for its own reasons.
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// External collaborator that moves funds between identities.
///
/// The engine calls this from exactly two places: pulling an entry stake
/// into the vault, and paying the pooled stake out to the winner.
pub trait EntryLedger: Send + Sync {
    /// Moves `amount` from `from` to `to`.
    fn transfer(&self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), LedgerError>;

    /// Current balance of `identity`. Unknown identities hold zero.
    fn balance_of(&self, identity: AccountId) -> Amount;
}

/// In-memory ledger for embedding, demos and tests.
#[derive(Default)]
pub struct InMemoryLedger {
    balances: Mutex<HashMap<AccountId, Amount>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `identity` with newly minted funds.
    pub fn credit(&self, identity: AccountId, amount: Amount) {
        let mut balances = self.balances.lock();
        let balance = balances.entry(identity).or_insert(0);
        *balance = balance.saturating_add(amount);
    }
}

impl EntryLedger for InMemoryLedger {
    fn transfer(&self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), LedgerError> {
        let mut balances = self.balances.lock();
        let available = balances.get(&from).copied().unwrap_or(0);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from,
                available,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let dest = balances.get(&to).copied().unwrap_or(0);
        let dest = dest
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Rejected("destination balance overflow".into()))?;
        balances.insert(from, available - amount);
        balances.insert(to, dest);
        Ok(())
    }

    fn balance_of(&self, identity: AccountId) -> Amount {
        self.balances.lock().get(&identity).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_moves_funds() {
        let ledger = InMemoryLedger::new();
        let a = AccountId::new_unique();
        let b = AccountId::new_unique();
        ledger.credit(a, 100);

        ledger.transfer(a, b, 40).unwrap();
        assert_eq!(ledger.balance_of(a), 60);
        assert_eq!(ledger.balance_of(b), 40);
    }

    #[test]
    fn transfer_rejects_insufficient_balance() {
        let ledger = InMemoryLedger::new();
        let a = AccountId::new_unique();
        let b = AccountId::new_unique();
        ledger.credit(a, 10);

        let err = ledger.transfer(a, b, 11).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                account: a,
                available: 10,
                required: 11,
            }
        );
        assert_eq!(ledger.balance_of(a), 10);
        assert_eq!(ledger.balance_of(b), 0);
    }

    #[test]
    fn self_transfer_keeps_balance() {
        let ledger = InMemoryLedger::new();
        let a = AccountId::new_unique();
        ledger.credit(a, 25);

        ledger.transfer(a, a, 25).unwrap();
        assert_eq!(ledger.balance_of(a), 25);
    }

    #[test]
    fn credit_accumulates() {
        let ledger = InMemoryLedger::new();
        let a = AccountId::new_unique();
        ledger.credit(a, 5);
        ledger.credit(a, 7);
        assert_eq!(ledger.balance_of(a), 12);
    }
}

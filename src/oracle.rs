//! Narrow interface to the external randomness provider.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::state::{AccountId, RequestId};

/// External collaborator supplying verifiable randomness.
///
/// `request_random_words` must assign and return the request id
/// synchronously, and must not call back into the engine from inside the
/// request: the engine holds its state lock while requesting. The
/// provider later delivers the words through
/// `Raffle::fulfill_randomness` with the same id.
pub trait RandomnessOracle: Send + Sync {
    fn request_random_words(&self, consumer: AccountId) -> RequestId;
}

/// Deterministic oracle assigning sequential request ids.
///
/// Stands in for a real randomness provider in tests and demos. Ids
/// start at 1 and every request is recorded for inspection; delivering
/// words back to the engine is the caller's job.
pub struct SequenceOracle {
    next_id: AtomicU64,
    requests: Mutex<Vec<(RequestId, AccountId)>>,
}

impl SequenceOracle {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, in issue order.
    pub fn requests(&self) -> Vec<(RequestId, AccountId)> {
        self.requests.lock().clone()
    }

    /// Id of the most recent request, if any.
    pub fn last_request_id(&self) -> Option<RequestId> {
        self.requests.lock().last().map(|(id, _)| *id)
    }
}

impl Default for SequenceOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomnessOracle for SequenceOracle {
    fn request_random_words(&self, consumer: AccountId) -> RequestId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.requests.lock().push((id, consumer));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_from_one() {
        let oracle = SequenceOracle::new();
        let consumer = AccountId::new_unique();
        assert_eq!(oracle.request_random_words(consumer), 1);
        assert_eq!(oracle.request_random_words(consumer), 2);
        assert_eq!(oracle.last_request_id(), Some(2));
        assert_eq!(oracle.requests().len(), 2);
    }
}

//! Outstanding randomness requests and the rounds that issued them.

use std::collections::HashMap;

use crate::error::RaffleError;
use crate::oracle::RandomnessOracle;
use crate::state::{AccountId, OutstandingRequest, RequestId, UnixTimestamp};

/// Maps oracle-assigned request ids to their issuing round.
///
/// Consumption is one-shot: a consumed id is deleted and any later
/// fulfillment for it is rejected.
#[derive(Debug, Default)]
pub struct RequestTracker {
    outstanding: HashMap<RequestId, OutstandingRequest>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_outstanding(requests: Vec<OutstandingRequest>) -> Self {
        let outstanding = requests
            .into_iter()
            .map(|request| (request.request_id, request))
            .collect();
        Self { outstanding }
    }

    /// Issues a request against the oracle and tracks the id it assigns.
    pub(crate) fn register(
        &mut self,
        oracle: &dyn RandomnessOracle,
        consumer: AccountId,
        round: u64,
        now: UnixTimestamp,
    ) -> RequestId {
        let request_id = oracle.request_random_words(consumer);
        self.outstanding.insert(
            request_id,
            OutstandingRequest {
                request_id,
                round,
                requested_at: now,
            },
        );
        request_id
    }

    pub(crate) fn get(&self, request_id: RequestId) -> Option<&OutstandingRequest> {
        self.outstanding.get(&request_id)
    }

    /// Deletes a tracked request, returning its record.
    pub(crate) fn consume(
        &mut self,
        request_id: RequestId,
    ) -> Result<OutstandingRequest, RaffleError> {
        self.outstanding
            .remove(&request_id)
            .ok_or(RaffleError::UnknownRequest(request_id))
    }

    /// The oldest request issued at least `timeout` seconds before `now`.
    pub(crate) fn stale_request(&self, now: UnixTimestamp, timeout: u64) -> Option<RequestId> {
        let timeout = i64::try_from(timeout).unwrap_or(i64::MAX);
        self.outstanding
            .values()
            .filter(|request| now.saturating_sub(request.requested_at) >= timeout)
            .min_by_key(|request| (request.requested_at, request.request_id))
            .map(|request| request.request_id)
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }

    /// Outstanding requests sorted by id, for persistence.
    pub(crate) fn outstanding(&self) -> Vec<OutstandingRequest> {
        let mut requests: Vec<_> = self.outstanding.values().copied().collect();
        requests.sort_by_key(|request| request.request_id);
        requests
    }
}

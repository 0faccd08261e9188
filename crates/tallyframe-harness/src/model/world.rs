//! Model world: the local store and every remote store as plain maps.

use std::collections::BTreeMap;

use tallyframe_core::{RecordStore, SEARCH_RADIUS};
use tallyframe_proto::{AccountId, Balance, Outcome};

use super::operation::Operation;
use crate::dataset::Dataset;

/// Observable state for oracle comparison.
///
/// Store 0 is the local store; the rest follow registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Each store's records in ascending id order.
    pub stores: Vec<Vec<(AccountId, Balance)>>,
}

impl ObservableState {
    /// Capture the real stores, local first.
    pub fn capture<'a>(stores: impl IntoIterator<Item = &'a RecordStore>) -> Self {
        let stores =
            stores.into_iter().map(|s| s.records().map(|r| (r.id, r.balance)).collect()).collect();
        Self { stores }
    }

    /// Records across all stores.
    pub fn record_count(&self) -> usize {
        self.stores.iter().map(Vec::len).sum()
    }
}

/// Model world - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    stores: Vec<BTreeMap<AccountId, Balance>>,
}

impl ModelWorld {
    /// Load every store of `dataset`.
    pub fn new(dataset: &Dataset) -> Self {
        let stores = (0..dataset.store_count())
            .map(|s| dataset.records(s).iter().map(|r| (r.id, r.balance)).collect())
            .collect();
        Self { stores }
    }

    /// Apply an operation and return the outcome the coordinator must choose.
    pub fn apply(&mut self, op: &Operation) -> Outcome {
        match *op {
            Operation::Query { id } => self.search(id, false),
            Operation::Give { id, amount } => {
                let outcome = self.search(id, true);
                if let Some((matched, _)) = outcome.matched(id) {
                    let share = match outcome {
                        Outcome::NearAbove { .. } => amount / 2,
                        Outcome::NearBelow { .. } => amount / 3,
                        _ => amount,
                    };
                    if let Some(balance) = self.stores[0].get_mut(&matched) {
                        *balance += Balance::from(share);
                    }
                }
                outcome
            },
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        let stores =
            self.stores.iter().map(|s| s.iter().map(|(&id, &b)| (id, b)).collect()).collect();
        ObservableState { stores }
    }

    fn search(&mut self, id: AccountId, approximate: bool) -> Outcome {
        let mut best = Outcome::Fail;

        for store in 0..self.stores.len() {
            let outcome = if approximate {
                nearest(&self.stores[store], id)
            } else {
                let found = self.stores[store].get(&id);
                found.map_or(Outcome::Fail, |&balance| Outcome::Ok { balance })
            };

            if store != 0 {
                if let Some((matched, balance)) = outcome.matched(id) {
                    self.stores[store].remove(&matched);
                    self.stores[0].insert(matched, balance);
                }
            }

            if matches!(outcome, Outcome::Ok { .. } | Outcome::Exact { .. }) {
                return outcome;
            }

            best = better(best, outcome);
        }

        best
    }
}

fn nearest(store: &BTreeMap<AccountId, Balance>, id: AccountId) -> Outcome {
    if let Some(&balance) = store.get(&id) {
        return Outcome::Exact { id, balance };
    }

    let above =
        store.iter().filter(|&(&k, _)| k > id && k - id <= SEARCH_RADIUS).min_by_key(|e| e.0);
    if let Some((&k, &balance)) = above {
        return Outcome::NearAbove { id: k, balance };
    }

    let below =
        store.iter().filter(|&(&k, _)| k < id && id - k <= SEARCH_RADIUS).max_by_key(|e| e.0);
    match below {
        Some((&k, &balance)) => Outcome::NearBelow { id: k, balance },
        None => Outcome::Fail,
    }
}

fn rank(outcome: &Outcome) -> u8 {
    match outcome {
        Outcome::Fail => 0,
        Outcome::NearBelow { .. } => 1,
        Outcome::NearAbove { .. } => 2,
        Outcome::Ok { .. } | Outcome::Exact { .. } => 3,
    }
}

fn better(current: Outcome, candidate: Outcome) -> Outcome {
    match (current, candidate) {
        (Outcome::NearAbove { id: a, .. }, Outcome::NearAbove { id: b, .. }) if b < a => candidate,
        (Outcome::NearBelow { id: a, .. }, Outcome::NearBelow { id: b, .. }) if b > a => candidate,
        (Outcome::NearAbove { .. }, Outcome::NearAbove { .. })
        | (Outcome::NearBelow { .. }, Outcome::NearBelow { .. }) => current,
        _ if rank(&candidate) > rank(&current) => candidate,
        _ => current,
    }
}

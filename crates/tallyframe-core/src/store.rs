//! Record store.
//!
//! The authoritative id → balance map for one node. Approximate lookup looks
//! for the nearest id within [`SEARCH_RADIUS`] of the requested one, above
//! first, then below.
//!
//! Records are kept in a `BTreeMap`, so the neighbour scan is a range query
//! rather than a walk over up to 100 candidate ids. Tiers and nearest-first
//! ordering are the same either way.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tallyframe_proto::{AccountId, Balance, LookupMode, Outcome, Tier};

use crate::error::CoreError;

/// How far an approximate lookup looks in each direction.
pub const SEARCH_RADIUS: AccountId = 100;

/// One account as loaded from a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Account id.
    pub id: AccountId,
    /// Current balance.
    pub balance: Balance,
}

/// The find/query contract shared by local stores and remote proxies.
pub trait LookupSource {
    /// Exact, then nearest above, then nearest below, else Fail.
    fn find(&mut self, id: AccountId) -> Result<Outcome, CoreError>;

    /// Exact only.
    fn query(&mut self, id: AccountId) -> Result<Outcome, CoreError>;

    /// End-of-run hook.
    fn close(&mut self) -> Result<(), CoreError>;

    /// Dispatch on `mode`.
    fn lookup(&mut self, mode: LookupMode, id: AccountId) -> Result<Outcome, CoreError> {
        match mode {
            LookupMode::Query => self.query(id),
            LookupMode::Find => self.find(id),
        }
    }
}

/// In-memory id → balance map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: BTreeMap<AccountId, Balance>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a dataset. Later duplicates overwrite earlier ones.
    pub fn from_records(records: impl IntoIterator<Item = AccountRecord>) -> Self {
        Self { records: records.into_iter().map(|r| (r.id, r.balance)).collect() }
    }

    /// Exact match, else nearest id above within the radius, else nearest
    /// below, else Fail.
    pub fn find(&self, id: AccountId) -> Outcome {
        if let Some(&balance) = self.records.get(&id) {
            return Outcome::Exact { id, balance };
        }

        if let Some(start) = id.checked_add(1) {
            let end = id.saturating_add(SEARCH_RADIUS);
            if let Some((&above, &balance)) = self.records.range(start..=end).next() {
                return Outcome::NearAbove { id: above, balance };
            }
        }

        let start = id.saturating_sub(SEARCH_RADIUS);
        if let Some((&below, &balance)) = self.records.range(start..id).next_back() {
            return Outcome::NearBelow { id: below, balance };
        }

        Outcome::Fail
    }

    /// Exact match only.
    pub fn query(&self, id: AccountId) -> Outcome {
        self.records.get(&id).map_or(Outcome::Fail, |&balance| Outcome::Ok { balance })
    }

    /// Dispatch on `mode`.
    pub fn lookup(&self, mode: LookupMode, id: AccountId) -> Outcome {
        match mode {
            LookupMode::Query => self.query(id),
            LookupMode::Find => self.find(id),
        }
    }

    /// Credit `amount` scaled by `tier` to `id` and return the credited share.
    ///
    /// The id must already be here: the coordinator only credits after a
    /// search has found (and, if remote, re-homed) the record.
    pub fn give(
        &mut self,
        tier: Tier,
        id: AccountId,
        amount: Balance,
    ) -> Result<Balance, CoreError> {
        let balance =
            self.records.get_mut(&id).ok_or(CoreError::MissingRecord { id, operation: "credit" })?;

        let share = tier.share(amount);
        *balance = balance
            .checked_add(share)
            .ok_or(CoreError::BalanceOverflow { id, amount: share })?;

        Ok(share)
    }

    /// Insert or overwrite a record. Returns the previous balance.
    pub fn set(&mut self, id: AccountId, balance: Balance) -> Option<Balance> {
        self.records.insert(id, balance)
    }

    /// Remove a record that is known to exist.
    pub fn clear(&mut self, id: AccountId) -> Result<Balance, CoreError> {
        self.records.remove(&id).ok_or(CoreError::MissingRecord { id, operation: "clear" })
    }

    /// Balance of `id`, if present.
    pub fn get(&self, id: AccountId) -> Option<Balance> {
        self.records.get(&id).copied()
    }

    /// Whether `id` is held here.
    pub fn contains(&self, id: AccountId) -> bool {
        self.records.contains_key(&id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are held.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending id order.
    pub fn records(&self) -> impl Iterator<Item = AccountRecord> + '_ {
        self.records.iter().map(|(&id, &balance)| AccountRecord { id, balance })
    }

    /// Sum of all balances.
    pub fn total_balance(&self) -> u128 {
        self.records.values().map(|&b| u128::from(b)).sum()
    }

    /// End-of-run hook.
    pub fn close(&mut self) {
        tracing::info!(
            records = self.records.len(),
            total = %self.total_balance(),
            "closing record store"
        );
    }
}

impl LookupSource for RecordStore {
    fn find(&mut self, id: AccountId) -> Result<Outcome, CoreError> {
        Ok(Self::find(self, id))
    }

    fn query(&mut self, id: AccountId) -> Result<Outcome, CoreError> {
        Ok(Self::query(self, id))
    }

    fn close(&mut self) -> Result<(), CoreError> {
        Self::close(self);
        Ok(())
    }
}

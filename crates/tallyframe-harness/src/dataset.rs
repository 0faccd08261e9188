//! Seeded initial datasets.
//!
//! A dataset assigns distinct account ids to stores. Store 0 is the
//! coordinator's local store; the rest belong to responders. The same seed
//! always produces the same dataset.

use rand::{Rng, SeedableRng, seq::index};
use rand_chacha::ChaCha8Rng;
use tallyframe_core::{AccountRecord, RecordStore};
use tallyframe_proto::{AccountId, Balance, outcome::MAX_REPLY_BALANCE};

/// Size parameters for [`Dataset::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetShape {
    /// Number of stores, local included.
    pub stores: usize,
    /// Total records across all stores. Clamped to `id_span`.
    pub records: usize,
    /// Ids are drawn from `1..=id_span`.
    pub id_span: AccountId,
    /// Balances are drawn from `0..=max_balance`, capped at what a reply can
    /// carry.
    pub max_balance: Balance,
}

impl Default for DatasetShape {
    fn default() -> Self {
        Self { stores: 3, records: 200, id_span: 2_000, max_balance: 100_000 }
    }
}

/// Records partitioned across stores, each id in exactly one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    stores: Vec<Vec<AccountRecord>>,
}

impl Dataset {
    /// Build from explicit per-store records.
    pub fn from_stores(stores: Vec<Vec<AccountRecord>>) -> Self {
        Self { stores }
    }

    /// Generate a dataset from `seed`.
    pub fn generate(seed: u64, shape: DatasetShape) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let stores = shape.stores.max(1);
        let span = usize::from(shape.id_span);
        let max_balance = shape.max_balance.min(MAX_REPLY_BALANCE);

        let mut partitioned = vec![Vec::new(); stores];
        for slot in index::sample(&mut rng, span, shape.records.min(span)) {
            let Ok(id) = AccountId::try_from(slot + 1) else { continue };
            let balance = rng.gen_range(0..=max_balance);
            partitioned[rng.gen_range(0..stores)].push(AccountRecord { id, balance });
        }

        for records in &mut partitioned {
            records.sort_by_key(|r| r.id);
        }

        tracing::debug!(seed, stores, records = shape.records, "generated dataset");
        Self { stores: partitioned }
    }

    /// Number of stores, local included.
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    /// Records of one store.
    pub fn records(&self, store: usize) -> &[AccountRecord] {
        self.stores.get(store).map_or(&[], Vec::as_slice)
    }

    /// A fresh [`RecordStore`] holding one store's records.
    pub fn store(&self, store: usize) -> RecordStore {
        RecordStore::from_records(self.records(store).iter().copied())
    }

    /// Total records across all stores.
    pub fn total_records(&self) -> usize {
        self.stores.iter().map(Vec::len).sum()
    }
}

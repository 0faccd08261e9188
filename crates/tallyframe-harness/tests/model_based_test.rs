//! Model-based property tests.
//!
//! These tests generate random dataset and operation sequences and verify
//! that a real coordinator, talking to real responders, chooses the same
//! outcomes and leaves the same stores as the reference model.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: (seed, Vec<Operation>)
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!      ModelWorld    RealWorld        Compare
//!      (reference)   (loopback)   outcomes + stores
//! ```

use proptest::prelude::*;
use tallyframe_core::{AccountRecord, Coordinator, CoordinatorConfig, Outcome, Responder};
use tallyframe_harness::{
    Dataset, DatasetShape, LoopbackChannel, ModelWorld, ObservableState, Operation,
};
use tallyframe_proto::AccountId;

const SPAN: AccountId = 1_500;

/// Real coordinator whose remotes are responders served inline.
struct RealWorld {
    coordinator: Coordinator<LoopbackChannel>,
}

impl RealWorld {
    fn new(dataset: &Dataset, config: CoordinatorConfig) -> Self {
        let mut coordinator = Coordinator::new(config, dataset.store(0));
        for store in 1..dataset.store_count() {
            let responder = Responder::new(dataset.store(store));
            coordinator.add_remote(format!("responder-{store}"), LoopbackChannel::new(responder));
        }
        Self { coordinator }
    }

    fn apply(&mut self, op: &Operation) -> Outcome {
        self.coordinator.handle(op.command()).unwrap()
    }

    fn observable_state(&self) -> ObservableState {
        let remotes = self.coordinator.remotes().map(|r| r.channel().responder().store());
        ObservableState::capture(std::iter::once(self.coordinator.local()).chain(remotes))
    }
}

fn dataset(seed: u64, stores: usize, records: usize) -> Dataset {
    Dataset::generate(seed, DatasetShape { stores, records, id_span: SPAN, max_balance: 50_000 })
}

/// Strategy for operations with ids inside the dataset span.
fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        2 => (1..=SPAN).prop_map(|id| Operation::Query { id }),
        3 => (1..=SPAN, any::<u16>()).prop_map(|(id, amount)| Operation::Give { id, amount }),
    ]
}

proptest! {
    /// The coordinator picks exactly what the model picks, and both leave
    /// identical stores.
    #[test]
    fn prop_model_matches_real(
        seed in any::<u64>(),
        stores in 1..5usize,
        records in 0..300usize,
        ops in prop::collection::vec(operation_strategy(), 0..60)
    ) {
        let dataset = dataset(seed, stores, records);
        let mut model = ModelWorld::new(&dataset);
        let mut real = RealWorld::new(&dataset, CoordinatorConfig::default());

        for (i, op) in ops.iter().enumerate() {
            let expected = model.apply(op);
            let actual = real.apply(op);

            prop_assert_eq!(
                expected,
                actual,
                "Divergence at operation {}: {:?}\nModel: {:?}\nReal: {:?}",
                i, op, expected, actual
            );
        }

        prop_assert_eq!(model.observable_state(), real.observable_state());
    }

    /// Predictions only remove round trips; outcomes and stores are unchanged.
    #[test]
    fn prop_predictor_is_transparent(
        seed in any::<u64>(),
        stores in 2..5usize,
        records in 0..200usize,
        ops in prop::collection::vec(operation_strategy(), 0..80)
    ) {
        let dataset = dataset(seed, stores, records);
        let predicted = CoordinatorConfig { predictor: true, ..CoordinatorConfig::default() };
        let unpredicted = CoordinatorConfig { predictor: false, ..CoordinatorConfig::default() };
        let mut with = RealWorld::new(&dataset, predicted);
        let mut without = RealWorld::new(&dataset, unpredicted);

        for op in &ops {
            prop_assert_eq!(with.apply(op), without.apply(op), "diverged on {:?}", op);
        }

        prop_assert_eq!(with.observable_state(), without.observable_state());

        let with = with.coordinator.stats();
        let without = without.coordinator.stats();
        prop_assert_eq!(without.predicted_skips, 0);
        prop_assert_eq!(with.round_trips + with.predicted_skips, without.round_trips);
    }

    /// Records move between stores but are never lost or duplicated.
    #[test]
    fn prop_record_count_conserved(
        seed in any::<u64>(),
        stores in 1..5usize,
        records in 0..300usize,
        ops in prop::collection::vec(operation_strategy(), 0..60)
    ) {
        let dataset = dataset(seed, stores, records);
        let mut real = RealWorld::new(&dataset, CoordinatorConfig::default());

        for op in &ops {
            real.apply(op);
            prop_assert_eq!(real.observable_state().record_count(), dataset.total_records());
        }
    }
}

#[test]
fn arbitrary_sequence_matches_model() {
    let dataset = dataset(42, 4, 400);
    let mut model = ModelWorld::new(&dataset);
    let mut real = RealWorld::new(&dataset, CoordinatorConfig::default());

    for op in Operation::sequence(42, 200, SPAN) {
        assert_eq!(model.apply(&op), real.apply(&op), "diverged on {op:?}");
    }

    assert_eq!(model.observable_state(), real.observable_state());
}

#[test]
fn remote_records_drain_into_local_store() {
    let dataset = dataset(7, 3, 150);
    let mut real = RealWorld::new(&dataset, CoordinatorConfig::default());

    for id in 1..=SPAN {
        real.apply(&Operation::Query { id });
    }

    let state = real.observable_state();
    assert_eq!(state.stores[0].len(), dataset.total_records());
    assert!(state.stores[1..].iter().all(Vec::is_empty));
}

#[test]
fn dense_edge_ids_agree_with_and_without_predictor() {
    let mut stores = vec![Vec::new(); 4];
    for id in (1..=60).chain(65_476..=AccountId::MAX) {
        stores[usize::from(id % 4)].push(AccountRecord { id, balance: u64::from(id) * 3 });
    }
    let dataset = Dataset::from_stores(stores);

    let mut model = ModelWorld::new(&dataset);
    let predicted = CoordinatorConfig { predictor: true, ..CoordinatorConfig::default() };
    let unpredicted = CoordinatorConfig { predictor: false, ..CoordinatorConfig::default() };
    let mut with = RealWorld::new(&dataset, predicted);
    let mut without = RealWorld::new(&dataset, unpredicted);

    let ids = (1..=140).step_by(3).chain((65_380..=AccountId::MAX).step_by(3));
    for id in ids {
        let op = if id % 2 == 0 {
            Operation::Give { id, amount: 17 }
        } else {
            Operation::Query { id }
        };

        let expected = model.apply(&op);
        assert_eq!(with.apply(&op), expected, "predicted run diverged on {op:?}");
        assert_eq!(without.apply(&op), expected, "unpredicted run diverged on {op:?}");
    }

    assert_eq!(with.observable_state(), model.observable_state());
    assert_eq!(without.observable_state(), model.observable_state());
    assert_eq!(model.observable_state().record_count(), dataset.total_records());
}

//! Operations for model-based testing.
//!
//! Operations are the requester commands. They are generated by proptest in
//! the integration tests, or drawn from seeded bytes with [`arbitrary`].

use arbitrary::{Arbitrary, Unstructured};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tallyframe_proto::{AccountId, Balance, Command};

/// A requester command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Look up a balance.
    Query {
        /// Requested id.
        id: AccountId,
    },

    /// Credit an amount to the nearest record.
    Give {
        /// Requested id.
        id: AccountId,
        /// Amount before tier scaling (kept small so balances stay bounded).
        amount: u16,
    },
}

impl Operation {
    /// The command a requester sends for this operation.
    pub fn command(self) -> Command {
        match self {
            Self::Query { id } => Command::Query { id },
            Self::Give { id, amount } => Command::Give { id, amount: Balance::from(amount) },
        }
    }

    /// Fold the id into `1..=span` so operations land near generated records.
    pub fn within(self, span: AccountId) -> Self {
        let span = span.max(1);
        match self {
            Self::Query { id } => Self::Query { id: id % span + 1 },
            Self::Give { id, amount } => Self::Give { id: id % span + 1, amount },
        }
    }

    /// Draw up to `len` operations from `seed`, ids folded into `1..=span`.
    pub fn sequence(seed: u64, len: usize, span: AccountId) -> Vec<Self> {
        let mut raw = vec![0u8; len * 8];
        ChaCha8Rng::seed_from_u64(seed).fill_bytes(&mut raw);

        let mut u = Unstructured::new(&raw);
        let mut ops = Vec::with_capacity(len);
        while ops.len() < len {
            match Self::arbitrary(&mut u) {
                Ok(op) => ops.push(op.within(span)),
                Err(_) => break,
            }
        }
        ops
    }
}

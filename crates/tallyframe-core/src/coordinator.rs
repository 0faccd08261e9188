//! Coordinator state machine.
//!
//! Serves one requester command per cycle, up to a fixed request budget:
//!
//! 1. Search the local store, then every remote store in registration order.
//! 2. Re-home every remote hit into the local store immediately, whether or
//!    not it ends up chosen. The responder has already deleted it.
//! 3. Stop at the first exact match for the command's mode; otherwise keep
//!    the best candidate by [`prefer`].
//! 4. For GIVE, credit the chosen record locally, scaled by its tier.
//! 5. Answer the requester with a [`Submission`].
//!
//! When the budget runs out, or the requester sends TERMINATE, every
//! responder is terminated and the local store is closed.
//!
//! # Invariants
//!
//! - Each id lives in exactly one store between requests. Re-homing happens
//!   on first observation, so no remote record is ever read twice.
//! - Record count is conserved for the whole run.
//! - Predictions never change the chosen outcome, only the number of round
//!   trips.

use bytes::Bytes;
use tallyframe_proto::{AccountId, Balance, Command, LookupMode, Outcome, Submission};

use crate::{
    channel::{Channel, Endpoint},
    config::CoordinatorConfig,
    error::CoreError,
    predictor::Predictor,
    remote::RemoteStoreProxy,
    store::{LookupSource, RecordStore},
};

/// What the driver should do after a requester frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Send this submission back to the requester.
    Reply(Bytes),
    /// The requester asked to stop.
    Shutdown,
}

/// Counters for one coordinator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Requester commands answered.
    pub requests: usize,
    /// Lookups actually sent to responders.
    pub round_trips: u64,
    /// Lookups answered Fail from a prediction instead of a round trip.
    pub predicted_skips: u64,
    /// Remote records moved into the local store.
    pub rehomed: u64,
    /// GIVE commands that credited a record.
    pub credits: u64,
    /// Self-echoed frames discarded on every channel, filled in when
    /// [`Coordinator::run`] finishes.
    pub echoes_skipped: u64,
}

/// One registered remote store and what we believe about it.
#[derive(Debug)]
struct RemoteSlot<C> {
    proxy: RemoteStoreProxy<C>,
    predictor: Predictor,
}

/// Primary node: fans lookups out across stores and commits credits.
#[derive(Debug)]
pub struct Coordinator<C> {
    config: CoordinatorConfig,
    local: RecordStore,
    remotes: Vec<RemoteSlot<C>>,
    stats: CoordinatorStats,
    shut_down: bool,
}

impl<C: Channel> Coordinator<C> {
    /// Create a coordinator over its local store.
    pub fn new(config: CoordinatorConfig, local: RecordStore) -> Self {
        Self {
            config,
            local,
            remotes: Vec::new(),
            stats: CoordinatorStats::default(),
            shut_down: false,
        }
    }

    /// Register a remote store. Remotes are searched in registration order.
    pub fn add_remote(&mut self, name: impl Into<String>, channel: C) {
        let proxy = RemoteStoreProxy::new(name, channel, self.config.wire);
        self.remotes.push(RemoteSlot { proxy, predictor: Predictor::new() });
    }

    /// The local store.
    pub fn local(&self) -> &RecordStore {
        &self.local
    }

    /// Counters so far.
    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    /// Registered remotes in search order.
    pub fn remotes(&self) -> impl Iterator<Item = &RemoteStoreProxy<C>> {
        self.remotes.iter().map(|slot| &slot.proxy)
    }

    /// Whether shutdown has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Serve requests from `requester` until the budget is spent or the
    /// requester sends TERMINATE, then shut down.
    pub fn run<R: Channel>(&mut self, requester: R) -> Result<CoordinatorStats, CoreError> {
        let mut requester = Endpoint::new(requester);

        tracing::info!(
            budget = self.config.request_budget,
            remotes = self.remotes.len(),
            records = self.local.len(),
            "coordinator started"
        );

        while self.stats.requests < self.config.request_budget {
            let frame = requester.receive()?;

            match self.process_frame(&frame)? {
                Step::Reply(reply) => requester.send(reply)?,
                Step::Shutdown => {
                    tracing::info!(served = self.stats.requests, "requester sent terminate");
                    break;
                },
            }
        }

        self.shutdown()?;

        let remote_echoes: u64 = self.remotes.iter().map(|slot| slot.proxy.echoes_skipped()).sum();
        self.stats.echoes_skipped = requester.echoes_skipped() + remote_echoes;

        tracing::info!(
            requests = self.stats.requests,
            round_trips = self.stats.round_trips,
            predicted_skips = self.stats.predicted_skips,
            rehomed = self.stats.rehomed,
            echoes_skipped = self.stats.echoes_skipped,
            "coordinator finished"
        );

        Ok(self.stats)
    }

    /// Decode one requester frame and produce the reply.
    pub fn process_frame(&mut self, frame: &[u8]) -> Result<Step, CoreError> {
        let command = Command::decode(frame)?;

        let Some(mode) = command.lookup_mode() else {
            return Ok(Step::Shutdown);
        };

        let outcome = self.handle(command)?;
        let submission = Submission::from_outcome(&outcome, mode);

        Ok(Step::Reply(submission.encode()))
    }

    /// Serve one command and return the final outcome.
    ///
    /// FIND is a responder-only command; a requester sending it gets Fail.
    pub fn handle(&mut self, command: Command) -> Result<Outcome, CoreError> {
        let outcome = match command {
            Command::Query { id } => self.search(LookupMode::Query, id)?,
            Command::Give { id, amount } => {
                let outcome = self.search(LookupMode::Find, id)?;
                self.credit(&outcome, id, amount)?;
                outcome
            },
            Command::Find { id } => {
                tracing::warn!(id, "requester sent find; answering fail");
                Outcome::Fail
            },
            Command::Terminate => {
                return Err(CoreError::UnsupportedCommand { role: "coordinator", command });
            },
        };

        self.stats.requests += 1;
        tracing::debug!(request = self.stats.requests, ?command, ?outcome, "served");

        Ok(outcome)
    }

    /// Terminate every responder and close the local store. Idempotent.
    pub fn shutdown(&mut self) -> Result<(), CoreError> {
        if self.shut_down {
            return Ok(());
        }

        for slot in &mut self.remotes {
            slot.proxy.terminate()?;
        }
        self.local.close();
        self.shut_down = true;

        Ok(())
    }

    fn search(&mut self, mode: LookupMode, id: AccountId) -> Result<Outcome, CoreError> {
        let local = self.local.lookup(mode, id);
        if local.is_exact_for(mode) {
            return Ok(local);
        }

        let command = Command::lookup(mode, id);
        let mut best = local;

        for slot in &mut self.remotes {
            let outcome = if self.config.predictor && !slot.predictor.predict(&command) {
                self.stats.predicted_skips += 1;
                tracing::trace!(remote = %slot.proxy.name(), id, "prediction skips round trip");
                Outcome::Fail
            } else {
                let outcome = slot.proxy.lookup(mode, id)?;
                self.stats.round_trips += 1;
                slot.predictor.interpret(&outcome, &command);
                outcome
            };

            if let Some((matched, balance)) = outcome.matched(id) {
                rehome(&mut self.local, slot, matched, balance);
                self.stats.rehomed += 1;
            }

            if outcome.is_exact_for(mode) {
                return Ok(outcome);
            }

            best = prefer(best, outcome);
        }

        Ok(best)
    }

    fn credit(
        &mut self,
        outcome: &Outcome,
        id: AccountId,
        amount: Balance,
    ) -> Result<(), CoreError> {
        let (Some(tier), Some((matched, _))) = (outcome.tier(), outcome.matched(id)) else {
            return Ok(());
        };

        let share = self.local.give(tier, matched, amount)?;
        self.stats.credits += 1;
        tracing::debug!(id = matched, ?tier, amount, share, "credited");

        Ok(())
    }
}

fn rehome<C: Channel>(
    local: &mut RecordStore,
    slot: &mut RemoteSlot<C>,
    id: AccountId,
    balance: Balance,
) {
    local.set(id, balance);
    slot.predictor.mark_departed(id);
    tracing::debug!(remote = %slot.proxy.name(), id, balance, "re-homed record");
}

/// Pick the better of two non-exact candidates.
///
/// NearAbove beats NearBelow beats Fail. Between two NearAbove matches the
/// smaller id wins; between two NearBelow matches the larger id wins. Ties
/// keep `current`.
pub fn prefer(current: Outcome, candidate: Outcome) -> Outcome {
    match (current, candidate) {
        (Outcome::NearAbove { id: kept, .. }, Outcome::NearAbove { id: new, .. }) => {
            if new < kept { candidate } else { current }
        },
        (Outcome::NearBelow { id: kept, .. }, Outcome::NearBelow { id: new, .. }) => {
            if new > kept { candidate } else { current }
        },
        _ => {
            if candidate.tier() > current.tier() {
                candidate
            } else {
                current
            }
        },
    }
}

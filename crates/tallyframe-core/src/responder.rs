//! Responder state machine.
//!
//! A responder owns one store and serves FIND and QUERY lookups for the
//! coordinator. Every record it returns is cleared immediately: ownership
//! moves to the coordinator with the reply. TERMINATE ends the loop without a
//! reply.

use bytes::Bytes;
use tallyframe_proto::{Command, Outcome, status::codes};

use crate::{
    channel::{Channel, Endpoint},
    error::CoreError,
    store::RecordStore,
};

/// Counters for one responder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponderStats {
    /// Lookups answered.
    pub lookups: u64,
    /// Records handed to the coordinator and cleared.
    pub handed_over: u64,
    /// Commands answered Fail because this role does not serve them.
    pub rejected: u64,
}

/// Remote node serving lookups from its own store.
#[derive(Debug)]
pub struct Responder {
    store: RecordStore,
    stats: ResponderStats,
}

impl Responder {
    /// Serve lookups from `store`.
    pub fn new(store: RecordStore) -> Self {
        Self { store, stats: ResponderStats::default() }
    }

    /// Records still held.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Counters so far.
    pub fn stats(&self) -> ResponderStats {
        self.stats
    }

    /// Serve lookups until TERMINATE arrives.
    ///
    /// Unsupported commands are answered with Fail; fatal errors end the loop.
    pub fn run<C: Channel>(&mut self, channel: C) -> Result<ResponderStats, CoreError> {
        let mut endpoint = Endpoint::new(channel);
        tracing::info!(records = self.store.len(), "responder started");

        loop {
            let frame = endpoint.receive()?;

            let reply = match self.process_frame(&frame) {
                Ok(Some(reply)) => reply,
                Ok(None) => break,
                Err(e) if !e.is_fatal() => {
                    tracing::warn!(error = %e, "rejecting command");
                    self.stats.rejected += 1;
                    Bytes::from_static(&[codes::FAIL])
                },
                Err(e) => return Err(e),
            };

            endpoint.send(reply)?;
        }

        tracing::info!(
            lookups = self.stats.lookups,
            handed_over = self.stats.handed_over,
            remaining = self.store.len(),
            "responder terminated"
        );
        self.store.close();

        Ok(self.stats)
    }

    /// Decode one command frame and produce the encoded reply.
    ///
    /// Returns `None` for TERMINATE.
    pub fn process_frame(&mut self, frame: &[u8]) -> Result<Option<Bytes>, CoreError> {
        let command = Command::decode(frame)?;

        let Some(outcome) = self.handle(command)? else {
            return Ok(None);
        };

        let reply = outcome.encode_reply()?;
        self.hand_over(command, &outcome)?;

        Ok(Some(reply))
    }

    /// Look up `command` without touching the store.
    ///
    /// Returns `None` for TERMINATE. Use [`Responder::process_frame`] to
    /// serve a command, which also clears the returned record.
    pub fn handle(&self, command: Command) -> Result<Option<Outcome>, CoreError> {
        match command {
            Command::Query { id } => Ok(Some(self.store.query(id))),
            Command::Find { id } => Ok(Some(self.store.find(id))),
            Command::Terminate => Ok(None),
            Command::Give { .. } => {
                Err(CoreError::UnsupportedCommand { role: "responder", command })
            },
        }
    }

    fn hand_over(&mut self, command: Command, outcome: &Outcome) -> Result<(), CoreError> {
        self.stats.lookups += 1;

        let Some(id) = command.id() else {
            return Ok(());
        };
        let Some((matched, _)) = outcome.matched(id) else {
            return Ok(());
        };

        self.store.clear(matched)?;
        self.stats.handed_over += 1;
        tracing::debug!(requested = id, id = matched, "handed record to coordinator");

        Ok(())
    }
}

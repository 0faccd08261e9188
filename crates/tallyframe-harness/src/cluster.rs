//! Threaded clusters over in-memory channels.
//!
//! One thread per node, exactly like a deployment: a coordinator thread, one
//! thread per responder, and the caller acting as requester.

use std::{
    panic,
    thread::{self, JoinHandle},
};

use tallyframe_core::{
    Channel, Coordinator, CoordinatorConfig, CoordinatorStats, CoreError, Endpoint, RecordStore,
    Responder, ResponderStats,
};
use tallyframe_proto::{Command, Submission, WireConfig};

use crate::{
    channel::{EchoingChannel, memory_pair},
    dataset::Dataset,
};

type BoxedChannel = Box<dyn Channel + Send>;

/// How the cluster's channels behave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterOptions {
    /// Echo every n-th write on every channel end. Zero disables echoes.
    pub echo_period: u64,
}

/// Final state of every node after [`Cluster::finish`].
#[derive(Debug)]
pub struct ClusterReport {
    /// Coordinator result.
    pub coordinator: Result<CoordinatorStats, CoreError>,
    /// The coordinator's local store.
    pub local: RecordStore,
    /// Each responder's result and remaining store, in registration order.
    pub responders: Vec<(Result<ResponderStats, CoreError>, RecordStore)>,
}

impl ClusterReport {
    /// Records across all stores.
    pub fn record_count(&self) -> usize {
        self.local.len() + self.responders.iter().map(|(_, s)| s.len()).sum::<usize>()
    }
}

/// A running coordinator and its responders.
pub struct Cluster {
    requester: Endpoint<BoxedChannel>,
    coordinator: JoinHandle<(Coordinator<BoxedChannel>, Result<CoordinatorStats, CoreError>)>,
    responders: Vec<JoinHandle<(Responder, Result<ResponderStats, CoreError>)>>,
}

impl Cluster {
    /// Start one responder per remote store of `dataset` and a coordinator
    /// over store 0.
    pub fn spawn(dataset: &Dataset, config: CoordinatorConfig, options: ClusterOptions) -> Self {
        let wrap = |channel| -> BoxedChannel {
            if options.echo_period == 0 {
                Box::new(channel)
            } else {
                Box::new(EchoingChannel::new(channel, options.echo_period))
            }
        };

        let mut coordinator = Coordinator::new(config, dataset.store(0));
        let mut responders = Vec::new();

        for store in 1..dataset.store_count() {
            let (near, far) = memory_pair();
            coordinator.add_remote(format!("responder-{store}"), wrap(near));

            let mut responder = Responder::new(dataset.store(store));
            let far = wrap(far);
            responders.push(thread::spawn(move || {
                let result = responder.run(far);
                (responder, result)
            }));
        }

        let (requester, served) = memory_pair();
        let served = wrap(served);
        let coordinator = thread::spawn(move || {
            let result = coordinator.run(served);
            (coordinator, result)
        });

        Self { requester: Endpoint::new(wrap(requester)), coordinator, responders }
    }

    /// Send one command as the requester and decode the reply.
    pub fn request(&mut self, command: Command) -> Result<Submission, CoreError> {
        let mode = command.lookup_mode().ok_or(CoreError::UnsupportedCommand {
            role: "requester",
            command,
        })?;

        self.requester.send(command.encode(&WireConfig::default())?)?;
        let reply = self.requester.receive()?;

        Ok(Submission::decode(&reply, mode)?)
    }

    /// Ask the coordinator to stop, then collect every node's final state.
    ///
    /// A coordinator that already stopped on its request budget is simply
    /// joined.
    pub fn finish(mut self) -> ClusterReport {
        if let Ok(frame) = Command::Terminate.encode(&WireConfig::default())
            && let Err(error) = self.requester.send(frame)
        {
            tracing::debug!(%error, "coordinator already stopped");
        }

        let (coordinator, result) = join(self.coordinator);
        let responders = self
            .responders
            .into_iter()
            .map(join)
            .map(|(responder, result)| (result, responder.store().clone()))
            .collect();

        ClusterReport { coordinator: result, local: coordinator.local().clone(), responders }
    }
}

fn join<T>(handle: JoinHandle<T>) -> T {
    handle.join().unwrap_or_else(|e| panic::resume_unwind(e))
}

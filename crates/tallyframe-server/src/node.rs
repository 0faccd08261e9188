//! Node runtimes over TCP.
//!
//! Each role is one blocking loop on the calling thread. Responders listen
//! for their coordinator; the coordinator dials every responder, then listens
//! for the requester. Startup order is therefore responders first.

use std::net::{SocketAddr, TcpListener, TcpStream};

use serde::Serialize;
use tallyframe_core::{
    Channel, Coordinator, CoordinatorConfig, CoordinatorStats, Endpoint, RecordStore, Responder,
    ResponderStats,
};
use tallyframe_proto::{Command, Submission};

use crate::{
    config::{CoordinatorNodeConfig, RequestConfig, ResponderNodeConfig},
    dataset,
    error::NodeError,
    stream::StreamChannel,
};

/// One requester command and what came back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestResult {
    /// The command as sent.
    pub command: String,
    /// Decoded reply; absent for TERMINATE.
    pub reply: Option<String>,
}

/// Load the dataset, wait for the coordinator and serve it until TERMINATE.
pub fn run_responder(config: &ResponderNodeConfig) -> Result<ResponderStats, NodeError> {
    let store = load(config.dataset.as_deref(), true)?;
    let listener = TcpListener::bind(config.listen)?;

    serve_responder(&listener, store)
}

/// Serve one coordinator connection from `listener`.
pub fn serve_responder(
    listener: &TcpListener,
    store: RecordStore,
) -> Result<ResponderStats, NodeError> {
    tracing::info!(addr = %listener.local_addr()?, "responder waiting for coordinator");

    let (stream, peer) = listener.accept()?;
    stream.set_nodelay(true)?;
    tracing::info!(%peer, "coordinator connected");

    Ok(Responder::new(store).run(StreamChannel::new(stream))?)
}

/// Load the dataset, dial every responder, then serve one requester.
pub fn run_coordinator(config: &CoordinatorNodeConfig) -> Result<CoordinatorStats, NodeError> {
    if config.responders.is_empty() {
        tracing::warn!("no responders configured; serving from the local store only");
    }

    let store = load(config.dataset.as_deref(), false)?;
    let listener = TcpListener::bind(config.listen)?;

    serve_coordinator(&listener, store, config.core, &config.responders)
}

/// Dial `responders` in order, then serve one requester from `listener`.
pub fn serve_coordinator(
    listener: &TcpListener,
    store: RecordStore,
    core: CoordinatorConfig,
    responders: &[SocketAddr],
) -> Result<CoordinatorStats, NodeError> {
    let mut coordinator = Coordinator::new(core, store);

    for &addr in responders {
        coordinator.add_remote(addr.to_string(), StreamChannel::new(connect(addr)?));
        tracing::info!(%addr, "connected to responder");
    }

    tracing::info!(addr = %listener.local_addr()?, "coordinator waiting for requester");
    let (stream, peer) = listener.accept()?;
    stream.set_nodelay(true)?;
    tracing::info!(%peer, "requester connected");

    Ok(coordinator.run(StreamChannel::new(stream))?)
}

/// Send each configured command to the coordinator and collect the replies.
///
/// Stops after TERMINATE.
pub fn run_request(config: &RequestConfig) -> Result<Vec<RequestResult>, NodeError> {
    let mut endpoint = Endpoint::new(StreamChannel::new(connect(config.coordinator)?));
    let mut results = Vec::with_capacity(config.commands.len());

    for request in &config.commands {
        let command = request.0;
        let reply = send(&mut endpoint, command, config)?;

        tracing::info!(?command, ?reply, "reply");
        results.push(RequestResult {
            command: format!("{command:?}"),
            reply: reply.map(|r| format!("{r:?}")),
        });

        if reply.is_none() {
            break;
        }
    }

    Ok(results)
}

fn send<C: Channel>(
    endpoint: &mut Endpoint<C>,
    command: Command,
    config: &RequestConfig,
) -> Result<Option<Submission>, NodeError> {
    let frame = command.encode(&config.wire)?;
    endpoint.send(frame)?;

    let Some(mode) = command.lookup_mode() else {
        return Ok(None);
    };

    let reply = endpoint.receive()?;
    Ok(Some(Submission::decode(&reply, mode)?))
}

fn connect(addr: SocketAddr) -> Result<TcpStream, NodeError> {
    let stream = TcpStream::connect(addr)?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

fn load(path: Option<&std::path::Path>, servable: bool) -> Result<RecordStore, NodeError> {
    path.map_or_else(|| Ok(RecordStore::new()), |path| dataset::load_store(path, servable))
}

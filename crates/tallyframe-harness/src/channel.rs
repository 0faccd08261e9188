//! In-memory channels.

use std::{
    collections::VecDeque,
    io,
    sync::mpsc::{Receiver, Sender, channel},
};

use bytes::Bytes;
use tallyframe_core::{Channel, ChannelError, Responder};
use tallyframe_proto::Outcome;

/// One end of an in-memory, thread-safe frame pipe.
///
/// Dropping either end closes the pipe; the other side then sees
/// [`ChannelError::Closed`].
#[derive(Debug)]
pub struct MemoryChannel {
    tx: Sender<Bytes>,
    rx: Receiver<Bytes>,
}

/// Create two connected channels.
pub fn memory_pair() -> (MemoryChannel, MemoryChannel) {
    let (a_tx, b_rx) = channel();
    let (b_tx, a_rx) = channel();

    (MemoryChannel { tx: a_tx, rx: a_rx }, MemoryChannel { tx: b_tx, rx: b_rx })
}

impl Channel for MemoryChannel {
    fn read_frame(&mut self) -> Result<Bytes, ChannelError> {
        self.rx.recv().map_err(|_| ChannelError::Closed)
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ChannelError> {
        self.tx.send(Bytes::copy_from_slice(frame)).map_err(|_| ChannelError::Closed)
    }
}

/// Wraps a channel and, on every `period`-th write, hands that frame back on
/// the next read before any genuine frame.
///
/// Models a shared medium where a node can observe its own transmissions.
#[derive(Debug)]
pub struct EchoingChannel<C> {
    inner: C,
    period: u64,
    writes: u64,
    pending: Option<Bytes>,
    injected: u64,
}

impl<C: Channel> EchoingChannel<C> {
    /// Echo every `period`-th write. A period of zero disables echoes.
    pub fn new(inner: C, period: u64) -> Self {
        Self { inner, period, writes: 0, pending: None, injected: 0 }
    }

    /// Echo every write.
    pub fn always(inner: C) -> Self {
        Self::new(inner, 1)
    }

    /// Echoes handed back so far.
    pub fn injected(&self) -> u64 {
        self.injected
    }
}

impl<C: Channel> Channel for EchoingChannel<C> {
    fn read_frame(&mut self) -> Result<Bytes, ChannelError> {
        if let Some(echo) = self.pending.take() {
            self.injected += 1;
            return Ok(echo);
        }
        self.inner.read_frame()
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ChannelError> {
        self.inner.write_frame(frame)?;
        self.writes += 1;

        if self.period != 0 && self.writes % self.period == 0 {
            self.pending = Some(Bytes::copy_from_slice(frame));
        }
        Ok(())
    }
}

/// Channel whose far end is a [`Responder`] served inline on write.
///
/// Mirrors [`Responder::run`]: unsupported commands get a Fail reply and
/// TERMINATE gets none.
#[derive(Debug)]
pub struct LoopbackChannel {
    responder: Responder,
    replies: VecDeque<Bytes>,
    terminated: bool,
}

impl LoopbackChannel {
    /// Serve `responder` through this channel.
    pub fn new(responder: Responder) -> Self {
        Self { responder, replies: VecDeque::new(), terminated: false }
    }

    /// The responder being served.
    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Whether TERMINATE has been received.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl Channel for LoopbackChannel {
    fn read_frame(&mut self) -> Result<Bytes, ChannelError> {
        self.replies.pop_front().ok_or(ChannelError::Closed)
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ChannelError> {
        if self.terminated {
            return Err(ChannelError::Closed);
        }

        match self.responder.process_frame(frame) {
            Ok(Some(reply)) => self.replies.push_back(reply),
            Ok(None) => self.terminated = true,
            Err(e) if !e.is_fatal() => {
                tracing::warn!(error = %e, "loopback responder rejected command");
                let fail = Outcome::Fail.encode_reply().map_err(io::Error::other)?;
                self.replies.push_back(fail);
            },
            Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e).into()),
        }
        Ok(())
    }
}

//! Channel contract and echo suppression.
//!
//! The transport is external. It must deliver whole frames reliably and in
//! order, but it may loop a sender's own write back to it as input. The
//! protocol has no sequence numbers to tell a genuine frame from an echo, so
//! [`Endpoint`] drops any received frame that is bit-identical to the last
//! frame it sent and reads again in place.
//!
//! # Invariants
//!
//! - Frames are never split or merged by the channel
//! - A read blocks until a frame arrives; there are no timeouts
//! - Echo suppression compares against the most recent send only

use bytes::Bytes;
use thiserror::Error;

/// Transport failures.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The peer hung up.
    #[error("channel closed")]
    Closed,

    /// Underlying I/O failed.
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame is larger than the transport can carry.
    #[error("frame of {len} bytes exceeds the {max}-byte channel limit")]
    FrameTooLarge {
        /// Offending frame length.
        len: usize,
        /// Transport limit.
        max: usize,
    },
}

/// Blocking, reliable, ordered, discrete-frame transport.
///
/// One channel connects exactly one coordinator–responder pair (or the
/// requester and the coordinator).
pub trait Channel {
    /// Block until the next frame arrives.
    fn read_frame(&mut self) -> Result<Bytes, ChannelError>;

    /// Send one frame.
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ChannelError>;
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn read_frame(&mut self) -> Result<Bytes, ChannelError> {
        (**self).read_frame()
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ChannelError> {
        (**self).write_frame(frame)
    }
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn read_frame(&mut self) -> Result<Bytes, ChannelError> {
        (**self).read_frame()
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ChannelError> {
        (**self).write_frame(frame)
    }
}

/// A channel plus the memory needed to discard self-echoes.
#[derive(Debug)]
pub struct Endpoint<C> {
    channel: C,
    last_sent: Option<Bytes>,
    echoes_skipped: u64,
}

impl<C: Channel> Endpoint<C> {
    /// Wrap a channel.
    pub fn new(channel: C) -> Self {
        Self { channel, last_sent: None, echoes_skipped: 0 }
    }

    /// Send a frame and remember it for echo suppression.
    pub fn send(&mut self, frame: Bytes) -> Result<(), ChannelError> {
        self.last_sent = Some(frame.clone());
        self.channel.write_frame(&frame)
    }

    /// Read the next frame that is not an echo of our last send.
    pub fn receive(&mut self) -> Result<Bytes, ChannelError> {
        loop {
            let frame = self.channel.read_frame()?;

            if self.last_sent.as_deref() == Some(&frame[..]) {
                self.echoes_skipped += 1;
                tracing::trace!(len = frame.len(), "skipping self-echoed frame");
                continue;
            }

            return Ok(frame);
        }
    }

    /// Echoes discarded so far.
    pub fn echoes_skipped(&self) -> u64 {
        self.echoes_skipped
    }

    /// The wrapped channel.
    pub fn get_ref(&self) -> &C {
        &self.channel
    }
}

//! Remote store proxy.
//!
//! Presents a remote responder's store through the same [`LookupSource`]
//! contract as a local [`RecordStore`](crate::RecordStore). Each lookup is one
//! blocking request/reply exchange; there is never more than one request in
//! flight on a proxy's channel.
//!
//! Lookups through a proxy are destructive: the responder clears any record it
//! returns. Callers must keep what they get back.

use tallyframe_proto::{AccountId, Command, LookupMode, Outcome, WireConfig};

use crate::{
    channel::{Channel, Endpoint},
    error::CoreError,
    store::LookupSource,
};

/// Coordinator-side handle on one responder.
#[derive(Debug)]
pub struct RemoteStoreProxy<C> {
    name: String,
    endpoint: Endpoint<C>,
    wire: WireConfig,
    round_trips: u64,
    terminated: bool,
}

impl<C: Channel> RemoteStoreProxy<C> {
    /// Wrap the channel to a responder.
    pub fn new(name: impl Into<String>, channel: C, wire: WireConfig) -> Self {
        Self {
            name: name.into(),
            endpoint: Endpoint::new(channel),
            wire,
            round_trips: 0,
            terminated: false,
        }
    }

    /// Label used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Completed request/reply exchanges.
    pub fn round_trips(&self) -> u64 {
        self.round_trips
    }

    /// Echoed frames discarded on this channel.
    pub fn echoes_skipped(&self) -> u64 {
        self.endpoint.echoes_skipped()
    }

    /// The underlying channel.
    pub fn channel(&self) -> &C {
        self.endpoint.get_ref()
    }

    /// Whether TERMINATE has been sent.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Send TERMINATE. The responder exits without replying.
    pub fn terminate(&mut self) -> Result<(), CoreError> {
        if self.terminated {
            return Ok(());
        }

        let frame = Command::Terminate.encode(&self.wire)?;
        self.endpoint.send(frame)?;
        self.terminated = true;

        tracing::debug!(remote = %self.name, "sent terminate");
        Ok(())
    }

    fn request(&mut self, mode: LookupMode, id: AccountId) -> Result<Outcome, CoreError> {
        let frame = Command::lookup(mode, id).encode(&self.wire)?;
        self.endpoint.send(frame)?;

        let reply = self.endpoint.receive()?;
        self.round_trips += 1;

        let outcome = Outcome::decode_reply(&reply, mode)?;
        tracing::trace!(remote = %self.name, %mode, id, ?outcome, "remote lookup");
        Ok(outcome)
    }
}

impl<C: Channel> LookupSource for RemoteStoreProxy<C> {
    fn find(&mut self, id: AccountId) -> Result<Outcome, CoreError> {
        self.request(LookupMode::Find, id)
    }

    fn query(&mut self, id: AccountId) -> Result<Outcome, CoreError> {
        self.request(LookupMode::Query, id)
    }

    fn close(&mut self) -> Result<(), CoreError> {
        self.terminate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;

    use bytes::Bytes;

    use super::*;
    use crate::channel::ChannelError;

    #[derive(Default)]
    struct Canned {
        replies: VecDeque<Bytes>,
        written: Vec<Bytes>,
    }

    impl Channel for Canned {
        fn read_frame(&mut self) -> Result<Bytes, ChannelError> {
            self.replies.pop_front().ok_or(ChannelError::Closed)
        }

        fn write_frame(&mut self, frame: &[u8]) -> Result<(), ChannelError> {
            self.written.push(Bytes::copy_from_slice(frame));
            Ok(())
        }
    }

    fn proxy(replies: &[&'static [u8]]) -> RemoteStoreProxy<Canned> {
        let canned = Canned {
            replies: replies.iter().map(|r| Bytes::from_static(r)).collect(),
            ..Canned::default()
        };
        RemoteStoreProxy::new("tandy", canned, WireConfig::default())
    }

    #[test]
    fn find_sends_find_frame_and_decodes_reply() {
        let mut remote = proxy(&[&[31, 0x23, 0x5a, 0x00, 0x03, 0xe8]]);

        let outcome = LookupSource::find(&mut remote, 9000).unwrap();
        assert_eq!(outcome, Outcome::NearAbove { id: 9050, balance: 1000 });
        assert_eq!(remote.round_trips(), 1);
        assert_eq!(&remote.endpoint.get_ref().written[0][..], [201, 0x23, 0x28]);
    }

    #[test]
    fn query_decodes_in_query_mode() {
        let mut remote = proxy(&[&[77, 0x00, 0x03, 0xe8]]);
        assert_eq!(LookupSource::query(&mut remote, 500).unwrap(), Outcome::Ok { balance: 1000 });
    }

    #[test]
    fn undecodable_reply_is_protocol_error() {
        let mut remote = proxy(&[&[77, 0, 0]]);
        assert!(matches!(LookupSource::query(&mut remote, 1), Err(CoreError::Protocol(_))));
    }

    #[test]
    fn echoed_request_is_skipped_before_reply() {
        let mut remote = proxy(&[&[101, 0x01, 0xf4], &[77, 0x00, 0x03, 0xe8]]);

        assert_eq!(LookupSource::query(&mut remote, 500).unwrap(), Outcome::Ok { balance: 1000 });
        assert_eq!(remote.echoes_skipped(), 1);
        assert_eq!(remote.round_trips(), 1);
    }

    #[test]
    fn terminate_is_sent_once() {
        let mut remote = proxy(&[]);
        remote.terminate().unwrap();
        remote.close().unwrap();

        assert!(remote.is_terminated());
        let written = &remote.endpoint.get_ref().written;
        assert_eq!(written.len(), 1);
        assert_eq!(&written[0][..], [255, 0, 0]);
    }
}

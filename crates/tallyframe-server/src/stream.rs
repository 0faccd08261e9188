//! Length-prefixed frames over a byte stream.
//!
//! # Wire Format
//!
//! ```text
//! ┌──────────────┬─────────────────┐
//! │ len: u16 BE  │ frame: len bytes│
//! └──────────────┴─────────────────┘
//! ```
//!
//! Protocol frames are at most nine bytes, so anything above
//! [`MAX_FRAME_LEN`] is treated as a corrupt stream.

use std::io::{self, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};
use tallyframe_core::{Channel, ChannelError};

/// Largest frame accepted in either direction.
pub const MAX_FRAME_LEN: usize = 64;

const PREFIX_LEN: usize = 2;

/// [`Channel`] over any blocking byte stream, typically a `TcpStream`.
#[derive(Debug)]
pub struct StreamChannel<S> {
    stream: S,
    buf: BytesMut,
}

impl<S: Read + Write> StreamChannel<S> {
    /// Frame `stream`.
    pub fn new(stream: S) -> Self {
        Self { stream, buf: BytesMut::with_capacity(PREFIX_LEN + MAX_FRAME_LEN) }
    }

    /// The underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write> Channel for StreamChannel<S> {
    fn read_frame(&mut self) -> Result<Bytes, ChannelError> {
        let mut prefix = [0u8; PREFIX_LEN];
        read_exact(&mut self.stream, &mut prefix)?;

        let len = usize::from(u16::from_be_bytes(prefix));
        if len > MAX_FRAME_LEN {
            return Err(ChannelError::FrameTooLarge { len, max: MAX_FRAME_LEN });
        }

        self.buf.clear();
        self.buf.resize(len, 0);
        read_exact(&mut self.stream, &mut self.buf)?;

        Ok(self.buf.split().freeze())
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ChannelError> {
        let too_large = ChannelError::FrameTooLarge { len: frame.len(), max: MAX_FRAME_LEN };
        if frame.len() > MAX_FRAME_LEN {
            return Err(too_large);
        }
        let len = u16::try_from(frame.len()).map_err(|_| too_large)?;

        self.buf.clear();
        self.buf.put_u16(len);
        self.buf.put_slice(frame);

        self.stream.write_all(&self.buf)?;
        self.stream.flush()?;
        Ok(())
    }
}

fn read_exact<S: Read>(stream: &mut S, buf: &mut [u8]) -> Result<(), ChannelError> {
    stream.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ChannelError::Closed,
        _ => ChannelError::Io(e),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use proptest::prelude::*;

    use super::*;

    /// In-memory duplex: reads from `input`, writes to `output`.
    struct Duplex {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn channel(input: &[u8]) -> StreamChannel<Duplex> {
        StreamChannel::new(Duplex { input: Cursor::new(input.to_vec()), output: Vec::new() })
    }

    #[test]
    fn write_prefixes_length() {
        let mut ch = channel(&[]);
        ch.write_frame(&[101, 0x01, 0xf4]).unwrap();
        assert_eq!(ch.get_ref().output, [0, 3, 101, 0x01, 0xf4]);
    }

    #[test]
    fn reads_consecutive_frames() {
        let mut ch = channel(&[0, 1, 66, 0, 4, 77, 0, 3, 0xe8]);

        assert_eq!(&ch.read_frame().unwrap()[..], [66]);
        assert_eq!(&ch.read_frame().unwrap()[..], [77, 0, 3, 0xe8]);
        assert!(matches!(ch.read_frame(), Err(ChannelError::Closed)));
    }

    #[test]
    fn truncated_frame_is_closed() {
        let mut ch = channel(&[0, 4, 77, 0]);
        assert!(matches!(ch.read_frame(), Err(ChannelError::Closed)));
    }

    #[test]
    fn oversized_frames_rejected() {
        let mut ch = channel(&[0x01, 0x00]);
        assert!(matches!(ch.read_frame(), Err(ChannelError::FrameTooLarge { len: 256, .. })));
        assert!(matches!(
            ch.write_frame(&[0; MAX_FRAME_LEN + 1]),
            Err(ChannelError::FrameTooLarge { .. })
        ));
    }

    proptest! {
        #[test]
        fn written_frames_read_back(frames in prop::collection::vec(
            prop::collection::vec(any::<u8>(), 0..=MAX_FRAME_LEN), 0..20
        )) {
            let mut writer = channel(&[]);
            for frame in &frames {
                writer.write_frame(frame).unwrap();
            }

            let mut reader = channel(&writer.into_inner().output);
            for frame in &frames {
                prop_assert_eq!(&reader.read_frame().unwrap()[..], &frame[..]);
            }
            prop_assert!(matches!(reader.read_frame(), Err(ChannelError::Closed)));
        }
    }
}

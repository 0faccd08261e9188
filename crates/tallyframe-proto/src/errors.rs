//! Protocol errors.

use thiserror::Error;

use crate::shape::Direction;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding frames.
///
/// Decode errors are fatal: the protocol has no resynchronisation or retry, so
/// a frame that matches no known shape ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A zero-length frame arrived.
    #[error("empty {direction} frame")]
    EmptyFrame {
        /// Where the frame was expected.
        direction: Direction,
    },

    /// No entry in the shape table matches this `(length, leading byte)`.
    #[error("no {direction} frame shape is {len} bytes led by {lead:#04x}")]
    UnknownShape {
        /// Where the frame was expected.
        direction: Direction,
        /// Total frame length.
        len: usize,
        /// Leading status byte.
        lead: u8,
    },

    /// A value is too large for its fixed-width field.
    #[error("amount {amount} does not fit in {width} bytes")]
    AmountOverflow {
        /// The value that was being encoded.
        amount: u64,
        /// Field width in bytes.
        width: usize,
    },
}

//! Wire format for the Tallyframe protocol.
//!
//! Frames are tiny, fixed-shape byte strings with no length prefix and no
//! sequence numbers. A frame's meaning is recovered from two things only: its
//! total length and its leading status byte. Every decode goes through
//! [`FrameShape::classify`], a single dispatch table keyed by
//! `(length, leading byte)`.
//!
//! Replies are not self-describing. A FIND reply carries a matched id that a
//! QUERY reply lacks, so the caller must pass the [`LookupMode`] of the command
//! being answered into every reply and submission decode.
//!
//! All multi-byte integers are big-endian and unsigned.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod config;
pub mod errors;
pub mod outcome;
pub mod shape;
pub mod status;
pub mod submission;

pub use command::Command;
pub use config::{AmountWidth, WireConfig};
pub use errors::{ProtocolError, Result};
pub use outcome::Outcome;
pub use shape::{Direction, FrameShape};
pub use status::{LookupMode, Tier};
pub use submission::Submission;

/// Account identifier. Valid accounts use `1..=65535`.
pub type AccountId = u16;

/// Account balance in the smallest currency unit.
pub type Balance = u64;

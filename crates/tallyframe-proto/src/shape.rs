//! Shape dispatch.
//!
//! Frames have no length prefix and no type tag beyond their first byte, so
//! every decoder starts here. [`FrameShape::classify`] is the one table that
//! maps `(direction, length, leading byte)` to a tagged shape; the per-type
//! decoders only read fields out of a shape they have already been handed.
//!
//! | direction            | len | lead          | shape                 |
//! |----------------------|-----|---------------|-----------------------|
//! | command              | 2   | QUERY / FIND  | `NarrowLookup`        |
//! | command              | 3   | QUERY / FIND  | `Lookup`              |
//! | command              | 3   | TERMINATE     | `Terminate`           |
//! | command              | 6   | GIVE          | `Give(Three)`         |
//! | command              | 7   | GIVE          | `Give(Four)`          |
//! | reply / submission   | 1   | FAIL          | `Fail`                |
//! | reply (query)        | 4   | OK            | `QueryReply`          |
//! | reply (find)         | 6   | tier code     | `FindReply(tier)`     |
//! | submission (find)    | 2   | OK            | `Credited`            |
//! | submission (query)   | 9   | OK            | `Balance`             |

use std::fmt;

use crate::{
    config::AmountWidth,
    errors::{ProtocolError, Result},
    status::{LookupMode, Tier, codes},
};

/// Which side of the protocol a frame travels on.
///
/// Replies and submissions are decoded relative to the lookup they answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Requester to coordinator, or coordinator to responder.
    Command,
    /// Responder to coordinator.
    Reply(LookupMode),
    /// Coordinator to requester.
    Submission(LookupMode),
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::Reply(mode) => write!(f, "{mode} reply"),
            Self::Submission(mode) => write!(f, "{mode} submission"),
        }
    }
}

/// Every frame layout the protocol knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameShape {
    /// `[QUERY|FIND, id:1]`
    NarrowLookup(LookupMode),
    /// `[QUERY|FIND, id:2]`
    Lookup(LookupMode),
    /// `[TERMINATE, 0, 0]`
    Terminate,
    /// `[GIVE, id:2, amount:3|4]`
    Give(AmountWidth),
    /// `[FAIL]`
    Fail,
    /// `[OK, balance:3]`
    QueryReply,
    /// `[tier, id:2, balance:3]`
    FindReply(Tier),
    /// `[OK, tier]`
    Credited,
    /// `[OK, balance:8]`
    Balance,
}

impl FrameShape {
    /// Look a frame up in the shape table.
    pub fn classify(frame: &[u8], direction: Direction) -> Result<Self> {
        let Some(&lead) = frame.first() else {
            return Err(ProtocolError::EmptyFrame { direction });
        };

        let unknown = ProtocolError::UnknownShape { direction, len: frame.len(), lead };

        let shape = match (direction, frame.len(), lead) {
            (Direction::Command, 2, codes::QUERY) => Self::NarrowLookup(LookupMode::Query),
            (Direction::Command, 2, codes::FIND) => Self::NarrowLookup(LookupMode::Find),
            (Direction::Command, 3, codes::QUERY) => Self::Lookup(LookupMode::Query),
            (Direction::Command, 3, codes::FIND) => Self::Lookup(LookupMode::Find),
            (Direction::Command, 3, codes::TERMINATE) => Self::Terminate,
            (Direction::Command, 6, codes::GIVE) => Self::Give(AmountWidth::Three),
            (Direction::Command, 7, codes::GIVE) => Self::Give(AmountWidth::Four),

            (Direction::Reply(_) | Direction::Submission(_), 1, codes::FAIL) => Self::Fail,
            (Direction::Reply(LookupMode::Query), 4, codes::OK) => Self::QueryReply,
            (Direction::Reply(LookupMode::Find), 6, code) => {
                Self::FindReply(Tier::from_code(code).ok_or(unknown)?)
            },

            (Direction::Submission(LookupMode::Find), 2, codes::OK) => Self::Credited,
            (Direction::Submission(LookupMode::Query), 9, codes::OK) => Self::Balance,

            _ => return Err(unknown),
        };

        Ok(shape)
    }

    /// Total frame length for this shape.
    pub const fn len(self) -> usize {
        match self {
            Self::Fail => 1,
            Self::NarrowLookup(_) | Self::Credited => 2,
            Self::Lookup(_) | Self::Terminate => 3,
            Self::QueryReply => 4,
            Self::Give(width) => 3 + width.bytes(),
            Self::FindReply(_) => 6,
            Self::Balance => 9,
        }
    }
}

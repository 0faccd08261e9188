//! Lookup outcomes and their responder-to-coordinator encoding.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    AccountId, Balance,
    errors::{ProtocolError, Result},
    shape::{Direction, FrameShape},
    status::{LookupMode, Tier, codes},
};

/// Width of the balance field in a responder reply.
const REPLY_BALANCE_WIDTH: usize = 3;

/// Largest balance a responder reply can carry.
pub const MAX_REPLY_BALANCE: Balance = 0x00FF_FFFF;

/// Result of a lookup against one store.
///
/// `Fail` is an ordinary result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Nothing found.
    Fail,
    /// QUERY hit. The id is the one that was asked for.
    Ok {
        /// Stored balance.
        balance: Balance,
    },
    /// FIND hit on the requested id.
    Exact {
        /// Matched account.
        id: AccountId,
        /// Stored balance.
        balance: Balance,
    },
    /// FIND hit on the nearest id above the requested one.
    NearAbove {
        /// Matched account.
        id: AccountId,
        /// Stored balance.
        balance: Balance,
    },
    /// FIND hit on the nearest id below the requested one.
    NearBelow {
        /// Matched account.
        id: AccountId,
        /// Stored balance.
        balance: Balance,
    },
}

impl Outcome {
    /// FIND hit at `tier`.
    pub const fn found(tier: Tier, id: AccountId, balance: Balance) -> Self {
        match tier {
            Tier::Exact => Self::Exact { id, balance },
            Tier::NearAbove => Self::NearAbove { id, balance },
            Tier::NearBelow => Self::NearBelow { id, balance },
        }
    }

    /// Match tier. A QUERY hit counts as exact.
    pub const fn tier(&self) -> Option<Tier> {
        match self {
            Self::Fail => None,
            Self::Ok { .. } | Self::Exact { .. } => Some(Tier::Exact),
            Self::NearAbove { .. } => Some(Tier::NearAbove),
            Self::NearBelow { .. } => Some(Tier::NearBelow),
        }
    }

    /// True for [`Outcome::Fail`].
    pub const fn is_fail(&self) -> bool {
        matches!(self, Self::Fail)
    }

    /// Stored balance of the matched record.
    pub const fn balance(&self) -> Option<Balance> {
        match self {
            Self::Fail => None,
            Self::Ok { balance }
            | Self::Exact { balance, .. }
            | Self::NearAbove { balance, .. }
            | Self::NearBelow { balance, .. } => Some(*balance),
        }
    }

    /// Matched `(id, balance)`. QUERY hits carry no id, so the requested id
    /// fills in.
    pub const fn matched(&self, requested: AccountId) -> Option<(AccountId, Balance)> {
        match self {
            Self::Fail => None,
            Self::Ok { balance } => Some((requested, *balance)),
            Self::Exact { id, balance }
            | Self::NearAbove { id, balance }
            | Self::NearBelow { id, balance } => Some((*id, *balance)),
        }
    }

    /// Whether this outcome ends the search for a command in `mode`.
    pub const fn is_exact_for(&self, mode: LookupMode) -> bool {
        match mode {
            LookupMode::Query => matches!(self, Self::Ok { .. }),
            LookupMode::Find => matches!(self, Self::Exact { .. }),
        }
    }

    /// Encode as a responder reply.
    ///
    /// `Ok` uses the QUERY reply shape, the tiered variants the FIND shape.
    pub fn encode_reply(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(6);

        match *self {
            Self::Fail => buf.put_u8(codes::FAIL),
            Self::Ok { balance } => {
                buf.put_u8(codes::OK);
                put_reply_balance(&mut buf, balance)?;
            },
            Self::Exact { id, balance }
            | Self::NearAbove { id, balance }
            | Self::NearBelow { id, balance } => {
                let tier = self.tier().map_or(codes::FAIL, Tier::code);
                buf.put_u8(tier);
                buf.put_u16(id);
                put_reply_balance(&mut buf, balance)?;
            },
        }

        Ok(buf.freeze())
    }

    /// Decode a responder reply to a lookup issued in `mode`.
    pub fn decode_reply(frame: &[u8], mode: LookupMode) -> Result<Self> {
        let direction = Direction::Reply(mode);
        let shape = FrameShape::classify(frame, direction)?;
        let mut body = &frame[1..];

        let outcome = match shape {
            FrameShape::Fail => Self::Fail,
            FrameShape::QueryReply => Self::Ok { balance: body.get_uint(REPLY_BALANCE_WIDTH) },
            FrameShape::FindReply(tier) => {
                let id = body.get_u16();
                let balance = body.get_uint(REPLY_BALANCE_WIDTH);
                Self::found(tier, id, balance)
            },
            _ => {
                return Err(ProtocolError::UnknownShape {
                    direction,
                    len: frame.len(),
                    lead: frame[0],
                });
            },
        };

        Ok(outcome)
    }
}

fn put_reply_balance(buf: &mut BytesMut, balance: Balance) -> Result<()> {
    if balance > MAX_REPLY_BALANCE {
        return Err(ProtocolError::AmountOverflow {
            amount: balance,
            width: REPLY_BALANCE_WIDTH,
        });
    }
    buf.put_uint(balance, REPLY_BALANCE_WIDTH);
    Ok(())
}

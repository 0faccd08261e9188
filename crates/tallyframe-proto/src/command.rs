//! Control commands.
//!
//! The same command frames travel from the external requester to the
//! coordinator (QUERY, GIVE, TERMINATE) and from the coordinator to each
//! responder (QUERY, FIND, TERMINATE).

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    AccountId, Balance,
    config::WireConfig,
    errors::{ProtocolError, Result},
    shape::{Direction, FrameShape},
    status::{LookupMode, codes},
};

/// A decoded control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Exact balance lookup.
    Query {
        /// Requested account.
        id: AccountId,
    },
    /// Approximate lookup within 100 ids either side.
    Find {
        /// Requested account.
        id: AccountId,
    },
    /// Credit `amount`, scaled by match tier, to the best match for `id`.
    Give {
        /// Requested account.
        id: AccountId,
        /// Unscaled amount to credit.
        amount: Balance,
    },
    /// End the session. Never answered.
    Terminate,
}

impl Command {
    /// Requested account, if the command targets one.
    pub const fn id(&self) -> Option<AccountId> {
        match self {
            Self::Query { id } | Self::Find { id } | Self::Give { id, .. } => Some(*id),
            Self::Terminate => None,
        }
    }

    /// Lookup semantics used to serve this command.
    pub const fn lookup_mode(&self) -> Option<LookupMode> {
        match self {
            Self::Query { .. } => Some(LookupMode::Query),
            Self::Find { .. } | Self::Give { .. } => Some(LookupMode::Find),
            Self::Terminate => None,
        }
    }

    /// Lookup command for `mode`.
    pub const fn lookup(mode: LookupMode, id: AccountId) -> Self {
        match mode {
            LookupMode::Query => Self::Query { id },
            LookupMode::Find => Self::Find { id },
        }
    }

    /// Encode to a frame. GIVE uses the configured amount width.
    pub fn encode(&self, config: &WireConfig) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(7);

        match *self {
            Self::Query { id } => {
                buf.put_u8(codes::QUERY);
                buf.put_u16(id);
            },
            Self::Find { id } => {
                buf.put_u8(codes::FIND);
                buf.put_u16(id);
            },
            Self::Give { id, amount } => {
                let width = config.amount_width;
                if amount > width.max_amount() {
                    return Err(ProtocolError::AmountOverflow { amount, width: width.bytes() });
                }
                buf.put_u8(codes::GIVE);
                buf.put_u16(id);
                buf.put_uint(amount, width.bytes());
            },
            Self::Terminate => {
                buf.put_u8(codes::TERMINATE);
                buf.put_u16(0);
            },
        }

        Ok(buf.freeze())
    }

    /// Decode a command frame.
    ///
    /// GIVE accepts either amount width; the frame length says which one the
    /// sender used.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        let shape = FrameShape::classify(frame, Direction::Command)?;
        let mut body = &frame[1..];

        let command = match shape {
            FrameShape::NarrowLookup(mode) => Self::lookup(mode, AccountId::from(body.get_u8())),
            FrameShape::Lookup(mode) => Self::lookup(mode, body.get_u16()),
            FrameShape::Terminate => Self::Terminate,
            FrameShape::Give(width) => {
                let id = body.get_u16();
                let amount = body.get_uint(width.bytes());
                Self::Give { id, amount }
            },
            _ => {
                return Err(ProtocolError::UnknownShape {
                    direction: Direction::Command,
                    len: frame.len(),
                    lead: frame[0],
                });
            },
        };

        Ok(command)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hex_literal::hex;
    use proptest::prelude::*;

    use super::*;
    use crate::config::AmountWidth;

    const THREE: WireConfig = WireConfig { amount_width: AmountWidth::Three };
    const FOUR: WireConfig = WireConfig { amount_width: AmountWidth::Four };

    #[test]
    fn lookup_commands_are_three_bytes() {
        let query = Command::Query { id: 500 }.encode(&FOUR).unwrap();
        insta::assert_snapshot!(hex::encode(&query), @"6501f4");

        let find = Command::Find { id: 9000 }.encode(&FOUR).unwrap();
        insta::assert_snapshot!(hex::encode(&find), @"c92328");
    }

    #[test]
    fn terminate_reuses_lookup_shape() {
        let frame = Command::Terminate.encode(&FOUR).unwrap();
        assert_eq!(&frame[..], hex!("ff 0000"));
        assert_eq!(Command::decode(&frame).unwrap(), Command::Terminate);
    }

    #[test]
    fn give_width_follows_config() {
        let give = Command::Give { id: 500, amount: 90 };

        let narrow = give.encode(&THREE).unwrap();
        assert_eq!(&narrow[..], hex!("66 01f4 00005a"));

        let wide = give.encode(&FOUR).unwrap();
        assert_eq!(&wide[..], hex!("66 01f4 0000005a"));

        // Either width decodes back to the same command.
        assert_eq!(Command::decode(&narrow).unwrap(), give);
        assert_eq!(Command::decode(&wide).unwrap(), give);
    }

    #[test]
    fn give_rejects_amount_wider_than_config() {
        let give = Command::Give { id: 1, amount: 0x0100_0000 };
        assert_eq!(
            give.encode(&THREE),
            Err(ProtocolError::AmountOverflow { amount: 0x0100_0000, width: 3 })
        );
        assert!(give.encode(&FOUR).is_ok());
    }

    #[test]
    fn narrow_lookup_decodes_one_byte_id() {
        assert_eq!(Command::decode(&hex!("c9 2a")).unwrap(), Command::Find { id: 42 });
    }

    #[test]
    fn lookup_mode_of_give_is_find() {
        assert_eq!(Command::Give { id: 1, amount: 1 }.lookup_mode(), Some(LookupMode::Find));
        assert_eq!(Command::Query { id: 1 }.lookup_mode(), Some(LookupMode::Query));
        assert_eq!(Command::Terminate.lookup_mode(), None);
    }

    fn command_strategy() -> impl Strategy<Value = Command> {
        prop_oneof![
            any::<u16>().prop_map(|id| Command::Query { id }),
            any::<u16>().prop_map(|id| Command::Find { id }),
            (any::<u16>(), 0..=0xFFFF_FFFFu64)
                .prop_map(|(id, amount)| Command::Give { id, amount }),
            Just(Command::Terminate),
        ]
    }

    proptest! {
        #[test]
        fn prop_command_roundtrip(command in command_strategy()) {
            let frame = command.encode(&FOUR).unwrap();
            prop_assert_eq!(Command::decode(&frame).unwrap(), command);
        }

        #[test]
        fn prop_three_byte_give_roundtrip(id in any::<u16>(), amount in 0..=0xFF_FFFFu64) {
            let give = Command::Give { id, amount };
            let frame = give.encode(&THREE).unwrap();
            prop_assert_eq!(frame.len(), 6);
            prop_assert_eq!(Command::decode(&frame).unwrap(), give);
        }
    }
}

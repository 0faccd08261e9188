//! Coordinator-to-requester replies.
//!
//! The requester never learns which id matched. A GIVE answer says only how
//! well it matched; a QUERY answer carries the full balance in eight bytes.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    Balance,
    errors::{ProtocolError, Result},
    outcome::Outcome,
    shape::{Direction, FrameShape},
    status::{LookupMode, Tier, codes},
};

/// What the requester sees for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Submission {
    /// No record matched.
    Fail,
    /// GIVE succeeded at `tier`.
    Credited {
        /// Tier the credit was scaled by.
        tier: Tier,
    },
    /// QUERY succeeded.
    Balance {
        /// Balance of the requested account.
        balance: Balance,
    },
}

impl Submission {
    /// Reduce a final outcome to what the requester is told.
    pub const fn from_outcome(outcome: &Outcome, mode: LookupMode) -> Self {
        match (outcome.tier(), outcome.balance(), mode) {
            (Some(tier), _, LookupMode::Find) => Self::Credited { tier },
            (_, Some(balance), LookupMode::Query) => Self::Balance { balance },
            _ => Self::Fail,
        }
    }

    /// Encode to a frame.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(9);

        match *self {
            Self::Fail => buf.put_u8(codes::FAIL),
            Self::Credited { tier } => {
                buf.put_u8(codes::OK);
                buf.put_u8(tier.code());
            },
            Self::Balance { balance } => {
                buf.put_u8(codes::OK);
                buf.put_u64(balance);
            },
        }

        buf.freeze()
    }

    /// Decode a submission answering a command in `mode`.
    pub fn decode(frame: &[u8], mode: LookupMode) -> Result<Self> {
        let direction = Direction::Submission(mode);
        let shape = FrameShape::classify(frame, direction)?;
        let mut body = &frame[1..];

        let unknown =
            || ProtocolError::UnknownShape { direction, len: frame.len(), lead: frame[0] };

        match shape {
            FrameShape::Fail => Ok(Self::Fail),
            FrameShape::Credited => {
                let tier = Tier::from_code(body.get_u8()).ok_or_else(unknown)?;
                Ok(Self::Credited { tier })
            },
            FrameShape::Balance => Ok(Self::Balance { balance: body.get_u64() }),
            _ => Err(unknown()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hex_literal::hex;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn give_submission_carries_tier_only() {
        let outcome = Outcome::NearAbove { id: 9050, balance: 1000 };
        let submission = Submission::from_outcome(&outcome, LookupMode::Find);
        assert_eq!(submission, Submission::Credited { tier: Tier::NearAbove });
        assert_eq!(&submission.encode()[..], hex!("4d 1f"));
    }

    #[test]
    fn query_submission_is_nine_bytes() {
        let submission =
            Submission::from_outcome(&Outcome::Ok { balance: 1090 }, LookupMode::Query);
        insta::assert_snapshot!(hex::encode(submission.encode()), @"4d0000000000000442");
    }

    #[test]
    fn fail_submission_ignores_mode() {
        for mode in [LookupMode::Query, LookupMode::Find] {
            let submission = Submission::from_outcome(&Outcome::Fail, mode);
            assert_eq!(&submission.encode()[..], [codes::FAIL]);
            assert_eq!(Submission::decode(&[codes::FAIL], mode).unwrap(), Submission::Fail);
        }
    }

    #[test]
    fn credited_with_bad_tier_is_rejected() {
        assert!(matches!(
            Submission::decode(&hex!("4d 4d"), LookupMode::Find),
            Err(ProtocolError::UnknownShape { len: 2, .. })
        ));
    }

    fn submission_and_mode() -> impl Strategy<Value = (Submission, LookupMode)> {
        let tier = prop_oneof![Just(Tier::Exact), Just(Tier::NearAbove), Just(Tier::NearBelow)];
        prop_oneof![
            Just((Submission::Fail, LookupMode::Query)),
            Just((Submission::Fail, LookupMode::Find)),
            tier.prop_map(|tier| (Submission::Credited { tier }, LookupMode::Find)),
            any::<u64>().prop_map(|balance| (Submission::Balance { balance }, LookupMode::Query)),
        ]
    }

    proptest! {
        #[test]
        fn prop_submission_roundtrip((submission, mode) in submission_and_mode()) {
            let frame = submission.encode();
            prop_assert_eq!(Submission::decode(&frame, mode).unwrap(), submission);
        }
    }
}

//! Wire configuration both ends of a channel must agree on.

/// Width of the amount field in a GIVE frame.
///
/// The decoder infers the width from the frame length (6 or 7 bytes); the
/// encoder uses whatever the local configuration says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AmountWidth {
    /// 3-byte amount, 6-byte GIVE frame.
    Three,
    /// 4-byte amount, 7-byte GIVE frame.
    #[default]
    Four,
}

impl AmountWidth {
    /// Number of bytes the amount occupies.
    pub const fn bytes(self) -> usize {
        match self {
            Self::Three => 3,
            Self::Four => 4,
        }
    }

    /// Largest amount representable at this width.
    pub const fn max_amount(self) -> u64 {
        match self {
            Self::Three => 0x00FF_FFFF,
            Self::Four => 0xFFFF_FFFF,
        }
    }
}

/// Codec settings shared by every frame a node writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WireConfig {
    /// Amount width used when encoding GIVE commands.
    pub amount_width: AmountWidth,
}

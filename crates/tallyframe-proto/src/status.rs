//! Status bytes and the enums built on them.

/// Leading status bytes shared by every frame shape.
pub mod codes {
    /// Exact-only balance lookup.
    pub const QUERY: u8 = 101;
    /// Credit transfer (requester to coordinator only).
    pub const GIVE: u8 = 102;
    /// Approximate lookup (coordinator to responder only).
    pub const FIND: u8 = 201;
    /// Shut the responder down.
    pub const TERMINATE: u8 = 255;
    /// Successful lookup or credit.
    pub const OK: u8 = 77;
    /// No record found.
    pub const FAIL: u8 = 66;
    /// Tier code for an exact match.
    pub const TIER_EXACT: u8 = 30;
    /// Tier code for the nearest record above the requested id.
    pub const TIER_NEAR_ABOVE: u8 = 31;
    /// Tier code for the nearest record below the requested id.
    pub const TIER_NEAR_BELOW: u8 = 32;
}

/// Quality of a successful lookup.
///
/// Ordered worst to best so `Ord` agrees with the protocol's ranking:
/// `NearBelow < NearAbove < Exact`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Nearest record within 100 ids below the requested id.
    NearBelow,
    /// Nearest record within 100 ids above the requested id.
    NearAbove,
    /// The requested id itself.
    Exact,
}

impl Tier {
    /// Wire code for this tier.
    pub const fn code(self) -> u8 {
        match self {
            Self::Exact => codes::TIER_EXACT,
            Self::NearAbove => codes::TIER_NEAR_ABOVE,
            Self::NearBelow => codes::TIER_NEAR_BELOW,
        }
    }

    /// Parse a wire tier code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            codes::TIER_EXACT => Some(Self::Exact),
            codes::TIER_NEAR_ABOVE => Some(Self::NearAbove),
            codes::TIER_NEAR_BELOW => Some(Self::NearBelow),
            _ => None,
        }
    }

    /// Share of a GIVE amount credited at this tier (floor division).
    pub const fn share(self, amount: u64) -> u64 {
        match self {
            Self::Exact => amount,
            Self::NearAbove => amount / 2,
            Self::NearBelow => amount / 3,
        }
    }
}

/// Which lookup a frame answers.
///
/// GIVE searches with FIND semantics, so it maps to [`LookupMode::Find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupMode {
    /// Exact-only lookup; replies carry no id.
    Query,
    /// Approximate lookup; replies carry the matched id.
    Find,
}

impl std::fmt::Display for LookupMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query => f.write_str("query"),
            Self::Find => f.write_str("find"),
        }
    }
}

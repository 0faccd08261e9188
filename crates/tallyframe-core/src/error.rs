//! Core error types.

use tallyframe_proto::{AccountId, Command, ProtocolError};
use thiserror::Error;

use crate::channel::ChannelError;

/// Errors from store, coordinator and responder operations.
///
/// A lookup that finds nothing is [`Outcome::Fail`](tallyframe_proto::Outcome),
/// not an error.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A frame could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The transport failed.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// A credit or clear targeted an id the store does not hold.
    ///
    /// Always a sequencing bug in the caller.
    #[error("invariant violated: cannot {operation} missing account {id}")]
    MissingRecord {
        /// Account that was expected to exist.
        id: AccountId,
        /// Operation that expected it.
        operation: &'static str,
    },

    /// Crediting would overflow the balance.
    #[error("crediting {amount} to account {id} overflows its balance")]
    BalanceOverflow {
        /// Account being credited.
        id: AccountId,
        /// Scaled amount.
        amount: u64,
    },

    /// The command is valid on the wire but not served by this role.
    #[error("{role} does not serve {command:?}")]
    UnsupportedCommand {
        /// Role that received it.
        role: &'static str,
        /// The rejected command.
        command: Command,
    },
}

impl CoreError {
    /// Returns true if this error must end the node's loop.
    ///
    /// Fatal errors are protocol violations, transport failures and broken
    /// invariants. An unsupported command can be answered with a Fail frame.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Protocol(_)
            | Self::Channel(_)
            | Self::MissingRecord { .. }
            | Self::BalanceOverflow { .. } => true,

            Self::UnsupportedCommand { .. } => false,
        }
    }
}

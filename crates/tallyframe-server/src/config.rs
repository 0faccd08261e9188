//! Node runtime configuration.
//!
//! Assembled by the binary from command-line arguments. Every role reads its
//! own section; nothing is shared between processes except the wire format.

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use tallyframe_core::CoordinatorConfig;
use tallyframe_proto::{AccountId, AmountWidth, Balance, Command, WireConfig};

use crate::error::NodeError;

/// Coordinator process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorNodeConfig {
    /// Where the requester connects.
    pub listen: SocketAddr,
    /// Responders, in search order.
    pub responders: Vec<SocketAddr>,
    /// Initial local records. Empty when absent.
    pub dataset: Option<PathBuf>,
    /// Search and budget settings.
    pub core: CoordinatorConfig,
}

/// Responder process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderNodeConfig {
    /// Where the coordinator connects.
    pub listen: SocketAddr,
    /// Initial records. Empty when absent.
    pub dataset: Option<PathBuf>,
}

/// Requester process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    /// Coordinator address.
    pub coordinator: SocketAddr,
    /// Commands to send, in order.
    pub commands: Vec<RequestCommand>,
    /// Encoding for GIVE amounts.
    pub wire: WireConfig,
}

/// Which node to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeConfig {
    /// Primary node.
    Coordinator(CoordinatorNodeConfig),
    /// Remote store node.
    Responder(ResponderNodeConfig),
    /// Command-line requester.
    Request(RequestConfig),
}

impl NodeConfig {
    /// Role name for logs.
    pub fn role(&self) -> &'static str {
        match self {
            Self::Coordinator(_) => "coordinator",
            Self::Responder(_) => "responder",
            Self::Request(_) => "requester",
        }
    }
}

/// A command written as `query:ID`, `find:ID`, `give:ID:AMOUNT` or
/// `terminate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestCommand(pub Command);

impl FromStr for RequestCommand {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();

        let command = match verb.as_str() {
            "query" => Command::Query { id: account_id(parts.next(), s)? },
            "find" => Command::Find { id: account_id(parts.next(), s)? },
            "give" => {
                let id = account_id(parts.next(), s)?;
                let amount = parts.next().ok_or_else(|| invalid(s, "missing amount"))?;
                let amount: Balance = amount.parse().map_err(|_| invalid(s, "bad amount"))?;
                Command::Give { id, amount }
            },
            "terminate" => Command::Terminate,
            _ => return Err(invalid(s, "unknown command")),
        };

        if parts.next().is_some() {
            return Err(invalid(s, "trailing fields"));
        }
        Ok(Self(command))
    }
}

fn account_id(part: Option<&str>, input: &str) -> Result<AccountId, NodeError> {
    let part = part.ok_or_else(|| invalid(input, "missing account id"))?;
    match part.parse() {
        Ok(0) | Err(_) => Err(invalid(input, "account id must be 1..=65535")),
        Ok(id) => Ok(id),
    }
}

fn invalid(input: &str, why: &str) -> NodeError {
    NodeError::Config(format!("invalid command {input:?}: {why}"))
}

/// Map a byte count to a GIVE amount width.
pub fn amount_width(bytes: u8) -> Result<AmountWidth, NodeError> {
    match bytes {
        3 => Ok(AmountWidth::Three),
        4 => Ok(AmountWidth::Four),
        other => Err(NodeError::Config(format!("amount width must be 3 or 4 bytes, got {other}"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Command, NodeError> {
        s.parse::<RequestCommand>().map(|c| c.0)
    }

    #[test]
    fn parses_every_command() {
        assert_eq!(parse("query:500").unwrap(), Command::Query { id: 500 });
        assert_eq!(parse("FIND:9000").unwrap(), Command::Find { id: 9000 });
        assert_eq!(parse("give:9000:90").unwrap(), Command::Give { id: 9000, amount: 90 });
        assert_eq!(parse("terminate").unwrap(), Command::Terminate);
    }

    #[test]
    fn rejects_malformed_commands() {
        let bad_inputs =
            ["", "query", "query:0", "query:70000", "give:1", "give:1:x", "query:1:2", "send:1"];
        for bad in bad_inputs {
            assert!(matches!(parse(bad), Err(NodeError::Config(_))), "{bad} parsed");
        }
    }

    #[test]
    fn amount_widths() {
        assert_eq!(amount_width(3).unwrap(), AmountWidth::Three);
        assert_eq!(amount_width(4).unwrap(), AmountWidth::Four);
        assert!(amount_width(8).is_err());
    }
}

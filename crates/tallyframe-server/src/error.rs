//! Node error types.

use std::{fmt, io, path::PathBuf};

use tallyframe_core::{ChannelError, CoreError, ProtocolError};

/// Errors that can stop a node.
#[derive(Debug)]
pub enum NodeError {
    /// Invalid configuration
    Config(String),

    /// Dataset file could not be read or written
    DatasetIo {
        /// File involved.
        path: PathBuf,
        /// Underlying failure.
        source: io::Error,
    },

    /// Dataset file is malformed
    Dataset(String),

    /// Transport/network error
    Transport(io::Error),

    /// Coordinator or responder failure
    Core(CoreError),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::DatasetIo { path, source } => {
                write!(f, "dataset error: {}: {source}", path.display())
            },
            Self::Dataset(msg) => write!(f, "dataset error: {msg}"),
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::Core(err) => write!(f, "node error: {err}"),
        }
    }
}

impl std::error::Error for NodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DatasetIo { source, .. } => Some(source),
            Self::Transport(err) => Some(err),
            Self::Core(err) => Some(err),
            Self::Config(_) | Self::Dataset(_) => None,
        }
    }
}

impl From<CoreError> for NodeError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<ChannelError> for NodeError {
    fn from(err: ChannelError) -> Self {
        Self::Core(err.into())
    }
}

impl From<ProtocolError> for NodeError {
    fn from(err: ProtocolError) -> Self {
        Self::Core(err.into())
    }
}

impl From<io::Error> for NodeError {
    fn from(err: io::Error) -> Self {
        Self::Transport(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn display_names_the_failing_layer() {
        let err = NodeError::Config("no responders".into());
        assert_eq!(err.to_string(), "configuration error: no responders");

        let err = NodeError::from(ChannelError::Closed);
        assert_eq!(err.to_string(), "node error: channel error: channel closed");
        assert!(err.source().is_some());
    }

    #[test]
    fn dataset_io_keeps_path() {
        let err = NodeError::DatasetIo {
            path: PathBuf::from("/tmp/missing.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "dataset error: /tmp/missing.json: not found");
    }
}

//! Coordinator configuration.

use tallyframe_proto::WireConfig;

/// Number of requests a coordinator serves before shutting down.
pub const DEFAULT_REQUEST_BUDGET: usize = 1000;

/// Coordinator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Requests to serve before terminating every responder.
    pub request_budget: usize,
    /// Consult per-store predictions before remote round trips.
    pub predictor: bool,
    /// Codec settings for frames this node writes.
    pub wire: WireConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            request_budget: DEFAULT_REQUEST_BUDGET,
            predictor: true,
            wire: WireConfig::default(),
        }
    }
}

//! Tallyframe core.
//!
//! Everything that decides which record answers a command lives here:
//!
//! - [`RecordStore`]: authoritative id to balance map with exact and
//!   approximate (±100) lookup
//! - [`RemoteStoreProxy`]: the same lookup contract, served by a remote
//!   [`Responder`] over a [`Channel`]
//! - [`Coordinator`]: searches local then remote stores, re-homes remote hits,
//!   credits GIVE amounts and answers the requester
//! - [`Responder`]: serves lookups from its own store, clearing every record
//!   it hands out
//! - [`Predictor`]: per-store beliefs that skip round trips whose answer is
//!   already known
//!
//! # Architecture
//!
//! ```text
//! requester ──▶ Coordinator ──▶ RecordStore (local)
//!                    │
//!                    ├──▶ Predictor ──▶ RemoteStoreProxy ──▶ Channel ──▶ Responder ──▶ RecordStore
//!                    └──▶ ...one slot per remote, in registration order
//! ```
//!
//! Nodes are single-threaded: every loop is a blocking
//! receive → process → reply cycle with at most one request in flight per
//! channel. Transports are supplied by the caller through [`Channel`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod channel;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod predictor;
pub mod remote;
pub mod responder;
pub mod store;

pub use channel::{Channel, ChannelError, Endpoint};
pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, CoordinatorStats, Step, prefer};
pub use error::CoreError;
pub use predictor::{Mark, Predictor};
pub use remote::RemoteStoreProxy;
pub use responder::{Responder, ResponderStats};
pub use store::{AccountRecord, LookupSource, RecordStore, SEARCH_RADIUS};
pub use tallyframe_proto::{
    AccountId, AmountWidth, Balance, Command, LookupMode, Outcome, ProtocolError, Submission, Tier,
    WireConfig,
};

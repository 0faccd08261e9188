//! Tallyframe node runtime.
//!
//! Runs a coordinator, a responder or a scripted requester over TCP. Frames
//! travel through [`StreamChannel`], which adds a two-byte length prefix so
//! a byte stream can carry discrete protocol frames.
//!
//! # Architecture
//!
//! ```text
//! requester ──TCP──▶ coordinator ──TCP──▶ responder
//!                         │        └─TCP──▶ responder
//!                         ▼
//!                    local store
//! ```
//!
//! All protocol logic lives in `tallyframe-core`; this crate only supplies
//! sockets, dataset files and configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod node;
pub mod stream;

pub use config::{
    CoordinatorNodeConfig, NodeConfig, RequestCommand, RequestConfig, ResponderNodeConfig,
    amount_width,
};
pub use error::NodeError;
pub use node::{
    RequestResult, run_coordinator, run_request, run_responder, serve_coordinator,
    serve_responder,
};
pub use stream::{MAX_FRAME_LEN, StreamChannel};

//! Test harness for Tallyframe.
//!
//! Everything needed to run coordinators and responders without sockets:
//!
//! - [`memory_pair`]: connected in-memory channels, usable across threads
//! - [`EchoingChannel`]: fault injector that replays our own writes back to us
//! - [`LoopbackChannel`]: serves a [`Responder`](tallyframe_core::Responder)
//!   inline, so a coordinator can be driven from a single thread
//! - [`Cluster`]: a coordinator and its responders on their own threads
//! - [`Dataset`]: seeded, reproducible initial records spread across stores
//!
//! # Model-Based Testing
//!
//! The `model` module holds a reference implementation of the search and
//! re-homing rules built from plain maps and linear scans. Operations are
//! applied to both the model and a real coordinator, and their outcomes and
//! final stores are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod channel;
pub mod cluster;
pub mod dataset;
pub mod model;

pub use channel::{EchoingChannel, LoopbackChannel, MemoryChannel, memory_pair};
pub use cluster::{Cluster, ClusterOptions, ClusterReport};
pub use dataset::{Dataset, DatasetShape};
pub use model::{ModelWorld, ObservableState, Operation};

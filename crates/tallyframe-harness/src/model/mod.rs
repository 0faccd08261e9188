//! Reference model for model-based testing.
//!
//! The model restates the coordinator's search rules over plain maps with
//! linear scans and no wire format. It is the oracle the real coordinator and
//! responders are checked against.
//!
//! # Design Principles
//!
//! - Obviously correct: every rule is a direct scan, no range tricks
//! - No transport: remote stores are just more maps
//! - Deterministic: same dataset and operations, same result

pub mod operation;
mod world;

pub use operation::Operation;
pub use world::{ModelWorld, ObservableState};

//! Test helpers shared across crates.
//!
//! This crate provides an observer that records change events and builders
//! for the layered fixtures most tests start from.

pub mod fixtures;
pub mod observer;

pub use fixtures::{nested_fixture, web_node_json};
pub use observer::RecordingObserver;

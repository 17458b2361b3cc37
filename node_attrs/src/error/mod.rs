//! Error types produced by the attribute engine.

mod constructors;
mod types;

pub use types::AttributeError;

//! Library interface for the `attr-inspect` tool.
//!
//! The binary loads a stored node, then prints its merged attributes, a
//! per-layer trace of one path, or the document after a single write.
//! Commands write to any [`std::io::Write`] so they can be driven in tests.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

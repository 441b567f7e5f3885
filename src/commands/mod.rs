//! Command implementations for the gridiron-proj CLI
//!
//! Each handler opens an engine over the stored profiles and book, runs one
//! engine operation, saves the book when it changed and prints the result as
//! text or, with `--json`, as pretty JSON on stdout.

pub mod baseline;
pub mod common;
pub mod overrides;
pub mod reconcile;
pub mod scenarios;
pub mod variance;


pub use common::CommandContext;

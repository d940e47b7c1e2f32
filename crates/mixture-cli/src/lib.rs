//! Library half of the `mixture` command line tool
//!
//! Exposed so the subcommands can be driven from integration tests without spawning a
//! process.

pub mod commands;
pub mod document;

pub use commands::{Encoding, ReportFormat, ValidationOutcome};
pub use document::{CompositionDocument, LoadedDocument};

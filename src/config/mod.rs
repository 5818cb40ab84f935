//! Configuration module for pocket-ledger
//!
//! - Path resolution for the data directory
//! - Runtime settings kept in the record store

pub mod paths;
pub mod settings;

pub use paths::LedgerPaths;
pub use settings::{DateFormat, Settings};

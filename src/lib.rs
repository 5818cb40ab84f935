//! pocket-ledger - personal finance ledger
//!
//! This library provides the core of the `pocket` command: accounts in any
//! currency, a category tree, payees with defaults, transactions and
//! transfer pairs, duplicate-aware CSV import and tracked exports.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Data directory resolution and runtime settings
//! - `error`: Custom error types
//! - `models`: Core data models (accounts, transactions, categories, etc.)
//! - `storage`: JSON file storage layer with all-or-nothing writes
//! - `services`: Business logic layer
//! - `export`: CSV, JSON and YAML renderers for transactions
//! - `display`: Terminal formatting
//! - `cli`: Command handlers for the `pocket` binary
//!
//! # Example
//!
//! ```rust,no_run
//! use pocket_ledger::config::LedgerPaths;
//! use pocket_ledger::models::Money;
//! use pocket_ledger::services::AccountService;
//! use pocket_ledger::storage::Storage;
//!
//! # fn main() -> Result<(), pocket_ledger::LedgerError> {
//! let mut storage = Storage::new(LedgerPaths::new()?)?;
//! storage.load_all()?;
//! let account =
//!     AccountService::new(&storage).create("Checking", Some("EUR"), Money::zero(), None)?;
//! println!("created {}", account.id);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{LedgerError, LedgerResult};

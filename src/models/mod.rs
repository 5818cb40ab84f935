//! Core data models for pocket-ledger
//!
//! This module contains the records the ledger stores: accounts, categories,
//! payees, transactions (including transfer legs) and export manifests, plus
//! the `Money` and id value types they share.

pub mod account;
pub mod category;
pub mod ids;
pub mod manifest;
pub mod money;
pub mod payee;
pub mod payment;
pub mod transaction;

pub use account::Account;
pub use category::{Category, FlowType};
pub use ids::{AccountId, CategoryId, ManifestId, PayeeId, TransactionId, TransferId};
pub use manifest::{ExportFormat, ExportManifest};
pub use money::{Money, MoneyParseError, PreciseAmount};
pub use payee::Payee;
pub use payment::PaymentMethod;
pub use transaction::Transaction;

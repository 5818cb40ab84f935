//! Custom error types for pocket-ledger
//!
//! This module defines the error hierarchy for the ledger using thiserror.
//! Variants fall into the classes callers care about: validation problems
//! (rejected before any write), missing records, consistency violations
//! found in stored data, unique-key conflicts, and infrastructure failures.

use thiserror::Error;

/// The main error type for pocket-ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// CSV reading/writing errors
    #[error("CSV error: {0}")]
    Csv(String),

    /// Validation errors for input data
    #[error("Validation error: {0}")]
    Validation(String),

    /// A transfer request that can never be satisfied (e.g. same account on both legs)
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Unique key collision
    #[error("{entity_type} already exists: {identifier}")]
    Conflict {
        entity_type: &'static str,
        identifier: String,
    },

    /// One leg of a transfer exists without its sibling
    #[error("Transfer {transfer_id} is missing its sibling leg (found only {transaction_id})")]
    OrphanedTransferLeg {
        transaction_id: String,
        transfer_id: String,
    },

    /// Stored data violates a ledger invariant
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Import errors
    #[error("Import error: {0}")]
    Import(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Create a "not found" error for accounts
    pub fn account_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Account",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for payees
    pub fn payee_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Payee",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for export manifests
    pub fn manifest_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Export manifest",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidTransfer(_))
    }

    /// Check if this is a consistency error
    pub fn is_consistency(&self) -> bool {
        matches!(
            self,
            Self::OrphanedTransferLeg { .. } | Self::Consistency(_)
        )
    }

    /// Check if this is a unique-key conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<serde_yaml::Error> for LedgerError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Export(format!("YAML serialization failed: {}", err))
    }
}

impl From<csv::Error> for LedgerError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

/// Result type alias for pocket-ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = LedgerError::account_not_found("Checking");
        assert_eq!(err.to_string(), "Account not found: Checking");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_orphaned_leg_is_consistency_error() {
        let err = LedgerError::OrphanedTransferLeg {
            transaction_id: "txn-1234abcd".into(),
            transfer_id: "xfer-9876fedc".into(),
        };
        assert!(err.is_consistency());
        assert!(!err.is_validation());
        assert_eq!(
            err.to_string(),
            "Transfer xfer-9876fedc is missing its sibling leg (found only txn-1234abcd)"
        );
    }

    #[test]
    fn test_invalid_transfer_is_validation() {
        let err = LedgerError::InvalidTransfer("same account".into());
        assert!(err.is_validation());
    }

    #[test]
    fn test_conflict_display() {
        let err = LedgerError::Conflict {
            entity_type: "Payee",
            identifier: "Landlord".into(),
        };
        assert!(err.is_conflict());
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "Payee already exists: Landlord");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let ledger_err: LedgerError = io_err.into();
        assert!(matches!(ledger_err, LedgerError::Io(_)));
    }
}

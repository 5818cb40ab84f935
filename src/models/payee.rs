//! Payee model
//!
//! Payees are advisory records used to prefill new transactions. The name is
//! the identity key and is compared exactly, so "Landlord" and "landlord" are
//! two different payees. Transactions carry payee text, not a payee id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, PayeeId};
use super::payment::PaymentMethod;

/// A payee with optional prefill defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payee {
    /// Unique identifier
    pub id: PayeeId,

    /// Payee name (unique, case-sensitive)
    pub name: String,

    /// Category suggested for new transactions with this payee.
    /// Not enforced: the category may have been deleted since.
    pub default_category_id: Option<CategoryId>,

    /// Payment method suggested for new transactions with this payee
    pub default_payment_type: Option<PaymentMethod>,

    /// When the payee was created
    pub created_at: DateTime<Utc>,

    /// When the payee was last modified
    pub updated_at: DateTime<Utc>,
}

impl Payee {
    /// Create a new payee
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: PayeeId::new(),
            name: name.into(),
            default_category_id: None,
            default_payment_type: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a payee with a default category
    pub fn with_default_category(name: impl Into<String>, category_id: CategoryId) -> Self {
        let mut payee = Self::new(name);
        payee.default_category_id = Some(category_id);
        payee
    }

    /// Set or clear the default category
    pub fn set_default_category(&mut self, category_id: Option<CategoryId>) {
        self.default_category_id = category_id;
        self.updated_at = Utc::now();
    }

    /// Set or clear the default payment method
    pub fn set_default_payment_type(&mut self, payment_type: Option<PaymentMethod>) {
        self.default_payment_type = payment_type;
        self.updated_at = Utc::now();
    }

    /// Check if a transaction's payee text belongs to this payee
    pub fn matches_name(&self, name: &str) -> bool {
        self.name == name
    }

    /// Validate the payee
    pub fn validate(&self) -> Result<(), PayeeValidationError> {
        if self.name.trim().is_empty() {
            return Err(PayeeValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(PayeeValidationError::NameTooLong(self.name.len()));
        }

        Ok(())
    }
}

impl fmt::Display for Payee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validation errors for payees
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayeeValidationError {
    EmptyName,
    NameTooLong(usize),
}

impl fmt::Display for PayeeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Payee name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Payee name too long ({} chars, max 100)", len)
            }
        }
    }
}

impl std::error::Error for PayeeValidationError {}

//! Account model
//!
//! Represents a currency-tagged account. The current balance is never stored;
//! it is derived from the initial balance and the account's transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AccountId;
use super::money::Money;

/// A financial account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,

    /// Account name (e.g., "Girokonto")
    pub name: String,

    /// Free-form currency code (e.g., "EUR"); not checked against ISO 4217
    pub currency: String,

    /// Balance before the first recorded transaction
    pub initial_balance: Money,

    /// Notes about this account
    #[serde(default)]
    pub notes: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last modified
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with a zero initial balance
    pub fn new(name: impl Into<String>, currency: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            name: name.into(),
            currency: currency.into(),
            initial_balance: Money::zero(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new account with an initial balance
    pub fn with_initial_balance(
        name: impl Into<String>,
        currency: impl Into<String>,
        initial_balance: Money,
    ) -> Self {
        let mut account = Self::new(name, currency);
        account.initial_balance = initial_balance;
        account
    }

    /// Change the currency code
    pub fn set_currency(&mut self, currency: impl Into<String>) {
        self.currency = currency.into();
        self.updated_at = Utc::now();
    }

    /// Validate the account
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        if self.name.trim().is_empty() {
            return Err(AccountValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(AccountValidationError::NameTooLong(self.name.len()));
        }

        if self.currency.trim().is_empty() {
            return Err(AccountValidationError::EmptyCurrency);
        }

        Ok(())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.currency)
    }
}

/// Validation errors for accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyName,
    NameTooLong(usize),
    EmptyCurrency,
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Account name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Account name too long ({} chars, max 100)", len)
            }
            Self::EmptyCurrency => write!(f, "Account currency cannot be empty"),
        }
    }
}

impl std::error::Error for AccountValidationError {}

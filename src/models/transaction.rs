//! Transaction model
//!
//! A signed amount on one account. Two transactions sharing a `transfer_id`
//! form a transfer: the negative leg on the source account and the positive
//! leg on the target account. The pair is maintained by
//! `services::transfer`; nothing else should create or rewrite legs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, CategoryId, ManifestId, TransactionId, TransferId};
use super::money::Money;
use super::payment::PaymentMethod;

/// A financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    /// The account this transaction belongs to
    pub account_id: AccountId,

    /// Transaction date
    pub date: NaiveDate,

    /// Payee text. Free-form, matched against payee names only by equality.
    #[serde(default)]
    pub payee: String,

    /// Amount (positive for inflow, negative for outflow)
    pub amount: Money,

    /// Category, if any. May dangle after the category is deleted.
    pub category_id: Option<CategoryId>,

    /// How the transaction was settled
    #[serde(default)]
    pub payment_type: PaymentMethod,

    /// Memo/notes
    #[serde(default)]
    pub memo: String,

    /// Correlation key shared with exactly one sibling leg
    #[serde(default)]
    pub transfer_id: Option<TransferId>,

    /// Set together with `export_manifest_id` by the export tracker
    #[serde(default)]
    pub exported: bool,

    /// Manifest this transaction was last exported in
    #[serde(default)]
    pub export_manifest_id: Option<ManifestId>,

    /// When the transaction was created
    pub created_at: DateTime<Utc>,

    /// When the transaction was last modified
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(account_id: AccountId, date: NaiveDate, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            account_id,
            date,
            payee: String::new(),
            amount,
            category_id: None,
            payment_type: PaymentMethod::Unspecified,
            memo: String::new(),
            transfer_id: None,
            exported: false,
            export_manifest_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a transaction with all common fields
    pub fn with_details(
        account_id: AccountId,
        date: NaiveDate,
        amount: Money,
        payee: impl Into<String>,
        category_id: Option<CategoryId>,
        memo: impl Into<String>,
    ) -> Self {
        let mut txn = Self::new(account_id, date, amount);
        txn.payee = payee.into();
        txn.category_id = category_id;
        txn.memo = memo.into();
        txn
    }

    /// Check if this is one leg of a transfer
    pub fn is_transfer(&self) -> bool {
        self.transfer_id.is_some()
    }

    /// Check if this is an inflow (positive amount)
    pub fn is_inflow(&self) -> bool {
        self.amount.is_positive()
    }

    /// Check if this is an outflow (negative amount)
    pub fn is_outflow(&self) -> bool {
        self.amount.is_negative()
    }

    /// Mark as exported in the given manifest
    pub fn mark_exported(&mut self, manifest_id: ManifestId) {
        self.exported = true;
        self.export_manifest_id = Some(manifest_id);
        self.updated_at = Utc::now();
    }

    /// Drop the exported state
    pub fn clear_export(&mut self) {
        self.exported = false;
        self.export_manifest_id = None;
        self.updated_at = Utc::now();
    }

    /// Touch the modification timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.exported != self.export_manifest_id.is_some() {
            return Err(TransactionValidationError::ExportStateMismatch);
        }

        if self.payee.len() > 200 {
            return Err(TransactionValidationError::PayeeTooLong(self.payee.len()));
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.date.format("%Y-%m-%d"),
            if self.payee.is_empty() {
                "(no payee)"
            } else {
                &self.payee
            },
            self.amount
        )
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    ExportStateMismatch,
    PayeeTooLong(usize),
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExportStateMismatch => {
                write!(f, "Exported flag and manifest reference must be set together")
            }
            Self::PayeeTooLong(len) => write!(f, "Payee too long ({} chars, max 200)", len),
        }
    }
}

impl std::error::Error for TransactionValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    #[test]
    fn test_new_transaction() {
        let account_id = AccountId::new();
        let txn = Transaction::new(account_id, test_date(), Money::from_cents(-5000));

        assert_eq!(txn.account_id, account_id);
        assert_eq!(txn.amount.cents(), -5000);
        assert!(txn.is_outflow());
        assert!(!txn.is_transfer());
        assert!(!txn.exported);
        assert_eq!(txn.payment_type, PaymentMethod::Unspecified);
    }

    #[test]
    fn test_with_details() {
        let category_id = CategoryId::new();
        let txn = Transaction::with_details(
            AccountId::new(),
            test_date(),
            Money::from_cents(-120000),
            "Landlord",
            Some(category_id),
            "January rent",
        );
        assert_eq!(txn.payee, "Landlord");
        assert_eq!(txn.category_id, Some(category_id));
        assert_eq!(txn.memo, "January rent");
    }

    #[test]
    fn test_export_state() {
        let mut txn = Transaction::new(AccountId::new(), test_date(), Money::from_cents(100));
        let manifest_id = ManifestId::new();

        txn.mark_exported(manifest_id);
        assert!(txn.exported);
        assert_eq!(txn.export_manifest_id, Some(manifest_id));
        assert!(txn.validate().is_ok());

        txn.clear_export();
        assert!(!txn.exported);
        assert!(txn.export_manifest_id.is_none());
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_half_set_export_state_is_invalid() {
        let mut txn = Transaction::new(AccountId::new(), test_date(), Money::from_cents(100));
        txn.exported = true;
        assert_eq!(
            txn.validate(),
            Err(TransactionValidationError::ExportStateMismatch)
        );

        txn.exported = false;
        txn.export_manifest_id = Some(ManifestId::new());
        assert_eq!(
            txn.validate(),
            Err(TransactionValidationError::ExportStateMismatch)
        );
    }

    #[test]
    fn test_serialization_keeps_payment_code() {
        let mut txn = Transaction::new(AccountId::new(), test_date(), Money::from_cents(-2500));
        txn.payment_type = PaymentMethod::CreditCard;
        txn.transfer_id = Some(TransferId::new());

        let json = serde_json::to_value(&txn).unwrap();
        assert_eq!(json["payment_type"], 3);
        assert_eq!(json["date"], "2024-01-05");

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back.transfer_id, txn.transfer_id);
        assert_eq!(back.amount, txn.amount);
    }
}

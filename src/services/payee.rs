//! Payee service
//!
//! Payees are advisory records: a unique name plus optional defaults that
//! prefill new transactions. Transactions carry payee text, not a payee id,
//! so renaming or deleting a payee never touches transactions.

use std::collections::HashSet;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{CategoryId, PaymentMethod, Payee, PayeeId};
use crate::storage::Storage;

use super::duplicates::DuplicateService;

/// Service for payee management
pub struct PayeeService<'a> {
    storage: &'a Storage,
}

/// Outcome of a bulk payee import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayeeImportResult {
    pub created: usize,
    pub duplicates_skipped: usize,
}

fn conflict(name: &str) -> LedgerError {
    LedgerError::Conflict {
        entity_type: "Payee",
        identifier: name.to_string(),
    }
}

impl<'a> PayeeService<'a> {
    /// Create a new payee service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new payee
    pub fn create(
        &self,
        name: &str,
        default_category_id: Option<CategoryId>,
        default_payment_type: Option<PaymentMethod>,
    ) -> LedgerResult<Payee> {
        let mut payee = Payee::new(name.trim());
        payee.default_category_id = default_category_id;
        payee.default_payment_type = default_payment_type;
        payee
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        self.storage.transaction(|s| {
            if s.payees.name_exists(&payee.name, None)? {
                return Err(conflict(&payee.name));
            }
            if let Some(category_id) = default_category_id {
                if !s.categories.exists(category_id)? {
                    return Err(LedgerError::category_not_found(category_id.to_string()));
                }
            }
            s.payees.upsert(payee.clone())
        })?;

        tracing::info!(payee_id = %payee.id, name = %payee.name, "payee created");
        Ok(payee)
    }

    /// Get a payee by ID
    pub fn get(&self, id: PayeeId) -> LedgerResult<Payee> {
        self.storage
            .payees
            .get(id)?
            .ok_or_else(|| LedgerError::payee_not_found(id.to_string()))
    }

    /// Get a payee by exact name
    pub fn get_by_name(&self, name: &str) -> LedgerResult<Option<Payee>> {
        self.storage.payees.get_by_name(name)
    }

    /// Find a payee by exact name, full ID or short ID
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Payee>> {
        if let Some(payee) = self.storage.payees.get_by_name(identifier)? {
            return Ok(Some(payee));
        }
        if let Ok(id) = identifier.parse::<PayeeId>() {
            return self.storage.payees.get(id);
        }
        Ok(self
            .storage
            .payees
            .get_all()?
            .into_iter()
            .find(|p| p.id.short() == identifier))
    }

    /// All payees, sorted by name
    pub fn list(&self) -> LedgerResult<Vec<Payee>> {
        self.storage.payees.get_all()
    }

    /// Rename a payee
    pub fn rename(&self, id: PayeeId, new_name: &str) -> LedgerResult<Payee> {
        let new_name = new_name.trim();

        let payee = self.storage.transaction(|s| {
            let mut payee = s
                .payees
                .get(id)?
                .ok_or_else(|| LedgerError::payee_not_found(id.to_string()))?;
            if s.payees.name_exists(new_name, Some(id))? {
                return Err(conflict(new_name));
            }

            payee.name = new_name.to_string();
            payee.updated_at = chrono::Utc::now();
            payee
                .validate()
                .map_err(|e| LedgerError::Validation(e.to_string()))?;
            s.payees.upsert(payee.clone())?;
            Ok(payee)
        })?;

        tracing::info!(payee_id = %id, name = %payee.name, "payee renamed");
        Ok(payee)
    }

    /// Set or clear defaults; `None` leaves a default as it is
    pub fn set_defaults(
        &self,
        id: PayeeId,
        category_id: Option<Option<CategoryId>>,
        payment_type: Option<Option<PaymentMethod>>,
    ) -> LedgerResult<Payee> {
        let payee = self.storage.transaction(|s| {
            let mut payee = s
                .payees
                .get(id)?
                .ok_or_else(|| LedgerError::payee_not_found(id.to_string()))?;

            if let Some(category_id) = category_id {
                if let Some(cat_id) = category_id {
                    if !s.categories.exists(cat_id)? {
                        return Err(LedgerError::category_not_found(cat_id.to_string()));
                    }
                }
                payee.set_default_category(category_id);
            }
            if let Some(payment_type) = payment_type {
                payee.set_default_payment_type(payment_type);
            }

            s.payees.upsert(payee.clone())?;
            Ok(payee)
        })?;

        tracing::info!(payee_id = %id, "payee defaults updated");
        Ok(payee)
    }

    /// Delete a payee
    pub fn delete(&self, id: PayeeId) -> LedgerResult<Payee> {
        let payee = self.storage.transaction(|s| {
            let payee = s
                .payees
                .get(id)?
                .ok_or_else(|| LedgerError::payee_not_found(id.to_string()))?;
            s.payees.delete(id)?;
            Ok(payee)
        })?;

        tracing::info!(payee_id = %id, name = %payee.name, "payee deleted");
        Ok(payee)
    }

    /// Create payees in bulk
    ///
    /// Names that already exist (exactly) or repeat within the batch are
    /// skipped when `skip_duplicates` is set; otherwise the first one fails
    /// the whole import with a conflict and nothing is written. Blank names
    /// are ignored.
    pub fn import_payees(
        &self,
        names: &[String],
        skip_duplicates: bool,
    ) -> LedgerResult<PayeeImportResult> {
        let names: Vec<String> = names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();

        let result = self.storage.transaction(|s| {
            let existing: HashSet<usize> = DuplicateService::new(s)
                .check_payees(&names)?
                .into_iter()
                .collect();

            let mut seen = HashSet::new();
            let mut result = PayeeImportResult::default();
            for (i, name) in names.iter().enumerate() {
                let duplicate = existing.contains(&i) || !seen.insert(name.as_str());
                if duplicate {
                    if !skip_duplicates {
                        return Err(conflict(name));
                    }
                    result.duplicates_skipped += 1;
                    continue;
                }

                let payee = Payee::new(name.as_str());
                payee
                    .validate()
                    .map_err(|e| LedgerError::Validation(e.to_string()))?;
                s.payees.upsert(payee)?;
                result.created += 1;
            }
            Ok(result)
        })?;

        tracing::info!(
            created = result.created,
            skipped = result.duplicates_skipped,
            "payees imported"
        );
        Ok(result)
    }

    /// Count payees
    pub fn count(&self) -> LedgerResult<usize> {
        self.storage.payees.count()
    }
}

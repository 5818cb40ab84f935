//! Account service
//!
//! Provides business logic for account management including CRUD operations,
//! cascading deletes and bulk currency renames.

use std::collections::HashSet;

use crate::config::Settings;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Account, AccountId, Money, TransactionId};
use crate::storage::Storage;

/// Service for account management
pub struct AccountService<'a> {
    storage: &'a Storage,
}

/// Changes to an account; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub initial_balance: Option<Money>,
    pub notes: Option<String>,
}

/// What an account deletion removed
#[derive(Debug, Clone)]
pub struct DeletedAccount {
    pub account: Account,
    /// The account's own transactions
    pub transactions_removed: usize,
    /// Sibling legs on other accounts of transfers that touched this one
    pub transfer_legs_removed: usize,
}

impl<'a> AccountService<'a> {
    /// Create a new account service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new account
    ///
    /// Without a currency the `default_currency` setting is used.
    pub fn create(
        &self,
        name: &str,
        currency: Option<&str>,
        initial_balance: Money,
        notes: Option<&str>,
    ) -> LedgerResult<Account> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation(
                "Account name cannot be empty".into(),
            ));
        }

        let currency = match currency.map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => Settings::load(self.storage)?.default_currency,
        };

        let mut account = Account::with_initial_balance(name, currency, initial_balance);
        if let Some(notes) = notes {
            account.notes = notes.to_string();
        }
        account
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        self.storage.transaction(|s| {
            if s.accounts.name_exists(name, None)? {
                return Err(LedgerError::Conflict {
                    entity_type: "Account",
                    identifier: name.to_string(),
                });
            }
            s.accounts.upsert(account.clone())
        })?;

        tracing::info!(
            account_id = %account.id,
            name = %account.name,
            currency = %account.currency,
            "account created"
        );
        Ok(account)
    }

    /// Get an account by ID
    pub fn get(&self, id: AccountId) -> LedgerResult<Account> {
        self.storage
            .accounts
            .get(id)?
            .ok_or_else(|| LedgerError::account_not_found(id.to_string()))
    }

    /// Find an account by name, full ID or short ID
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Account>> {
        if let Some(account) = self.storage.accounts.get_by_name(identifier)? {
            return Ok(Some(account));
        }
        if let Ok(id) = identifier.parse::<AccountId>() {
            return self.storage.accounts.get(id);
        }
        Ok(self
            .storage
            .accounts
            .get_all()?
            .into_iter()
            .find(|a| a.id.short() == identifier))
    }

    /// All accounts, sorted by name
    pub fn list(&self) -> LedgerResult<Vec<Account>> {
        self.storage.accounts.get_all()
    }

    /// Update an account
    pub fn update(&self, id: AccountId, changes: AccountChanges) -> LedgerResult<Account> {
        let account = self.storage.transaction(|s| {
            let mut account = s
                .accounts
                .get(id)?
                .ok_or_else(|| LedgerError::account_not_found(id.to_string()))?;

            if let Some(name) = &changes.name {
                let name = name.trim();
                if s.accounts.name_exists(name, Some(id))? {
                    return Err(LedgerError::Conflict {
                        entity_type: "Account",
                        identifier: name.to_string(),
                    });
                }
                account.name = name.to_string();
            }
            if let Some(currency) = &changes.currency {
                account.set_currency(currency.trim());
            }
            if let Some(initial_balance) = changes.initial_balance {
                account.initial_balance = initial_balance;
            }
            if let Some(notes) = &changes.notes {
                account.notes.clone_from(notes);
            }

            account.updated_at = chrono::Utc::now();
            account
                .validate()
                .map_err(|e| LedgerError::Validation(e.to_string()))?;
            s.accounts.upsert(account.clone())?;
            Ok(account)
        })?;

        tracing::info!(account_id = %account.id, "account updated");
        Ok(account)
    }

    /// Delete an account with its transactions
    ///
    /// Transfers touching the account lose both legs, so no orphan is left
    /// on the other side.
    pub fn delete(&self, id: AccountId) -> LedgerResult<DeletedAccount> {
        let deleted = self.storage.transaction(|s| {
            let account = s
                .accounts
                .get(id)?
                .ok_or_else(|| LedgerError::account_not_found(id.to_string()))?;

            let own = s.transactions.get_by_account(id)?;
            let own_ids: HashSet<TransactionId> = own.iter().map(|t| t.id).collect();

            let mut siblings = Vec::new();
            for txn in &own {
                if let Some(transfer_id) = txn.transfer_id {
                    for leg in s.transactions.get_by_transfer(transfer_id)? {
                        if !own_ids.contains(&leg.id) && !siblings.contains(&leg.id) {
                            siblings.push(leg.id);
                        }
                    }
                }
            }

            for txn_id in own_ids.iter().chain(siblings.iter()) {
                s.transactions.delete(*txn_id)?;
            }
            s.accounts.delete(id)?;

            Ok(DeletedAccount {
                account,
                transactions_removed: own_ids.len(),
                transfer_legs_removed: siblings.len(),
            })
        })?;

        tracing::info!(
            account_id = %id,
            transactions = deleted.transactions_removed,
            transfer_legs = deleted.transfer_legs_removed,
            "account deleted"
        );
        Ok(deleted)
    }

    /// Rename a currency code on every account that uses it
    ///
    /// Returns the number of accounts changed. Amounts are not converted.
    pub fn rename_currency(&self, old: &str, new: &str) -> LedgerResult<usize> {
        let (old, new) = (old.trim(), new.trim());
        if old.is_empty() || new.is_empty() {
            return Err(LedgerError::Validation(
                "Currency codes cannot be empty".into(),
            ));
        }

        let changed = self.storage.transaction(|s| {
            let accounts = s.accounts.get_by_currency(old)?;
            let count = accounts.len();
            for mut account in accounts {
                account.set_currency(new);
                s.accounts.upsert(account)?;
            }
            Ok(count)
        })?;

        tracing::info!(old = %old, new = %new, accounts = changed, "currency renamed");
        Ok(changed)
    }

    /// Count all accounts
    pub fn count(&self) -> LedgerResult<usize> {
        self.storage.accounts.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use crate::models::Transaction;
    use crate::services::transfer::{CreateTransfer, TransferService};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    #[test]
    fn test_create_account() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage);

        let account = service
            .create("Checking", Some("USD"), Money::from_cents(100000), Some("main"))
            .unwrap();

        assert_eq!(account.name, "Checking");
        assert_eq!(account.currency, "USD");
        assert_eq!(account.initial_balance.cents(), 100000);
        assert_eq!(account.notes, "main");
    }

    #[test]
    fn test_create_uses_default_currency() {
        let (_temp_dir, storage) = create_test_storage();
        Settings::set(&storage, "default_currency", "CHF").unwrap();

        let account = AccountService::new(&storage)
            .create("Konto", None, Money::zero(), None)
            .unwrap();
        assert_eq!(account.currency, "CHF");
    }

    #[test]
    fn test_duplicate_name_is_conflict() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage);
        service.create("Checking", None, Money::zero(), None).unwrap();

        let err = service
            .create("checking", None, Money::zero(), None)
            .unwrap_err();
        assert!(err.is_conflict());

        let err = service.create("  ", None, Money::zero(), None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_update_account() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage);
        let account = service.create("Checking", None, Money::zero(), None).unwrap();
        service.create("Savings", None, Money::zero(), None).unwrap();

        let updated = service
            .update(
                account.id,
                AccountChanges {
                    name: Some("Main".into()),
                    initial_balance: Some(Money::from_cents(500)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Main");
        assert_eq!(updated.initial_balance.cents(), 500);

        let err = service
            .update(
                account.id,
                AccountChanges {
                    name: Some("SAVINGS".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_find_by_name_or_id() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage);
        let account = service.create("Checking", None, Money::zero(), None).unwrap();

        assert_eq!(service.find("checking").unwrap().unwrap().id, account.id);
        assert_eq!(service.find(&account.id.to_string()).unwrap().unwrap().id, account.id);
        assert_eq!(service.find(&account.id.short()).unwrap().unwrap().id, account.id);
        assert!(service.find("nope").unwrap().is_none());
    }

    #[test]
    fn test_delete_cascades_transfers() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage);
        let a = service.create("A", None, Money::zero(), None).unwrap();
        let b = service.create("B", None, Money::zero(), None).unwrap();

        let plain = Transaction::new(a.id, date(), Money::from_cents(-50));
        let kept = Transaction::new(b.id, date(), Money::from_cents(70));
        storage
            .transaction(|s| {
                s.transactions.upsert(plain)?;
                s.transactions.upsert(kept.clone())
            })
            .unwrap();
        TransferService::new(&storage)
            .create(CreateTransfer::new(a.id, b.id, Money::from_cents(100), date()))
            .unwrap();

        let deleted = service.delete(a.id).unwrap();
        assert_eq!(deleted.transactions_removed, 2);
        assert_eq!(deleted.transfer_legs_removed, 1);

        let remaining = storage.transactions.get_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept.id);
        assert!(service.get(a.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_rename_currency() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage);
        service.create("A", Some("DM"), Money::zero(), None).unwrap();
        service.create("B", Some("DM"), Money::zero(), None).unwrap();
        service.create("C", Some("USD"), Money::zero(), None).unwrap();

        assert_eq!(service.rename_currency("DM", "EUR").unwrap(), 2);
        assert_eq!(storage.accounts.get_by_currency("EUR").unwrap().len(), 2);
        assert_eq!(storage.accounts.get_by_currency("DM").unwrap().len(), 0);
        assert_eq!(service.rename_currency("XYZ", "EUR").unwrap(), 0);
        assert!(service.rename_currency("EUR", " ").unwrap_err().is_validation());
    }
}

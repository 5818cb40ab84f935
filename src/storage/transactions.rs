//! Transaction repository for JSON storage
//!
//! Manages loading and saving transactions to transactions.json. Keeps two
//! secondary indexes: by account, for balances and per-account listings, and
//! by transfer id, so a leg's sibling is found without scanning.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::error::LedgerError;
use crate::models::{AccountId, ManifestId, Transaction, TransactionId, TransferId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable transaction data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransactionData {
    transactions: Vec<Transaction>,
}

/// Repository for transaction persistence with indexing
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
    /// Index: account_id -> transaction_ids
    by_account: RwLock<HashMap<AccountId, Vec<TransactionId>>>,
    /// Index: transfer_id -> leg ids
    by_transfer: RwLock<HashMap<TransferId, Vec<TransactionId>>>,
}

/// Newest first, ties broken by creation time then id
fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then(b.created_at.cmp(&a.created_at))
            .then(a.id.cmp(&b.id))
    });
}

fn unindex(
    txn: &Transaction,
    by_account: &mut HashMap<AccountId, Vec<TransactionId>>,
    by_transfer: &mut HashMap<TransferId, Vec<TransactionId>>,
) {
    if let Some(ids) = by_account.get_mut(&txn.account_id) {
        ids.retain(|&id| id != txn.id);
        if ids.is_empty() {
            by_account.remove(&txn.account_id);
        }
    }
    if let Some(transfer_id) = txn.transfer_id {
        if let Some(ids) = by_transfer.get_mut(&transfer_id) {
            ids.retain(|&id| id != txn.id);
            if ids.is_empty() {
                by_transfer.remove(&transfer_id);
            }
        }
    }
}

fn index(
    txn: &Transaction,
    by_account: &mut HashMap<AccountId, Vec<TransactionId>>,
    by_transfer: &mut HashMap<TransferId, Vec<TransactionId>>,
) {
    by_account.entry(txn.account_id).or_default().push(txn.id);
    if let Some(transfer_id) = txn.transfer_id {
        by_transfer.entry(transfer_id).or_default().push(txn.id);
    }
}

impl TransactionRepository {
    /// Create a new transaction repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_account: RwLock::new(HashMap::new()),
            by_transfer: RwLock::new(HashMap::new()),
        }
    }

    /// Load transactions from disk and build indexes
    pub fn load(&self) -> Result<(), LedgerError> {
        let file_data: TransactionData = read_json(&self.path)?;
        self.restore(file_data.transactions)
    }

    /// Save transactions to disk
    pub fn save(&self) -> Result<(), LedgerError> {
        let file_data = TransactionData {
            transactions: self.get_all()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    /// Copy of every stored transaction
    pub fn snapshot(&self) -> Result<Vec<Transaction>, LedgerError> {
        self.get_all()
    }

    /// Replace the in-memory contents and rebuild both indexes
    pub fn restore(&self, transactions: Vec<Transaction>) -> Result<(), LedgerError> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_account = self.by_account.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_transfer = self.by_transfer.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        by_account.clear();
        by_transfer.clear();

        for txn in transactions {
            index(&txn, &mut by_account, &mut by_transfer);
            data.insert(txn.id, txn);
        }

        Ok(())
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> Result<Option<Transaction>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// Get all transactions, newest first
    pub fn get_all(&self) -> Result<Vec<Transaction>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut transactions: Vec<_> = data.values().cloned().collect();
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }

    /// Get transactions for an account, newest first
    pub fn get_by_account(&self, account_id: AccountId) -> Result<Vec<Transaction>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        let by_account = self.by_account.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let ids = by_account.get(&account_id).map(|v| v.as_slice()).unwrap_or(&[]);
        let mut transactions: Vec<_> = ids.iter().filter_map(|id| data.get(id).cloned()).collect();
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }

    /// Every row carrying the given transfer id, in no particular order
    pub fn get_by_transfer(
        &self,
        transfer_id: TransferId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        let by_transfer = self.by_transfer.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let ids = by_transfer.get(&transfer_id).map(|v| v.as_slice()).unwrap_or(&[]);
        Ok(ids.iter().filter_map(|id| data.get(id).cloned()).collect())
    }

    /// Every transfer id with the ids of the rows sharing it
    pub fn transfer_groups(&self) -> Result<Vec<(TransferId, Vec<TransactionId>)>, LedgerError> {
        let by_transfer = self.by_transfer.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut groups: Vec<_> = by_transfer
            .iter()
            .map(|(transfer_id, ids)| (*transfer_id, ids.clone()))
            .collect();
        groups.sort_by_key(|(transfer_id, _)| *transfer_id);
        Ok(groups)
    }

    /// Transactions exported in the given manifest
    pub fn get_by_manifest(
        &self,
        manifest_id: ManifestId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|t| t.export_manifest_id == Some(manifest_id))
            .collect())
    }

    /// Get transactions in an inclusive date range
    pub fn get_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|t| t.date >= start && t.date <= end)
            .collect())
    }

    /// Insert or update a transaction
    pub fn upsert(&self, txn: Transaction) -> Result<(), LedgerError> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_account = self.by_account.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_transfer = self.by_transfer.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if let Some(old) = data.get(&txn.id) {
            unindex(old, &mut by_account, &mut by_transfer);
        }
        index(&txn, &mut by_account, &mut by_transfer);

        data.insert(txn.id, txn);
        Ok(())
    }

    /// Delete a transaction
    pub fn delete(&self, id: TransactionId) -> Result<bool, LedgerError> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_account = self.by_account.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_transfer = self.by_transfer.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if let Some(txn) = data.remove(&id) {
            unindex(&txn, &mut by_account, &mut by_transfer);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Count transactions
    pub fn count(&self) -> Result<usize, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, TransactionRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("transactions.json");
        let repo = TransactionRepository::new(path);
        (temp_dir, repo)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_get_by_account() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let account1 = AccountId::new();
        let account2 = AccountId::new();

        repo.upsert(Transaction::new(account1, date(15), Money::from_cents(-100)))
            .unwrap();
        repo.upsert(Transaction::new(account1, date(16), Money::from_cents(-200)))
            .unwrap();
        repo.upsert(Transaction::new(account2, date(15), Money::from_cents(-300)))
            .unwrap();

        let account1_txns = repo.get_by_account(account1).unwrap();
        assert_eq!(account1_txns.len(), 2);
        assert_eq!(account1_txns[0].date, date(16));
        assert_eq!(repo.get_by_account(account2).unwrap().len(), 1);
    }

    #[test]
    fn test_transfer_index() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let transfer_id = TransferId::new();
        let mut out = Transaction::new(AccountId::new(), date(5), Money::from_cents(-10000));
        out.transfer_id = Some(transfer_id);
        let mut inflow = Transaction::new(AccountId::new(), date(5), Money::from_cents(10000));
        inflow.transfer_id = Some(transfer_id);
        let out_id = out.id;

        repo.upsert(out.clone()).unwrap();
        repo.upsert(inflow).unwrap();
        assert_eq!(repo.get_by_transfer(transfer_id).unwrap().len(), 2);

        out.transfer_id = None;
        repo.upsert(out).unwrap();
        let legs = repo.get_by_transfer(transfer_id).unwrap();
        assert_eq!(legs.len(), 1);
        assert_ne!(legs[0].id, out_id);
    }

    #[test]
    fn test_account_reassignment_moves_index() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let old_account = AccountId::new();
        let new_account = AccountId::new();
        let mut txn = Transaction::new(old_account, date(1), Money::from_cents(-500));
        repo.upsert(txn.clone()).unwrap();

        txn.account_id = new_account;
        repo.upsert(txn).unwrap();

        assert!(repo.get_by_account(old_account).unwrap().is_empty());
        assert_eq!(repo.get_by_account(new_account).unwrap().len(), 1);
    }

    #[test]
    fn test_save_and_reload_rebuilds_indexes() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let account_id = AccountId::new();
        let transfer_id = TransferId::new();
        let mut txn = Transaction::new(account_id, date(15), Money::from_cents(-5000));
        txn.transfer_id = Some(transfer_id);
        repo.upsert(txn).unwrap();
        repo.save().unwrap();

        let repo2 = TransactionRepository::new(temp_dir.path().join("transactions.json"));
        repo2.load().unwrap();

        assert_eq!(repo2.count().unwrap(), 1);
        assert_eq!(repo2.get_by_account(account_id).unwrap().len(), 1);
        assert_eq!(repo2.get_by_transfer(transfer_id).unwrap().len(), 1);
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let account_id = AccountId::new();
        let txn = Transaction::new(account_id, date(15), Money::from_cents(-5000));
        let id = txn.id;

        repo.upsert(txn).unwrap();
        assert!(repo.delete(id).unwrap());
        assert_eq!(repo.count().unwrap(), 0);
        assert!(repo.get_by_account(account_id).unwrap().is_empty());
        assert!(!repo.delete(id).unwrap());
    }

    #[test]
    fn test_date_range_query() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let account_id = AccountId::new();
        for (day, cents) in [(10, -100), (15, -200), (20, -300)] {
            repo.upsert(Transaction::new(account_id, date(day), Money::from_cents(cents)))
                .unwrap();
        }

        let range = repo.get_by_date_range(date(12), date(18)).unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range[0].amount.cents(), -200);
    }

    #[test]
    fn test_get_by_manifest() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let manifest_id = ManifestId::new();
        let mut exported = Transaction::new(AccountId::new(), date(3), Money::from_cents(-1));
        exported.mark_exported(manifest_id);
        repo.upsert(exported).unwrap();
        repo.upsert(Transaction::new(AccountId::new(), date(3), Money::from_cents(-2)))
            .unwrap();

        assert_eq!(repo.get_by_manifest(manifest_id).unwrap().len(), 1);
    }
}

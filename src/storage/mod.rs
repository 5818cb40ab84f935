//! Storage layer for pocket-ledger
//!
//! Provides JSON file storage with atomic writes and an all-or-nothing
//! boundary for multi-row writes.
//!
//! Repositories hold their records in memory and write one JSON file each.
//! Every mutation goes through [`Storage::transaction`]: the closure edits
//! repositories in memory, then all files are saved. If the closure or any
//! save fails, every repository is put back to the state it had before the
//! closure ran.

pub mod accounts;
pub mod categories;
pub mod file_io;
pub mod init;
pub mod manifests;
pub mod payees;
pub mod settings;
pub mod transactions;

pub use accounts::AccountRepository;
pub use categories::CategoryRepository;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use manifests::ManifestRepository;
pub use payees::PayeeRepository;
pub use settings::SettingsRepository;
pub use transactions::TransactionRepository;

use std::sync::Mutex;
use std::thread::{self, ThreadId};

use crate::config::paths::LedgerPaths;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Account, Category, ExportManifest, Payee, Transaction};

use settings::SettingEntry;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: LedgerPaths,
    /// Serializes writers
    writer: Mutex<()>,
    /// Thread currently inside `transaction`, so nested calls can join it
    writer_thread: Mutex<Option<ThreadId>>,
    pub accounts: AccountRepository,
    pub categories: CategoryRepository,
    pub payees: PayeeRepository,
    pub transactions: TransactionRepository,
    pub manifests: ManifestRepository,
    pub settings: SettingsRepository,
}

/// In-memory copy of every repository taken before a write
struct Snapshot {
    manifests: Vec<ExportManifest>,
    accounts: Vec<Account>,
    categories: Vec<Category>,
    payees: Vec<Payee>,
    transactions: Vec<Transaction>,
    settings: Vec<SettingEntry>,
}

/// Clears the writer-thread marker when the transaction ends, even on panic
struct WriterMark<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for WriterMark<'_> {
    fn drop(&mut self) {
        if let Ok(mut owner) = self.0.lock() {
            *owner = None;
        }
    }
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: LedgerPaths) -> Result<Self, LedgerError> {
        paths.ensure_directories()?;

        Ok(Self {
            accounts: AccountRepository::new(paths.accounts_file()),
            categories: CategoryRepository::new(paths.categories_file()),
            payees: PayeeRepository::new(paths.payees_file()),
            transactions: TransactionRepository::new(paths.transactions_file()),
            manifests: ManifestRepository::new(paths.manifests_file()),
            settings: SettingsRepository::new(paths.settings_file()),
            writer: Mutex::new(()),
            writer_thread: Mutex::new(None),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &LedgerPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> Result<(), LedgerError> {
        self.manifests.load()?;
        self.accounts.load()?;
        self.categories.load()?;
        self.payees.load()?;
        self.transactions.load()?;
        self.settings.load()?;
        Ok(())
    }

    /// Save all data to disk
    ///
    /// Manifests go first so a transaction on disk never points at a
    /// manifest that has not been written yet.
    pub fn save_all(&self) -> Result<(), LedgerError> {
        self.manifests.save()?;
        self.accounts.save()?;
        self.categories.save()?;
        self.payees.save()?;
        self.transactions.save()?;
        self.settings.save()?;
        Ok(())
    }

    /// Check if the ledger has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    /// Run `f` as one all-or-nothing write
    ///
    /// Writers are serialized. On success every repository is saved; if `f`
    /// or a save fails, all repositories are restored to their state before
    /// `f` ran and that state is written back to disk best-effort. A nested
    /// call from inside `f` joins the enclosing transaction.
    pub fn transaction<T, F>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&Storage) -> LedgerResult<T>,
    {
        if self.holds_writer()? {
            return f(self);
        }

        let _guard = self.writer.lock().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire writer lock: {}", e))
        })?;
        let _mark = self.mark_writer()?;

        let snapshot = self.snapshot()?;

        let value = match f(self) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "store transaction aborted");
                self.rollback(snapshot, false);
                return Err(e);
            }
        };

        if let Err(e) = self.save_all() {
            tracing::warn!(error = %e, "store commit failed, restoring previous state");
            self.rollback(snapshot, true);
            return Err(e);
        }

        Ok(value)
    }

    fn holds_writer(&self) -> LedgerResult<bool> {
        let owner = self.writer_thread.lock().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire writer lock: {}", e))
        })?;
        Ok(*owner == Some(thread::current().id()))
    }

    fn mark_writer(&self) -> LedgerResult<WriterMark<'_>> {
        let mut owner = self.writer_thread.lock().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire writer lock: {}", e))
        })?;
        *owner = Some(thread::current().id());
        Ok(WriterMark(&self.writer_thread))
    }

    fn snapshot(&self) -> LedgerResult<Snapshot> {
        Ok(Snapshot {
            manifests: self.manifests.snapshot()?,
            accounts: self.accounts.snapshot()?,
            categories: self.categories.snapshot()?,
            payees: self.payees.snapshot()?,
            transactions: self.transactions.snapshot()?,
            settings: self.settings.snapshot()?,
        })
    }

    fn restore(&self, snapshot: Snapshot) -> LedgerResult<()> {
        self.manifests.restore(snapshot.manifests)?;
        self.accounts.restore(snapshot.accounts)?;
        self.categories.restore(snapshot.categories)?;
        self.payees.restore(snapshot.payees)?;
        self.transactions.restore(snapshot.transactions)?;
        self.settings.restore(snapshot.settings)?;
        Ok(())
    }

    /// Put the snapshot back; re-save when some files may already be written
    fn rollback(&self, snapshot: Snapshot, persist: bool) {
        if let Err(e) = self.restore(snapshot) {
            tracing::error!(error = %e, "failed to restore store snapshot");
            return;
        }
        if persist {
            if let Err(e) = self.save_all() {
                tracing::error!(error = %e, "failed to re-persist restored store state");
            }
        }
    }
}

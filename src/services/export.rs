//! Export manifest tracker
//!
//! Every export is recorded as a manifest holding the exact content that
//! left the ledger. Exported transactions point back at their manifest, and
//! the `exported` flag and manifest reference are only ever set or cleared
//! here, together.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::config::Settings;
use crate::error::{LedgerError, LedgerResult};
use crate::export::{build_rows, render};
use crate::models::{
    Account, AccountId, ExportFormat, ExportManifest, ManifestId, Transaction, TransactionId,
};
use crate::storage::Storage;

use super::transaction::{TransactionFilter, TransactionService};

/// Service for recording and running exports
pub struct ExportService<'a> {
    storage: &'a Storage,
}

/// How an export is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// One manifest per account instead of one for everything
    pub grouped: bool,
    /// Flag the exported transactions and link them to the manifest
    pub mark_exported: bool,
    pub format: ExportFormat,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            grouped: false,
            mark_exported: true,
            format: ExportFormat::Csv,
        }
    }
}

/// Manifests produced by [`ExportService::export_transactions`]
#[derive(Debug, Clone)]
pub enum ExportOutput {
    Single(ExportManifest),
    /// One manifest per account, ordered by account name
    Grouped(Vec<ExportManifest>),
}

impl ExportOutput {
    pub fn manifests(&self) -> &[ExportManifest] {
        match self {
            Self::Single(manifest) => std::slice::from_ref(manifest),
            Self::Grouped(manifests) => manifests,
        }
    }
}

/// Filename-safe form of an account name
fn slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "account".to_string()
    } else {
        slug
    }
}

fn export_filename(account: Option<&Account>, format: ExportFormat) -> String {
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    match account {
        Some(account) => format!(
            "transactions-{}-{}.{}",
            slug(&account.name),
            stamp,
            format.extension()
        ),
        None => format!("transactions-{}.{}", stamp, format.extension()),
    }
}

impl<'a> ExportService<'a> {
    /// Create a new export service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Persist a manifest and mark the given transactions as exported by it
    ///
    /// Unknown transaction ids fail the whole call; nothing is written.
    pub fn record(
        &self,
        manifest: ExportManifest,
        transaction_ids: &[TransactionId],
    ) -> LedgerResult<ExportManifest> {
        manifest
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        let manifest = self.storage.transaction(|s| {
            let mut transactions = Vec::with_capacity(transaction_ids.len());
            for id in transaction_ids {
                let txn = s
                    .transactions
                    .get(*id)?
                    .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))?;
                transactions.push(txn);
            }

            s.manifests.upsert(manifest.clone())?;
            for mut txn in transactions {
                txn.mark_exported(manifest.id);
                s.transactions.upsert(txn)?;
            }
            Ok(manifest)
        })?;

        tracing::info!(
            manifest_id = %manifest.id,
            filename = %manifest.filename,
            rows = manifest.row_count,
            marked = transaction_ids.len(),
            "export recorded"
        );

        Ok(manifest)
    }

    /// Render the filtered transactions and record the manifest(s)
    ///
    /// Transactions are written oldest first. A grouped export records one
    /// manifest per account, all in one store transaction.
    pub fn export_transactions(
        &self,
        filter: TransactionFilter,
        options: ExportOptions,
    ) -> LedgerResult<ExportOutput> {
        let mut transactions = TransactionService::new(self.storage).list(filter)?;
        if transactions.is_empty() {
            return Err(LedgerError::Export(
                "No transactions match the export filter".into(),
            ));
        }
        transactions.reverse();

        let date_format = Settings::load(self.storage)?.date_format;
        let accounts = self.storage.accounts.get_all()?;
        let categories = self.storage.categories.get_all()?;

        let prepare = |account: Option<&Account>, txns: &[Transaction]| {
            let rows = build_rows(txns, &accounts, &categories, date_format);
            let content = render(options.format, &rows)?;
            let mut manifest = ExportManifest::new(
                export_filename(account, options.format),
                rows.len(),
                options.format,
                content,
            );
            if let Some(account) = account {
                manifest = manifest.for_account(account.id);
            }
            let ids: Vec<TransactionId> = if options.mark_exported {
                txns.iter().map(|t| t.id).collect()
            } else {
                Vec::new()
            };
            Ok::<_, LedgerError>((manifest, ids))
        };

        if !options.grouped {
            let (manifest, ids) = prepare(None, &transactions)?;
            return self.record(manifest, &ids).map(ExportOutput::Single);
        }

        let by_id: BTreeMap<AccountId, &Account> = accounts.iter().map(|a| (a.id, a)).collect();
        let mut groups: BTreeMap<AccountId, Vec<Transaction>> = BTreeMap::new();
        for txn in transactions {
            groups.entry(txn.account_id).or_default().push(txn);
        }

        let mut prepared = Vec::with_capacity(groups.len());
        for (account_id, txns) in &groups {
            let account = by_id.get(account_id).copied();
            prepared.push(prepare(account, txns)?);
        }

        let mut manifests = self.storage.transaction(|_| {
            prepared
                .into_iter()
                .map(|(manifest, ids)| self.record(manifest, &ids))
                .collect::<LedgerResult<Vec<_>>>()
        })?;

        let name_of = |m: &ExportManifest| {
            m.account_id
                .and_then(|id| by_id.get(&id))
                .map(|a| a.name.to_lowercase())
                .unwrap_or_default()
        };
        manifests.sort_by_key(name_of);

        Ok(ExportOutput::Grouped(manifests))
    }

    /// All manifests, newest first
    pub fn list_manifests(&self) -> LedgerResult<Vec<ExportManifest>> {
        self.storage.manifests.get_all()
    }

    /// Get a manifest by ID
    pub fn get_manifest(&self, id: ManifestId) -> LedgerResult<ExportManifest> {
        self.storage
            .manifests
            .get(id)?
            .ok_or_else(|| LedgerError::manifest_not_found(id.to_string()))
    }

    /// Find a manifest by full ID or its short display form
    pub fn find_manifest(&self, identifier: &str) -> LedgerResult<Option<ExportManifest>> {
        if let Ok(id) = identifier.parse::<ManifestId>() {
            return self.storage.manifests.get(id);
        }
        Ok(self
            .storage
            .manifests
            .get_all()?
            .into_iter()
            .find(|m| m.id.short() == identifier || m.filename == identifier))
    }

    /// The stored bytes of an export, as they were when it was made
    pub fn manifest_content(&self, id: ManifestId) -> LedgerResult<String> {
        Ok(self.get_manifest(id)?.content)
    }

    /// Delete a manifest and clear the exported state it set
    ///
    /// Returns the number of transactions that were un-marked.
    pub fn delete_manifest(&self, id: ManifestId) -> LedgerResult<usize> {
        let cleared = self.storage.transaction(|s| {
            if !s.manifests.delete(id)? {
                return Err(LedgerError::manifest_not_found(id.to_string()));
            }

            let linked = s.transactions.get_by_manifest(id)?;
            let count = linked.len();
            for mut txn in linked {
                txn.clear_export();
                s.transactions.upsert(txn)?;
            }
            Ok(count)
        })?;

        tracing::info!(manifest_id = %id, cleared, "export manifest deleted");
        Ok(cleared)
    }
}

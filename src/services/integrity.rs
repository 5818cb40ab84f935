//! Store integrity check
//!
//! Scans the record store for states the services never produce on their
//! own: broken transfer pairs, half-set export tracking and references to
//! missing rows. Nothing is repaired here.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::LedgerResult;
use crate::models::{AccountId, ManifestId, TransactionId, TransferId};
use crate::storage::Storage;

/// One broken invariant found in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A transfer id shared by other than exactly two rows
    TransferLegCount {
        transfer_id: TransferId,
        legs: usize,
    },
    /// Both legs of a transfer sit on one account
    TransferSameAccount {
        transfer_id: TransferId,
        account_id: AccountId,
    },
    /// A transfer without one negative and one positive leg
    TransferSigns { transfer_id: TransferId },
    /// A transaction pointing at an account that no longer exists
    MissingAccount {
        transaction_id: TransactionId,
        account_id: AccountId,
    },
    /// Marked exported but carries no manifest
    ExportedWithoutManifest { transaction_id: TransactionId },
    /// Carries a manifest but is not marked exported
    ManifestWithoutExported {
        transaction_id: TransactionId,
        manifest_id: ManifestId,
    },
    /// Carries a manifest id with no stored manifest
    MissingManifest {
        transaction_id: TransactionId,
        manifest_id: ManifestId,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransferLegCount { transfer_id, legs } => {
                write!(f, "Transfer {} has {} leg(s), expected 2", transfer_id, legs)
            }
            Self::TransferSameAccount {
                transfer_id,
                account_id,
            } => write!(
                f,
                "Transfer {} has both legs on account {}",
                transfer_id, account_id
            ),
            Self::TransferSigns { transfer_id } => write!(
                f,
                "Transfer {} does not have one outflow and one inflow leg",
                transfer_id
            ),
            Self::MissingAccount {
                transaction_id,
                account_id,
            } => write!(
                f,
                "Transaction {} references missing account {}",
                transaction_id, account_id
            ),
            Self::ExportedWithoutManifest { transaction_id } => write!(
                f,
                "Transaction {} is marked exported without a manifest",
                transaction_id
            ),
            Self::ManifestWithoutExported {
                transaction_id,
                manifest_id,
            } => write!(
                f,
                "Transaction {} references manifest {} but is not marked exported",
                transaction_id, manifest_id
            ),
            Self::MissingManifest {
                transaction_id,
                manifest_id,
            } => write!(
                f,
                "Transaction {} references missing manifest {}",
                transaction_id, manifest_id
            ),
        }
    }
}

/// Service for store integrity checks
pub struct IntegrityService<'a> {
    storage: &'a Storage,
}

impl<'a> IntegrityService<'a> {
    /// Create a new integrity service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Every violation currently in the store, transfers first
    pub fn check(&self) -> LedgerResult<Vec<Violation>> {
        let mut violations = self.check_transfers()?;
        violations.extend(self.check_transactions()?);

        if violations.is_empty() {
            tracing::debug!("integrity check passed");
        } else {
            tracing::warn!(violations = violations.len(), "integrity check found violations");
        }
        Ok(violations)
    }

    fn check_transfers(&self) -> LedgerResult<Vec<Violation>> {
        let mut violations = Vec::new();

        for (transfer_id, ids) in self.storage.transactions.transfer_groups()? {
            if ids.len() != 2 {
                violations.push(Violation::TransferLegCount {
                    transfer_id,
                    legs: ids.len(),
                });
                continue;
            }

            let legs = self.storage.transactions.get_by_transfer(transfer_id)?;
            let [a, b] = legs.as_slice() else {
                continue;
            };
            if a.account_id == b.account_id {
                violations.push(Violation::TransferSameAccount {
                    transfer_id,
                    account_id: a.account_id,
                });
            }
            let one_each = (a.amount.is_negative() && b.amount.is_positive())
                || (a.amount.is_positive() && b.amount.is_negative());
            if !one_each {
                violations.push(Violation::TransferSigns { transfer_id });
            }
        }

        Ok(violations)
    }

    fn check_transactions(&self) -> LedgerResult<Vec<Violation>> {
        let accounts: HashSet<AccountId> = self
            .storage
            .accounts
            .get_all()?
            .into_iter()
            .map(|a| a.id)
            .collect();
        let manifests: HashSet<ManifestId> = self
            .storage
            .manifests
            .get_all()?
            .into_iter()
            .map(|m| m.id)
            .collect();

        let mut violations = Vec::new();
        for txn in self.storage.transactions.get_all()? {
            if !accounts.contains(&txn.account_id) {
                violations.push(Violation::MissingAccount {
                    transaction_id: txn.id,
                    account_id: txn.account_id,
                });
            }

            match (txn.exported, txn.export_manifest_id) {
                (true, None) => violations.push(Violation::ExportedWithoutManifest {
                    transaction_id: txn.id,
                }),
                (false, Some(manifest_id)) => {
                    violations.push(Violation::ManifestWithoutExported {
                        transaction_id: txn.id,
                        manifest_id,
                    })
                }
                _ => {}
            }

            if let Some(manifest_id) = txn.export_manifest_id {
                if !manifests.contains(&manifest_id) {
                    violations.push(Violation::MissingManifest {
                        transaction_id: txn.id,
                        manifest_id,
                    });
                }
            }
        }

        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use crate::models::{Account, Money, Transaction};
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
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn create_accounts(storage: &Storage) -> (AccountId, AccountId) {
        let a = Account::new("A", "EUR");
        let b = Account::new("B", "EUR");
        let ids = (a.id, b.id);
        storage
            .transaction(|s| {
                s.accounts.upsert(a)?;
                s.accounts.upsert(b)
            })
            .unwrap();
        ids
    }

    #[test]
    fn test_clean_store() {
        let (_temp_dir, storage) = create_test_storage();
        let (a, b) = create_accounts(&storage);
        TransferService::new(&storage)
            .create(CreateTransfer::new(a, b, Money::from_cents(100), date()))
            .unwrap();

        assert!(IntegrityService::new(&storage).check().unwrap().is_empty());
    }

    #[test]
    fn test_orphaned_leg() {
        let (_temp_dir, storage) = create_test_storage();
        let (a, b) = create_accounts(&storage);
        let pair = TransferService::new(&storage)
            .create(CreateTransfer::new(a, b, Money::from_cents(100), date()))
            .unwrap();
        storage
            .transaction(|s| s.transactions.delete(pair.inflow.id))
            .unwrap();

        let violations = IntegrityService::new(&storage).check().unwrap();
        assert_eq!(
            violations,
            vec![Violation::TransferLegCount {
                transfer_id: pair.transfer_id().unwrap(),
                legs: 1
            }]
        );
    }

    #[test]
    fn test_bad_pair_shapes() {
        let (_temp_dir, storage) = create_test_storage();
        let (a, _) = create_accounts(&storage);
        let transfer_id = TransferId::new();

        let mut out = Transaction::new(a, date(), Money::from_cents(100));
        out.transfer_id = Some(transfer_id);
        let mut inn = Transaction::new(a, date(), Money::from_cents(100));
        inn.transfer_id = Some(transfer_id);
        storage
            .transaction(|s| {
                s.transactions.upsert(out)?;
                s.transactions.upsert(inn)
            })
            .unwrap();

        let violations = IntegrityService::new(&storage).check().unwrap();
        assert_eq!(violations.len(), 2);
        assert!(violations.contains(&Violation::TransferSameAccount {
            transfer_id,
            account_id: a
        }));
        assert!(violations.contains(&Violation::TransferSigns { transfer_id }));
    }

    #[test]
    fn test_export_tracking_violations() {
        let (_temp_dir, storage) = create_test_storage();
        let (a, _) = create_accounts(&storage);

        let mut flagged = Transaction::new(a, date(), Money::from_cents(-5));
        flagged.exported = true;
        let manifest_id = ManifestId::new();
        let mut unflagged = Transaction::new(a, date(), Money::from_cents(-6));
        unflagged.export_manifest_id = Some(manifest_id);
        let (flagged_id, unflagged_id) = (flagged.id, unflagged.id);
        storage
            .transaction(|s| {
                s.transactions.upsert(flagged)?;
                s.transactions.upsert(unflagged)
            })
            .unwrap();

        let violations = IntegrityService::new(&storage).check().unwrap();
        assert_eq!(violations.len(), 3);
        assert!(violations.contains(&Violation::ExportedWithoutManifest {
            transaction_id: flagged_id
        }));
        assert!(violations.contains(&Violation::ManifestWithoutExported {
            transaction_id: unflagged_id,
            manifest_id
        }));
        assert!(violations.contains(&Violation::MissingManifest {
            transaction_id: unflagged_id,
            manifest_id
        }));
    }

    #[test]
    fn test_missing_account() {
        let (_temp_dir, storage) = create_test_storage();
        let ghost = AccountId::new();
        let txn = Transaction::new(ghost, date(), Money::from_cents(1));
        let txn_id = txn.id;
        storage.transaction(|s| s.transactions.upsert(txn)).unwrap();

        let violations = IntegrityService::new(&storage).check().unwrap();
        assert_eq!(
            violations,
            vec![Violation::MissingAccount {
                transaction_id: txn_id,
                account_id: ghost
            }]
        );
        assert!(violations[0].to_string().contains("missing account"));
    }
}

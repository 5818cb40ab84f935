//! Duplicate detection
//!
//! Compares normalized candidate rows against stored records. Results are
//! advisory: nothing here blocks a write, callers decide what to skip.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::settings::DateFormat;
use crate::error::LedgerResult;
use crate::models::{AccountId, Money, PreciseAmount, Transaction, TransactionId};
use crate::storage::Storage;

/// Amounts closer than 0.001 currency units are considered equal
pub const AMOUNT_TOLERANCE: PreciseAmount = PreciseAmount::from_micros(1_000);

/// A row that may already exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCandidate {
    /// Date as written in the source, parsed with the configured format
    pub date: String,
    pub payee: String,
    /// Kept at parsed precision, not rounded to cents
    pub amount: PreciseAmount,
}

impl DuplicateCandidate {
    pub fn new(
        date: impl Into<String>,
        payee: impl Into<String>,
        amount: impl Into<PreciseAmount>,
    ) -> Self {
        Self {
            date: date.into(),
            payee: payee.into(),
            amount: amount.into(),
        }
    }
}

/// A candidate that matches a stored transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateMatch {
    pub candidate_index: usize,
    pub existing_id: TransactionId,
}

/// A candidate whose date could not be normalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub candidate_index: usize,
    pub message: String,
}

/// Outcome of a duplicate check
#[derive(Debug, Clone, Default, Serialize)]
pub struct DuplicateReport {
    pub matches: Vec<DuplicateMatch>,
    pub errors: Vec<RowError>,
}

impl DuplicateReport {
    /// Whether the candidate at `index` matched anything
    pub fn is_duplicate(&self, index: usize) -> bool {
        self.matches.iter().any(|m| m.candidate_index == index)
    }
}

fn payee_key(payee: &str) -> String {
    payee.trim().to_lowercase()
}

/// Existing transactions keyed by `(date, lower(trimmed payee))`
pub struct DuplicateIndex {
    buckets: HashMap<(NaiveDate, String), Vec<(TransactionId, Money)>>,
}

impl DuplicateIndex {
    /// Build the index from a transaction slice
    pub fn build<'t>(transactions: impl IntoIterator<Item = &'t Transaction>) -> Self {
        let mut buckets: HashMap<_, Vec<_>> = HashMap::new();
        for txn in transactions {
            buckets
                .entry((txn.date, payee_key(&txn.payee)))
                .or_default()
                .push((txn.id, txn.amount));
        }
        Self { buckets }
    }

    /// First stored transaction matching a normalized row
    pub fn find(
        &self,
        date: NaiveDate,
        payee: &str,
        amount: impl Into<PreciseAmount>,
    ) -> Option<TransactionId> {
        let amount = amount.into();
        self.buckets
            .get(&(date, payee_key(payee)))?
            .iter()
            .find(|(_, existing)| amount.within((*existing).into(), AMOUNT_TOLERANCE))
            .map(|(id, _)| *id)
    }
}

/// Match candidates against an index, normalizing dates with `date_format`
pub fn find_duplicates(
    index: &DuplicateIndex,
    candidates: &[DuplicateCandidate],
    date_format: DateFormat,
) -> DuplicateReport {
    let mut report = DuplicateReport::default();

    for (candidate_index, candidate) in candidates.iter().enumerate() {
        let Some(date) = date_format.parse_date(&candidate.date) else {
            report.errors.push(RowError {
                candidate_index,
                message: format!("Unrecognized date '{}'", candidate.date),
            });
            continue;
        };

        if let Some(existing_id) = index.find(date, &candidate.payee, candidate.amount) {
            report.matches.push(DuplicateMatch {
                candidate_index,
                existing_id,
            });
        }
    }

    report
}

/// Service front for duplicate checks against the store
pub struct DuplicateService<'a> {
    storage: &'a Storage,
}

impl<'a> DuplicateService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Check transaction candidates, optionally scoped to one account
    ///
    /// Uses the stored `date_format` setting unless one is given.
    pub fn check_transactions(
        &self,
        candidates: &[DuplicateCandidate],
        account_id: Option<AccountId>,
        date_format: Option<DateFormat>,
    ) -> LedgerResult<DuplicateReport> {
        let date_format = match date_format {
            Some(format) => format,
            None => crate::config::Settings::load(self.storage)?.date_format,
        };

        let existing = match account_id {
            Some(id) => self.storage.transactions.get_by_account(id)?,
            None => self.storage.transactions.get_all()?,
        };
        let index = DuplicateIndex::build(&existing);
        let report = find_duplicates(&index, candidates, date_format);

        tracing::debug!(
            candidates = candidates.len(),
            matches = report.matches.len(),
            errors = report.errors.len(),
            "duplicate check"
        );

        Ok(report)
    }

    /// Indexes of payee names that already exist (exact, case-sensitive)
    pub fn check_payees(&self, names: &[String]) -> LedgerResult<Vec<usize>> {
        let mut duplicates = Vec::new();
        for (i, name) in names.iter().enumerate() {
            if self.storage.payees.get_by_name(name)?.is_some() {
                duplicates.push(i);
            }
        }
        Ok(duplicates)
    }
}

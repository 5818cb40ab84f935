//! CSV Import service
//!
//! Importing is two phases. [`ImportService::check`] parses the file,
//! detects the column layout and flags rows that duplicate stored
//! transactions. [`ImportService::commit`] inserts the accepted rows in one
//! store transaction. Nothing is re-checked between the two calls, so a
//! concurrent write in between can slip a duplicate through.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;

use crate::config::settings::DateFormat;
use crate::config::Settings;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccountId, Money, Transaction, TransactionId};
use crate::storage::Storage;

use super::duplicates::DuplicateIndex;

/// Column mapping configuration for CSV import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Index of the date column
    pub date_column: usize,
    /// Index of a signed amount column
    pub amount_column: Option<usize>,
    /// Index of the outflow column (if using separate columns)
    pub outflow_column: Option<usize>,
    /// Index of the inflow column (if using separate columns)
    pub inflow_column: Option<usize>,
    /// Index of the payee/description column
    pub payee_column: Option<usize>,
    /// Index of the memo/notes column
    pub memo_column: Option<usize>,
    /// Whether the first row is a header
    pub has_header: bool,
    /// Whether to invert amounts (some banks use positive for debits)
    pub invert_amounts: bool,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            date_column: 0,
            amount_column: Some(1),
            outflow_column: None,
            inflow_column: None,
            payee_column: Some(2),
            memo_column: None,
            has_header: true,
            invert_amounts: false,
        }
    }
}

impl ColumnMapping {
    /// Create a new column mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping for separate outflow (debit) and inflow (credit) columns
    pub fn separate_inout(
        date_col: usize,
        outflow_col: usize,
        inflow_col: usize,
        payee_col: usize,
    ) -> Self {
        Self {
            date_column: date_col,
            amount_column: None,
            outflow_column: Some(outflow_col),
            inflow_column: Some(inflow_col),
            payee_column: Some(payee_col),
            ..Self::default()
        }
    }

    /// Set whether first row is header
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Detect the layout from the first record of a file
    ///
    /// A first record whose leading field is a date is data, not a header:
    /// four or more columns read as date/description/debit/credit, fewer as
    /// date/description/amount.
    pub fn detect(first: &StringRecord, date_format: DateFormat) -> Self {
        let leading_date = first
            .get(0)
            .and_then(|s| date_format.parse_date(s))
            .is_some();

        if leading_date {
            let numeric = |i: usize| {
                first
                    .get(i)
                    .map(|s| s.trim().is_empty() || Money::parse(s).is_ok())
                    .unwrap_or(false)
            };
            if first.len() >= 4 && numeric(2) && numeric(3) {
                return Self::separate_inout(0, 2, 3, 1).with_header(false);
            }
            return Self {
                date_column: 0,
                amount_column: Some(2),
                payee_column: Some(1),
                ..Self::default()
            }
            .with_header(false);
        }

        let mut mapping = Self {
            amount_column: None,
            payee_column: None,
            ..Self::default()
        };
        let mut date_found = false;

        for (idx, header) in first.iter().enumerate() {
            let h = header.trim().to_lowercase();

            let is_date_header =
                h.contains("date") || h.contains("posted") || h.contains("booking");
            if !date_found && is_date_header {
                mapping.date_column = idx;
                date_found = true;
            } else if h.contains("amount") && mapping.amount_column.is_none() {
                mapping.amount_column = Some(idx);
            } else if h.contains("debit") || h.contains("outflow") || h.contains("withdrawal") {
                mapping.outflow_column = Some(idx);
            } else if h.contains("credit") || h.contains("inflow") || h.contains("deposit") {
                mapping.inflow_column = Some(idx);
            } else if mapping.payee_column.is_none()
                && (h.contains("description")
                    || h.contains("payee")
                    || h.contains("merchant")
                    || h.contains("name"))
            {
                mapping.payee_column = Some(idx);
            } else if h.contains("memo") || h.contains("note") || h.contains("reference") {
                mapping.memo_column = Some(idx);
            }
        }

        // Separate inflow/outflow columns win over a generic amount column
        if mapping.outflow_column.is_some() && mapping.inflow_column.is_some() {
            mapping.amount_column = None;
        }

        mapping
    }

    fn has_amount(&self) -> bool {
        self.amount_column.is_some()
            || (self.outflow_column.is_some() && self.inflow_column.is_some())
    }
}

/// A parsed row from the CSV before import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedRow {
    pub date: NaiveDate,
    /// Signed amount (negative for outflow)
    pub amount: Money,
    pub payee: String,
    pub memo: String,
}

/// Status of a row in an import preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ImportStatus {
    /// Will be imported
    New,
    /// Matches the stored transaction
    Duplicate(TransactionId),
    /// Could not be parsed
    Error(String),
}

/// One row of an import preview
#[derive(Debug, Clone, Serialize)]
pub struct ImportPreviewEntry {
    /// 1-based data row number (header excluded)
    pub row_number: usize,
    pub row: Option<ParsedRow>,
    pub status: ImportStatus,
}

/// Result of [`ImportService::check`]
#[derive(Debug, Clone, Serialize)]
pub struct ImportPreview {
    pub account_id: AccountId,
    pub entries: Vec<ImportPreviewEntry>,
}

impl ImportPreview {
    fn count(&self, pred: impl Fn(&ImportStatus) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.status)).count()
    }

    pub fn new_count(&self) -> usize {
        self.count(|s| matches!(s, ImportStatus::New))
    }

    pub fn duplicate_count(&self) -> usize {
        self.count(|s| matches!(s, ImportStatus::Duplicate(_)))
    }

    pub fn error_count(&self) -> usize {
        self.count(|s| matches!(s, ImportStatus::Error(_)))
    }
}

/// A row that was not imported because it could not be parsed or stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRowError {
    pub row_number: usize,
    pub message: String,
}

/// Result of a completed import
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResult {
    /// Number of transactions inserted
    pub count: usize,
    pub duplicates_skipped: usize,
    pub errors: Vec<ImportRowError>,
    pub imported_ids: Vec<TransactionId>,
}

/// Semicolon-separated files are common with decimal-comma locales
fn sniff_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or_default();
    if first_line.matches(';').count() > first_line.matches(',').count() {
        b';'
    } else {
        b','
    }
}

fn parse_amount(s: &str) -> Result<Money, String> {
    Money::parse(s).map_err(|e| format!("Could not parse amount '{}': {}", s.trim(), e))
}

/// Service for CSV import
pub struct ImportService<'a> {
    storage: &'a Storage,
}

impl<'a> ImportService<'a> {
    /// Create a new import service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Parse CSV content into rows
    ///
    /// Without an explicit mapping the layout is detected from the first
    /// record. Returns the mapping used and one result per data row.
    pub fn parse(
        &self,
        content: &str,
        mapping: Option<ColumnMapping>,
        date_format: DateFormat,
    ) -> LedgerResult<(ColumnMapping, Vec<Result<ParsedRow, String>>)> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(sniff_delimiter(content))
            .from_reader(content.as_bytes());

        let mut records = reader.records();
        let Some(first) = records.next().transpose()? else {
            return Err(LedgerError::Import("The file contains no rows".into()));
        };

        let mapping = mapping.unwrap_or_else(|| ColumnMapping::detect(&first, date_format));
        if !mapping.has_amount() {
            return Err(LedgerError::Import(
                "Could not find an amount column (or a debit/credit pair)".into(),
            ));
        }

        let mut rows = Vec::new();
        if !mapping.has_header {
            rows.push(Self::parse_record(&first, &mapping, date_format));
        }
        for record in records {
            rows.push(match record {
                Ok(record) => Self::parse_record(&record, &mapping, date_format),
                Err(e) => Err(format!("Error reading CSV record: {}", e)),
            });
        }

        Ok((mapping, rows))
    }

    /// Parse a single CSV record
    fn parse_record(
        record: &StringRecord,
        mapping: &ColumnMapping,
        date_format: DateFormat,
    ) -> Result<ParsedRow, String> {
        let date_str = record
            .get(mapping.date_column)
            .ok_or_else(|| "Missing date column".to_string())?;
        let date = date_format
            .parse_date(date_str)
            .ok_or_else(|| format!("Could not parse date: '{}'", date_str))?;

        let amount = if let Some(col) = mapping.amount_column {
            let s = record
                .get(col)
                .ok_or_else(|| "Missing amount column".to_string())?;
            parse_amount(s)?
        } else {
            let cell = |col: Option<usize>| col.and_then(|c| record.get(c)).unwrap_or("");
            let outflow = match cell(mapping.outflow_column) {
                "" => Money::zero(),
                s => -parse_amount(s)?.abs(),
            };
            let inflow = match cell(mapping.inflow_column) {
                "" => Money::zero(),
                s => parse_amount(s)?.abs(),
            };
            outflow + inflow
        };

        let text = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .map(|s| s.to_string())
                .unwrap_or_default()
        };

        Ok(ParsedRow {
            date,
            amount: if mapping.invert_amounts { -amount } else { amount },
            payee: text(mapping.payee_column),
            memo: text(mapping.memo_column),
        })
    }

    /// Parse a file and flag rows that duplicate the account's transactions
    ///
    /// Uses the stored `date_format` setting unless one is given.
    pub fn check(
        &self,
        content: &str,
        account_id: AccountId,
        date_format: Option<DateFormat>,
        mapping: Option<ColumnMapping>,
    ) -> LedgerResult<ImportPreview> {
        if !self.storage.accounts.exists(account_id)? {
            return Err(LedgerError::account_not_found(account_id.to_string()));
        }
        let date_format = match date_format {
            Some(format) => format,
            None => Settings::load(self.storage)?.date_format,
        };

        let (_, rows) = self.parse(content, mapping, date_format)?;
        let existing = self.storage.transactions.get_by_account(account_id)?;
        let index = DuplicateIndex::build(&existing);

        let entries: Vec<ImportPreviewEntry> = rows
            .into_iter()
            .enumerate()
            .map(|(i, parsed)| {
                let row_number = i + 1;
                match parsed {
                    Ok(row) => {
                        let status = match index.find(row.date, &row.payee, row.amount) {
                            Some(existing_id) => ImportStatus::Duplicate(existing_id),
                            None => ImportStatus::New,
                        };
                        ImportPreviewEntry {
                            row_number,
                            row: Some(row),
                            status,
                        }
                    }
                    Err(message) => ImportPreviewEntry {
                        row_number,
                        row: None,
                        status: ImportStatus::Error(message),
                    },
                }
            })
            .collect();

        let preview = ImportPreview {
            account_id,
            entries,
        };
        tracing::debug!(
            account_id = %account_id,
            new = preview.new_count(),
            duplicates = preview.duplicate_count(),
            errors = preview.error_count(),
            "import checked"
        );
        Ok(preview)
    }

    /// Insert the accepted rows of a preview in one store transaction
    pub fn commit(
        &self,
        preview: &ImportPreview,
        skip_duplicates: bool,
    ) -> LedgerResult<ImportResult> {
        let account_id = preview.account_id;

        let result = self.storage.transaction(|s| {
            if !s.accounts.exists(account_id)? {
                return Err(LedgerError::account_not_found(account_id.to_string()));
            }

            let mut result = ImportResult::default();
            for entry in &preview.entries {
                let row = match (&entry.status, &entry.row) {
                    (ImportStatus::Error(message), _) => {
                        result.errors.push(ImportRowError {
                            row_number: entry.row_number,
                            message: message.clone(),
                        });
                        continue;
                    }
                    (ImportStatus::Duplicate(_), Some(_)) if skip_duplicates => {
                        result.duplicates_skipped += 1;
                        continue;
                    }
                    (_, Some(row)) => row,
                    (_, None) => {
                        result.errors.push(ImportRowError {
                            row_number: entry.row_number,
                            message: "Row has no parsed data".into(),
                        });
                        continue;
                    }
                };

                let mut txn = Transaction::new(account_id, row.date, row.amount);
                txn.payee.clone_from(&row.payee);
                txn.memo.clone_from(&row.memo);
                if let Err(e) = txn.validate() {
                    result.errors.push(ImportRowError {
                        row_number: entry.row_number,
                        message: e.to_string(),
                    });
                    continue;
                }

                result.imported_ids.push(txn.id);
                s.transactions.upsert(txn)?;
                result.count += 1;
            }
            Ok(result)
        })?;

        tracing::info!(
            account_id = %account_id,
            imported = result.count,
            duplicates_skipped = result.duplicates_skipped,
            errors = result.errors.len(),
            "import committed"
        );
        Ok(result)
    }

    /// Check and commit in one call
    pub fn import_transactions(
        &self,
        content: &str,
        account_id: AccountId,
        skip_duplicates: bool,
        date_format: Option<DateFormat>,
    ) -> LedgerResult<ImportResult> {
        let preview = self.check(content, account_id, date_format, None)?;
        self.commit(&preview, skip_duplicates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use crate::models::Account;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn create_account(storage: &Storage) -> AccountId {
        let account = Account::new("Checking", "EUR");
        let id = account.id;
        storage.transaction(|s| s.accounts.upsert(account)).unwrap();
        id
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_simple_csv() {
        let (_temp_dir, storage) = create_test_storage();
        let csv = "Date,Amount,Description\n\
                   2025-01-15,-50.00,Grocery Store\n\
                   2025-01-16,1000.00,Paycheck\n";

        let (mapping, rows) = ImportService::new(&storage)
            .parse(csv, None, DateFormat::Iso)
            .unwrap();
        assert_eq!(mapping.amount_column, Some(1));
        assert_eq!(mapping.payee_column, Some(2));
        assert_eq!(rows.len(), 2);

        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.date, date(2025, 1, 15));
        assert_eq!(first.amount.cents(), -5000);
        assert_eq!(first.payee, "Grocery Store");
        assert_eq!(rows[1].as_ref().unwrap().amount.cents(), 100000);
    }

    #[test]
    fn test_parse_separate_inout() {
        let (_temp_dir, storage) = create_test_storage();
        let csv = "Posted Date,Description,Debit,Credit,Memo\n\
                   2025-01-15,Grocery Store,50.00,,weekly\n\
                   2025-01-16,Paycheck,,1000.00,\n";

        let (mapping, rows) = ImportService::new(&storage)
            .parse(csv, None, DateFormat::Iso)
            .unwrap();
        assert_eq!(mapping.amount_column, None);
        assert_eq!(mapping.outflow_column, Some(2));
        assert_eq!(mapping.inflow_column, Some(3));

        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.amount.cents(), -5000);
        assert_eq!(first.memo, "weekly");
        assert_eq!(rows[1].as_ref().unwrap().amount.cents(), 100000);
    }

    #[test]
    fn test_parse_headerless_european() {
        let (_temp_dir, storage) = create_test_storage();
        let csv = "15.01.2025;Bäckerei;-3,50\n16.01.2025;Gehalt;2.500,00\n";

        let (mapping, rows) = ImportService::new(&storage)
            .parse(csv, None, DateFormat::Dmy)
            .unwrap();
        assert!(!mapping.has_header);
        assert_eq!(rows.len(), 2);

        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.date, date(2025, 1, 15));
        assert_eq!(first.payee, "Bäckerei");
        assert_eq!(first.amount.cents(), -350);
        assert_eq!(rows[1].as_ref().unwrap().amount.cents(), 250000);
    }

    #[test]
    fn test_parse_accounting_negative_and_bad_rows() {
        let (_temp_dir, storage) = create_test_storage();
        let csv = "Date,Amount,Payee\n\
                   2025-01-15,\"($1,234.56)\",Store\n\
                   not-a-date,1.00,Store\n\
                   2025-01-17,abc,Store\n";

        let (_, rows) = ImportService::new(&storage)
            .parse(csv, None, DateFormat::Iso)
            .unwrap();
        assert_eq!(rows[0].as_ref().unwrap().amount.cents(), -123456);
        assert!(rows[1].as_ref().unwrap_err().contains("date"));
        assert!(rows[2].as_ref().unwrap_err().contains("amount"));
    }

    #[test]
    fn test_parse_without_amount_column() {
        let (_temp_dir, storage) = create_test_storage();
        let err = ImportService::new(&storage)
            .parse("Date,Payee\n2025-01-15,Store\n", None, DateFormat::Iso)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Import(_)));

        let err = ImportService::new(&storage)
            .parse("", None, DateFormat::Iso)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Import(_)));
    }

    #[test]
    fn test_check_flags_case_insensitive_duplicate() {
        let (_temp_dir, storage) = create_test_storage();
        let account_id = create_account(&storage);

        let mut existing =
            Transaction::new(account_id, date(2024, 1, 5), Money::from_cents(120000));
        existing.payee = "landlord".into();
        let existing_id = existing.id;
        storage.transaction(|s| s.transactions.upsert(existing)).unwrap();

        let csv = "Date,Payee,Amount\n\
                   2024-01-05,Landlord,1200.00\n\
                   2024-01-05,Landlord,1200.50\n\
                   2024-01-05,Landlord,1200.009\n";
        let preview = ImportService::new(&storage)
            .check(csv, account_id, None, None)
            .unwrap();

        assert_eq!(preview.entries[0].status, ImportStatus::Duplicate(existing_id));
        assert_eq!(preview.entries[1].status, ImportStatus::New);
        assert!(matches!(
            &preview.entries[2].status,
            ImportStatus::Error(msg) if msg.contains("decimal places")
        ));
        assert_eq!(preview.duplicate_count(), 1);
        assert_eq!(preview.new_count(), 1);
        assert_eq!(preview.error_count(), 1);
    }

    #[test]
    fn test_check_only_compares_same_account() {
        let (_temp_dir, storage) = create_test_storage();
        let account_id = create_account(&storage);
        let other = Account::new("Savings", "EUR");
        let other_id = other.id;
        let mut txn = Transaction::new(other_id, date(2024, 1, 5), Money::from_cents(-1000));
        txn.payee = "Shop".into();
        storage
            .transaction(|s| {
                s.accounts.upsert(other)?;
                s.transactions.upsert(txn)
            })
            .unwrap();

        let preview = ImportService::new(&storage)
            .check("Date,Payee,Amount\n2024-01-05,Shop,-10.00\n", account_id, None, None)
            .unwrap();
        assert_eq!(preview.new_count(), 1);
    }

    #[test]
    fn test_import_transactions() {
        let (_temp_dir, storage) = create_test_storage();
        let account_id = create_account(&storage);
        let service = ImportService::new(&storage);

        let csv = "Date,Payee,Amount\n\
                   2024-01-05,Landlord,-1200.00\n\
                   2024-01-06,Grocer,-45.10\n\
                   bad,Grocer,-1.00\n";

        let result = service
            .import_transactions(csv, account_id, true, None)
            .unwrap();
        assert_eq!(result.count, 2);
        assert_eq!(result.duplicates_skipped, 0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row_number, 3);

        // Same file again: both valid rows are now duplicates
        let result = service
            .import_transactions(csv, account_id, true, None)
            .unwrap();
        assert_eq!(result.count, 0);
        assert_eq!(result.duplicates_skipped, 2);

        // Without skipping, duplicates are inserted anyway
        let result = service
            .import_transactions(csv, account_id, false, None)
            .unwrap();
        assert_eq!(result.count, 2);
        assert_eq!(storage.transactions.count().unwrap(), 4);
    }

    #[test]
    fn test_import_uses_stored_date_format() {
        let (_temp_dir, storage) = create_test_storage();
        let account_id = create_account(&storage);
        Settings::set(&storage, "date_format", "mdy").unwrap();

        let result = ImportService::new(&storage)
            .import_transactions(
                "Date,Payee,Amount\n01/02/2024,Shop,-5.00\n",
                account_id,
                true,
                None,
            )
            .unwrap();
        assert_eq!(result.count, 1);

        let txn = storage.transactions.get(result.imported_ids[0]).unwrap().unwrap();
        assert_eq!(txn.date, date(2024, 1, 2));
    }

    #[test]
    fn test_import_into_missing_account() {
        let (_temp_dir, storage) = create_test_storage();
        let err = ImportService::new(&storage)
            .import_transactions(
                "Date,Payee,Amount\n2024-01-05,X,1\n",
                AccountId::new(),
                true,
                None,
            )
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_commit_after_account_removed() {
        let (_temp_dir, storage) = create_test_storage();
        let account_id = create_account(&storage);
        let service = ImportService::new(&storage);

        let preview = service
            .check("Date,Payee,Amount\n2024-01-05,X,1\n", account_id, None, None)
            .unwrap();
        storage.transaction(|s| s.accounts.delete(account_id)).unwrap();

        assert!(service.commit(&preview, true).unwrap_err().is_not_found());
        assert_eq!(storage.transactions.count().unwrap(), 0);
    }
}

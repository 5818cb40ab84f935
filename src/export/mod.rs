//! Export writers for pocket-ledger
//!
//! Renders transactions for the external spreadsheet tool:
//! - CSV: one row per transaction with a fixed header (default)
//! - JSON: machine-readable, with a schema version
//! - YAML: human-readable, same structure as JSON
//!
//! Writers only format rows. Selecting transactions and recording what was
//! exported is done by `services::export`.

pub mod csv;
pub mod json;
pub mod yaml;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::settings::DateFormat;
use crate::error::LedgerResult;
use crate::models::{Account, AccountId, Category, CategoryId, ExportFormat, Transaction};

pub use self::csv::{write_transactions_csv, CSV_HEADER};
pub use json::{write_transactions_json, TransactionExport, EXPORT_SCHEMA_VERSION};
pub use yaml::write_transactions_yaml;

/// One exported transaction with names resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub date: String,
    pub account: String,
    pub currency: String,
    pub payee: String,
    pub category: String,
    pub payment_method: String,
    pub memo: String,
    /// Signed amount with two decimals
    pub amount: String,
}

/// Resolve names for a set of transactions
///
/// References to deleted accounts or categories render as empty text.
pub fn build_rows(
    transactions: &[Transaction],
    accounts: &[Account],
    categories: &[Category],
    date_format: DateFormat,
) -> Vec<ExportRow> {
    let accounts: HashMap<AccountId, &Account> = accounts.iter().map(|a| (a.id, a)).collect();
    let categories: HashMap<CategoryId, &str> = categories
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    transactions
        .iter()
        .map(|txn| {
            let account = accounts.get(&txn.account_id);
            ExportRow {
                date: date_format.format_date(txn.date),
                account: account.map(|a| a.name.clone()).unwrap_or_default(),
                currency: account.map(|a| a.currency.clone()).unwrap_or_default(),
                payee: txn.payee.clone(),
                category: txn
                    .category_id
                    .and_then(|id| categories.get(&id))
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
                payment_method: txn.payment_type.to_string(),
                memo: txn.memo.clone(),
                amount: txn.amount.to_string(),
            }
        })
        .collect()
}

/// Render rows in the requested format
pub fn render(format: ExportFormat, rows: &[ExportRow]) -> LedgerResult<String> {
    let mut out = Vec::new();
    match format {
        ExportFormat::Csv => write_transactions_csv(rows, &mut out)?,
        ExportFormat::Json => write_transactions_json(rows, &mut out)?,
        ExportFormat::Yaml => write_transactions_yaml(rows, &mut out)?,
    }
    String::from_utf8(out).map_err(|e| crate::error::LedgerError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlowType, Money, PaymentMethod};
    use chrono::NaiveDate;

    #[test]
    fn test_build_rows_resolves_names() {
        let account = Account::new("Checking", "EUR");
        let category = Category::new("Rent", FlowType::Expense);
        let mut txn = Transaction::new(
            account.id,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            Money::from_cents(-120000),
        );
        txn.payee = "Landlord".into();
        txn.category_id = Some(category.id);
        txn.payment_type = PaymentMethod::BankTransfer;

        let rows = build_rows(&[txn], &[account], &[category], DateFormat::Dmy);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "05.01.2024");
        assert_eq!(rows[0].account, "Checking");
        assert_eq!(rows[0].currency, "EUR");
        assert_eq!(rows[0].category, "Rent");
        assert_eq!(rows[0].amount, "-1200.00");
    }

    #[test]
    fn test_dangling_references_render_empty() {
        let txn = Transaction::new(
            AccountId::new(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            Money::from_cents(100),
        );
        let rows = build_rows(&[txn], &[], &[], DateFormat::Iso);
        assert_eq!(rows[0].account, "");
        assert_eq!(rows[0].category, "");
    }
}

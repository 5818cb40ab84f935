//! JSON export
//!
//! Wraps the rows with a schema version so the consuming tool can detect
//! layout changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::error::{LedgerError, LedgerResult};

use super::ExportRow;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Document written by the JSON and YAML exporters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub row_count: usize,

    pub transactions: Vec<ExportRow>,
}

impl TransactionExport {
    pub fn new(rows: &[ExportRow]) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            row_count: rows.len(),
            transactions: rows.to_vec(),
        }
    }

    /// Check a parsed document before trusting it
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Unsupported schema version {} (expected {})",
                self.schema_version, EXPORT_SCHEMA_VERSION
            ));
        }
        if self.row_count != self.transactions.len() {
            return Err(format!(
                "Row count {} does not match {} transactions",
                self.row_count,
                self.transactions.len()
            ));
        }
        Ok(())
    }
}

/// Write rows as pretty-printed JSON
pub fn write_transactions_json<W: Write>(rows: &[ExportRow], writer: W) -> LedgerResult<()> {
    serde_json::to_writer_pretty(writer, &TransactionExport::new(rows))
        .map_err(|e| LedgerError::Export(e.to_string()))
}

/// Parse a JSON export back into its document
pub fn read_transactions_json(content: &str) -> LedgerResult<TransactionExport> {
    let export: TransactionExport = serde_json::from_str(content)?;
    export.validate().map_err(LedgerError::Export)?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ExportRow {
        ExportRow {
            date: "2024-01-05".into(),
            account: "Checking".into(),
            currency: "EUR".into(),
            payee: "Landlord".into(),
            category: String::new(),
            payment_method: String::new(),
            memo: String::new(),
            amount: "-1200.00".into(),
        }
    }

    #[test]
    fn test_json_export() {
        let mut out = Vec::new();
        write_transactions_json(&[row()], &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"schema_version\": \"1.0.0\""));
        assert!(text.contains("\"payee\": \"Landlord\""));

        let parsed = read_transactions_json(&text).unwrap();
        assert_eq!(parsed.row_count, 1);
        assert_eq!(parsed.transactions[0], row());
    }

    #[test]
    fn test_row_count_mismatch_rejected() {
        let mut export = TransactionExport::new(&[row()]);
        export.row_count = 3;
        let text = serde_json::to_string(&export).unwrap();
        assert!(read_transactions_json(&text).is_err());
    }
}

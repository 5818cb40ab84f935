//! YAML export

use std::io::Write;

use crate::error::{LedgerError, LedgerResult};

use super::json::TransactionExport;
use super::ExportRow;

/// Write rows as YAML, preceded by a comment header
pub fn write_transactions_yaml<W: Write>(rows: &[ExportRow], mut writer: W) -> LedgerResult<()> {
    let export = TransactionExport::new(rows);

    writeln!(writer, "# pocket-ledger transaction export")
        .map_err(|e| LedgerError::Export(e.to_string()))?;
    writeln!(writer, "# Generated: {}", export.exported_at)
        .map_err(|e| LedgerError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| LedgerError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| LedgerError::Export(e.to_string()))
}

/// Parse a YAML export back into its document
pub fn read_transactions_yaml(content: &str) -> LedgerResult<TransactionExport> {
    let export: TransactionExport = serde_yaml::from_str(content)?;
    export.validate().map_err(LedgerError::Export)?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_export() {
        let row = ExportRow {
            date: "05.01.2024".into(),
            account: "Checking".into(),
            currency: "EUR".into(),
            payee: "Grocer".into(),
            category: "Food".into(),
            payment_method: "Cash".into(),
            memo: "weekly".into(),
            amount: "-45.10".into(),
        };

        let mut out = Vec::new();
        write_transactions_yaml(&[row.clone()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("# pocket-ledger transaction export"));
        assert!(text.contains("Grocer"));

        // Comment lines are ignored by the parser
        let parsed = read_transactions_yaml(&text).unwrap();
        assert_eq!(parsed.transactions, vec![row]);
    }
}

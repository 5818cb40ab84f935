//! CSV export
//!
//! The column layout is what the spreadsheet tool imports, so the header is
//! fixed.

use std::io::Write;

use crate::error::{LedgerError, LedgerResult};

use super::ExportRow;

/// Header row of every CSV export
pub const CSV_HEADER: [&str; 8] = [
    "Date",
    "Account",
    "Currency",
    "Payee",
    "Category",
    "Payment Method",
    "Memo",
    "Amount",
];

/// Write rows as CSV with the standard header
pub fn write_transactions_csv<W: Write>(rows: &[ExportRow], writer: W) -> LedgerResult<()> {
    let mut csv = ::csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    for row in rows {
        csv.write_record([
            row.date.as_str(),
            row.account.as_str(),
            row.currency.as_str(),
            row.payee.as_str(),
            row.category.as_str(),
            row.payment_method.as_str(),
            row.memo.as_str(),
            row.amount.as_str(),
        ])?;
    }

    csv.flush().map_err(|e| LedgerError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(payee: &str, memo: &str, amount: &str) -> ExportRow {
        ExportRow {
            date: "2024-01-05".into(),
            account: "Checking".into(),
            currency: "EUR".into(),
            payee: payee.into(),
            category: "Rent".into(),
            payment_method: "Bank transfer".into(),
            memo: memo.into(),
            amount: amount.into(),
        }
    }

    #[test]
    fn test_header_and_rows() {
        let mut out = Vec::new();
        write_transactions_csv(&[row("Landlord", "", "-1200.00")], &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Date,Account,Currency,Payee,Category,Payment Method,Memo,Amount")
        );
        assert_eq!(
            lines.next(),
            Some("2024-01-05,Checking,EUR,Landlord,Rent,Bank transfer,,-1200.00")
        );
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let mut out = Vec::new();
        write_transactions_csv(&[row("Smith, J.", "say \"hi\"", "5.00")], &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"Smith, J.\""));
        assert!(text.contains("\"say \"\"hi\"\"\""));
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let mut out = Vec::new();
        write_transactions_csv(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}

//! Account display formatting
//!
//! Formats accounts for terminal output in table and detail views.

use std::collections::BTreeMap;

use tabled::Tabled;

use super::{render_table, DisplayOptions};
use crate::models::Money;
use crate::services::aggregation::AccountSummary;

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Currency")]
    currency: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Txns")]
    transactions: usize,
}

/// Format a list of accounts with balances as a table
pub fn format_account_list(summaries: &[AccountSummary], options: &DisplayOptions) -> String {
    if summaries.is_empty() {
        return "No accounts found.".to_string();
    }

    render_table(summaries.iter().map(|s| AccountRow {
        id: s.account.id.short(),
        name: s.account.name.clone(),
        currency: s.account.currency.clone(),
        balance: options.money(s.balance),
        transactions: s.transaction_count,
    }))
}

/// Format per-currency balance totals
///
/// Amounts in different currencies are never added together.
pub fn format_currency_totals(
    totals: &BTreeMap<String, Money>,
    options: &DisplayOptions,
) -> String {
    let mut output = String::new();
    for (currency, total) in totals {
        output.push_str(&format!("TOTAL {}\n", options.money_in(*total, currency)));
    }
    output
}

/// Format a single account's details
pub fn format_account_details(summary: &AccountSummary, options: &DisplayOptions) -> String {
    let account = &summary.account;
    let currency = account.currency.as_str();

    let mut output = String::new();
    output.push_str(&format!("Account: {}\n", account.name));
    output.push_str(&format!("  ID:               {}\n", account.id));
    output.push_str(&format!("  Currency:         {}\n", currency));
    output.push('\n');
    output.push_str(&format!(
        "  Initial Balance:  {}\n",
        options.money_in(account.initial_balance, currency)
    ));
    output.push_str(&format!(
        "  Current Balance:  {}\n",
        options.money_in(summary.balance, currency)
    ));
    output.push_str(&format!("  Transactions:     {}\n", summary.transaction_count));

    if !account.notes.is_empty() {
        output.push('\n');
        output.push_str(&format!("  Notes: {}\n", account.notes));
    }

    output.push('\n');
    output.push_str(&format!(
        "  Created:  {}\n",
        account.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output.push_str(&format!(
        "  Modified: {}\n",
        account.updated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Account;

    fn create_test_summary(name: &str, currency: &str, balance: i64) -> AccountSummary {
        AccountSummary {
            account: Account::with_initial_balance(name, currency, Money::from_cents(0)),
            balance: Money::from_cents(balance),
            transaction_count: 2,
        }
    }

    #[test]
    fn test_format_account_list() {
        let summaries = vec![
            create_test_summary("Checking", "EUR", 100000),
            create_test_summary("Savings", "USD", 500050),
        ];

        let output = format_account_list(&summaries, &DisplayOptions::default());
        assert!(output.contains("Checking"));
        assert!(output.contains("Savings"));
        assert!(output.contains("1000.00"));
        assert!(output.contains("5000.50"));
    }

    #[test]
    fn test_format_anonymized_list() {
        let summaries = vec![create_test_summary("Checking", "EUR", 100000)];
        let options = DisplayOptions {
            anonymize: true,
            ..Default::default()
        };

        let output = format_account_list(&summaries, &options);
        assert!(output.contains("Checking"));
        assert!(output.contains("****"));
        assert!(!output.contains("1000.00"));
    }

    #[test]
    fn test_format_empty_list() {
        let output = format_account_list(&[], &DisplayOptions::default());
        assert!(output.contains("No accounts found"));
    }

    #[test]
    fn test_format_currency_totals() {
        let mut totals = BTreeMap::new();
        totals.insert("EUR".to_string(), Money::from_cents(1000));
        totals.insert("USD".to_string(), Money::from_cents(-250));

        let output = format_currency_totals(&totals, &DisplayOptions::default());
        assert_eq!(output, "TOTAL 10.00 EUR\nTOTAL -2.50 USD\n");
    }

    #[test]
    fn test_format_account_details() {
        let summary = create_test_summary("My Account", "EUR", 100000);
        let output = format_account_details(&summary, &DisplayOptions::default());

        assert!(output.contains("My Account"));
        assert!(output.contains("Current Balance:  1000.00 EUR"));
    }
}

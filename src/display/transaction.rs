//! Transaction display formatting
//!
//! Provides register (table) and detail views for transactions and
//! transfer pairs.

use std::collections::HashMap;

use tabled::Tabled;

use super::{render_table, truncate, DisplayOptions};
use crate::models::{Account, AccountId, CategoryId, Transaction};
use crate::services::transfer::TransferPair;

/// Names used to resolve ids in transaction output
#[derive(Debug, Default)]
pub struct NameLookup {
    pub accounts: HashMap<AccountId, Account>,
    pub categories: HashMap<CategoryId, String>,
}

impl NameLookup {
    fn account(&self, id: AccountId) -> String {
        self.accounts
            .get(&id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| id.short())
    }

    fn currency(&self, id: AccountId) -> &str {
        self.accounts
            .get(&id)
            .map(|a| a.currency.as_str())
            .unwrap_or_default()
    }

    fn category(&self, id: Option<CategoryId>) -> String {
        id.and_then(|id| self.categories.get(&id).cloned())
            .unwrap_or_default()
    }
}

#[derive(Tabled)]
struct RegisterRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Payee")]
    payee: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Flags")]
    flags: String,
}

/// "T" for a transfer leg, "E" for exported
fn flags(txn: &Transaction) -> String {
    let mut flags = String::new();
    if txn.is_transfer() {
        flags.push('T');
    }
    if txn.exported {
        flags.push('E');
    }
    flags
}

/// Format a list of transactions as a register
pub fn format_transaction_register(
    transactions: &[Transaction],
    names: &NameLookup,
    options: &DisplayOptions,
) -> String {
    if transactions.is_empty() {
        return "No transactions found.".to_string();
    }

    render_table(transactions.iter().map(|txn| RegisterRow {
        id: txn.id.short(),
        date: options.date(txn.date),
        account: names.account(txn.account_id),
        payee: truncate(&txn.payee, 24),
        category: names.category(txn.category_id),
        amount: options.money(txn.amount),
        flags: flags(txn),
    }))
}

/// Format transaction details for display
pub fn format_transaction_details(
    txn: &Transaction,
    names: &NameLookup,
    options: &DisplayOptions,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("Date:        {}\n", options.date(txn.date)));
    output.push_str(&format!("Account:     {}\n", names.account(txn.account_id)));
    output.push_str(&format!(
        "Amount:      {}\n",
        options.money_in(txn.amount, names.currency(txn.account_id))
    ));

    if !txn.payee.is_empty() {
        output.push_str(&format!("Payee:       {}\n", txn.payee));
    }

    match txn.category_id {
        Some(id) => match names.categories.get(&id) {
            Some(name) => output.push_str(&format!("Category:    {}\n", name)),
            None => output.push_str(&format!("Category:    (deleted {})\n", id.short())),
        },
        None => output.push_str("Category:    (uncategorized)\n"),
    }

    let payment = txn.payment_type.to_string();
    if !payment.is_empty() {
        output.push_str(&format!("Payment:     {}\n", payment));
    }

    if !txn.memo.is_empty() {
        output.push_str(&format!("Memo:        {}\n", txn.memo));
    }

    if let Some(transfer_id) = txn.transfer_id {
        output.push_str(&format!("Transfer:    {}\n", transfer_id));
    }

    if let Some(manifest_id) = txn.export_manifest_id {
        output.push_str(&format!("Exported:    {}\n", manifest_id.short()));
    }

    output
}

/// Format both legs of a transfer
pub fn format_transfer_pair(
    pair: &TransferPair,
    names: &NameLookup,
    options: &DisplayOptions,
) -> String {
    let mut output = String::new();

    if let Some(transfer_id) = pair.transfer_id() {
        output.push_str(&format!("Transfer: {}\n", transfer_id));
    }
    output.push_str(&format!("Date:     {}\n", options.date(pair.outflow.date)));
    output.push_str(&format!(
        "From:     {} ({})  {}\n",
        names.account(pair.outflow.account_id),
        pair.outflow.id.short(),
        options.money_in(pair.outflow.amount, names.currency(pair.outflow.account_id))
    ));
    output.push_str(&format!(
        "To:       {} ({})  {}\n",
        names.account(pair.inflow.account_id),
        pair.inflow.id.short(),
        options.money_in(pair.inflow.amount, names.currency(pair.inflow.account_id))
    ));
    if !pair.outflow.memo.is_empty() {
        output.push_str(&format!("Memo:     {}\n", pair.outflow.memo));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, TransferId};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    fn lookup(accounts: &[&Account]) -> NameLookup {
        NameLookup {
            accounts: accounts.iter().map(|a| (a.id, (*a).clone())).collect(),
            categories: HashMap::new(),
        }
    }

    #[test]
    fn test_format_register() {
        let account = Account::new("Checking", "EUR");
        let mut txn = Transaction::new(account.id, date(), Money::from_cents(-5000));
        txn.payee = "Test Store".to_string();
        txn.exported = true;

        let output =
            format_transaction_register(&[txn], &lookup(&[&account]), &DisplayOptions::default());
        assert!(output.contains("Test Store"));
        assert!(output.contains("Checking"));
        assert!(output.contains("2024-01-05"));
        assert!(output.contains("-50.00"));
        assert!(output.contains('E'));
    }

    #[test]
    fn test_format_empty_register() {
        let output =
            format_transaction_register(&[], &NameLookup::default(), &DisplayOptions::default());
        assert!(output.contains("No transactions found"));
    }

    #[test]
    fn test_format_details() {
        let account = Account::new("Checking", "EUR");
        let mut txn = Transaction::new(account.id, date(), Money::from_cents(-5000));
        txn.payee = "Test Store".to_string();
        txn.memo = "Weekly groceries".to_string();
        txn.category_id = Some(CategoryId::new());

        let output =
            format_transaction_details(&txn, &lookup(&[&account]), &DisplayOptions::default());
        assert!(output.contains("Amount:      -50.00 EUR"));
        assert!(output.contains("Weekly groceries"));
        assert!(output.contains("(deleted"));
    }

    #[test]
    fn test_format_transfer_pair_masked() {
        let a = Account::new("A", "EUR");
        let b = Account::new("B", "USD");
        let transfer_id = TransferId::new();
        let mut outflow = Transaction::new(a.id, date(), Money::from_cents(-10000));
        outflow.transfer_id = Some(transfer_id);
        let mut inflow = Transaction::new(b.id, date(), Money::from_cents(10850));
        inflow.transfer_id = Some(transfer_id);
        let pair = TransferPair { outflow, inflow };

        let options = DisplayOptions {
            anonymize: true,
            ..Default::default()
        };
        let output = format_transfer_pair(&pair, &lookup(&[&a, &b]), &options);
        assert!(output.contains("From:     A"));
        assert!(output.contains("**** USD"));
        assert!(!output.contains("108.50"));
    }
}

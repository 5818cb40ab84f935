//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod account;
pub mod category;
pub mod check;
pub mod export;
pub mod import;
pub mod payee;
pub mod settings;
pub mod transaction;
pub mod transfer;

pub use account::{handle_account_command, AccountCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use check::handle_check_command;
pub use export::{handle_export_command, ExportCommands};
pub use import::{handle_import_command, ImportCommands};
pub use payee::{handle_payee_command, PayeeCommands};
pub use settings::{handle_settings_command, SettingsCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};
pub use transfer::{handle_transfer_command, TransferCommands};

use chrono::NaiveDate;

use crate::config::Settings;
use crate::display::{DisplayOptions, NameLookup};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Account, Category, Money, PaymentMethod, Transaction};
use crate::services::{AccountService, CategoryService, TransactionService};
use crate::storage::Storage;

/// Parse a user-entered amount
pub(crate) fn parse_money(input: &str) -> LedgerResult<Money> {
    Money::parse(input).map_err(|e| {
        LedgerError::Validation(format!(
            "Invalid amount: '{}'. Use a format like '100.00' or '100'. Error: {}",
            input, e
        ))
    })
}

/// Parse a user-entered date in the configured format (ISO always works)
pub(crate) fn parse_date(storage: &Storage, input: &str) -> LedgerResult<NaiveDate> {
    let format = Settings::load(storage)?.date_format;
    format.parse_date(input).ok_or_else(|| {
        LedgerError::Validation(format!(
            "Invalid date: '{}'. Expected {} or YYYY-MM-DD",
            input, format
        ))
    })
}

/// A date argument, defaulting to today
pub(crate) fn date_or_today(storage: &Storage, input: Option<&str>) -> LedgerResult<NaiveDate> {
    match input {
        Some(input) => parse_date(storage, input),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

pub(crate) fn parse_payment(input: &str) -> LedgerResult<PaymentMethod> {
    PaymentMethod::parse(input).ok_or_else(|| {
        LedgerError::Validation(format!(
            "Unknown payment method: '{}'. Use a code or one of: cash, debit-card, \
             credit-card, bank-transfer, direct-debit, cheque, online, other",
            input
        ))
    })
}

pub(crate) fn resolve_account(storage: &Storage, identifier: &str) -> LedgerResult<Account> {
    AccountService::new(storage)
        .find(identifier)?
        .ok_or_else(|| LedgerError::account_not_found(identifier))
}

pub(crate) fn resolve_category(storage: &Storage, identifier: &str) -> LedgerResult<Category> {
    CategoryService::new(storage)
        .find(identifier)?
        .ok_or_else(|| LedgerError::category_not_found(identifier))
}

pub(crate) fn resolve_transaction(
    storage: &Storage,
    identifier: &str,
) -> LedgerResult<Transaction> {
    TransactionService::new(storage)
        .find(identifier)?
        .ok_or_else(|| LedgerError::transaction_not_found(identifier))
}

pub(crate) fn display_options(storage: &Storage) -> LedgerResult<DisplayOptions> {
    Ok(DisplayOptions::from_settings(&Settings::load(storage)?))
}

/// Account and category names for transaction output
pub(crate) fn name_lookup(storage: &Storage) -> LedgerResult<NameLookup> {
    Ok(NameLookup {
        accounts: storage
            .accounts
            .get_all()?
            .into_iter()
            .map(|a| (a.id, a))
            .collect(),
        categories: storage
            .categories
            .get_all()?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect(),
    })
}

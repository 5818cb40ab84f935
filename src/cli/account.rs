//! Account CLI commands
//!
//! Implements CLI commands for account management.

use clap::Subcommand;

use super::{display_options, parse_money, resolve_account};
use crate::display::{format_account_details, format_account_list, format_currency_totals};
use crate::error::LedgerResult;
use crate::models::Money;
use crate::services::{AccountChanges, AccountService, AggregationService};
use crate::storage::Storage;

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account name
        name: String,
        /// Currency code (defaults to the `default_currency` setting)
        #[arg(short, long)]
        currency: Option<String>,
        /// Initial balance (e.g., "1000.00" or "-250")
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        balance: String,
        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List all accounts with balances
    List,
    /// Show account details
    Show {
        /// Account name or ID
        account: String,
    },
    /// Edit an account
    Edit {
        /// Account name or ID
        account: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New currency code
        #[arg(short, long)]
        currency: Option<String>,
        /// New initial balance
        #[arg(short, long, allow_hyphen_values = true)]
        balance: Option<String>,
        /// New notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an account and all of its transactions
    Delete {
        /// Account name or ID
        account: String,
    },
    /// Rename a currency code on every account that uses it
    RenameCurrency {
        /// Current code
        old: String,
        /// Replacement code
        new: String,
    },
}

/// Handle an account command
pub fn handle_account_command(storage: &Storage, cmd: AccountCommands) -> LedgerResult<()> {
    let service = AccountService::new(storage);

    match cmd {
        AccountCommands::Create {
            name,
            currency,
            balance,
            notes,
        } => {
            let initial_balance = parse_money(&balance)?;
            let account =
                service.create(&name, currency.as_deref(), initial_balance, notes.as_deref())?;

            println!("Created account: {}", account.name);
            println!("  Currency: {}", account.currency);
            println!(
                "  Initial Balance: {}",
                display_options(storage)?.money(account.initial_balance)
            );
            println!("  ID: {}", account.id);
        }

        AccountCommands::List => {
            let aggregation = AggregationService::new(storage);
            let summaries = aggregation.account_summaries()?;
            let options = display_options(storage)?;

            println!("{}", format_account_list(&summaries, &options));
            if !summaries.is_empty() {
                print!(
                    "{}",
                    format_currency_totals(&aggregation.totals_by_currency()?, &options)
                );
            }
        }

        AccountCommands::Show { account } => {
            let found = resolve_account(storage, &account)?;
            let summary = AggregationService::new(storage).account_summary(found.id)?;
            print!(
                "{}",
                format_account_details(&summary, &display_options(storage)?)
            );
        }

        AccountCommands::Edit {
            account,
            name,
            currency,
            balance,
            notes,
        } => {
            let found = resolve_account(storage, &account)?;

            if name.is_none() && currency.is_none() && balance.is_none() && notes.is_none() {
                println!("No changes specified. Use --name, --currency, --balance or --notes.");
                return Ok(());
            }

            let initial_balance: Option<Money> = balance.as_deref().map(parse_money).transpose()?;
            let updated = service.update(
                found.id,
                AccountChanges {
                    name,
                    currency,
                    initial_balance,
                    notes,
                },
            )?;
            println!("Updated account: {}", updated.name);
        }

        AccountCommands::Delete { account } => {
            let found = resolve_account(storage, &account)?;
            let deleted = service.delete(found.id)?;

            println!("Deleted account: {}", deleted.account.name);
            println!("  Transactions removed: {}", deleted.transactions_removed);
            if deleted.transfer_legs_removed > 0 {
                println!(
                    "  Transfer legs removed from other accounts: {}",
                    deleted.transfer_legs_removed
                );
            }
        }

        AccountCommands::RenameCurrency { old, new } => {
            let changed = service.rename_currency(&old, &new)?;
            println!("Renamed {} to {} on {} account(s)", old, new, changed);
        }
    }

    Ok(())
}

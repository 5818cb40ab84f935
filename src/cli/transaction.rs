//! Transaction CLI commands
//!
//! Implements CLI commands for adding, editing, listing and deleting
//! transactions. Adding with `--kind transfer` creates a transfer pair.

use clap::Subcommand;

use super::{
    date_or_today, display_options, name_lookup, parse_date, parse_money, parse_payment,
    resolve_account, resolve_category, resolve_transaction,
};
use crate::display::{format_transaction_details, format_transaction_register, format_transfer_pair};
use crate::error::{LedgerError, LedgerResult};
use crate::services::{
    CreateTransactionInput, Created, TransactionFilter, TransactionKind, TransactionService,
    UpdateTransactionInput,
};
use crate::storage::Storage;

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Add a new transaction
    Add {
        /// Account name or ID
        account: String,
        /// Amount; a leading "-" means expense unless --kind is given
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Kind of entry (expense, income, transfer)
        #[arg(short, long)]
        kind: Option<String>,
        /// Target account for transfers
        #[arg(long)]
        to: Option<String>,
        /// Amount arriving on the target account, when it differs
        #[arg(long)]
        to_amount: Option<String>,
        /// Payee text
        #[arg(short, long)]
        payee: Option<String>,
        /// Category name or ID
        #[arg(short, long)]
        category: Option<String>,
        /// Payment method
        #[arg(long)]
        payment: Option<String>,
        /// Transaction date (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Memo
        #[arg(short, long)]
        memo: Option<String>,
    },
    /// List transactions, newest first
    List {
        /// Filter by account
        #[arg(short, long)]
        account: Option<String>,
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
        /// Filter by payee text
        #[arg(short, long)]
        payee: Option<String>,
        /// Earliest date
        #[arg(long)]
        from: Option<String>,
        /// Latest date
        #[arg(long)]
        until: Option<String>,
        /// Only exported (true) or not yet exported (false) rows
        #[arg(long)]
        exported: Option<bool>,
        /// Number of transactions to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },
    /// Show transaction details
    Show {
        /// Transaction ID
        id: String,
    },
    /// Edit a transaction (transfer legs are edited as a pair)
    Edit {
        /// Transaction ID
        id: String,
        /// New signed amount
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<String>,
        /// New date
        #[arg(short, long)]
        date: Option<String>,
        /// New payee text
        #[arg(short, long)]
        payee: Option<String>,
        /// New memo
        #[arg(short, long)]
        memo: Option<String>,
        /// New category name or ID
        #[arg(short, long, conflicts_with = "clear_category")]
        category: Option<String>,
        /// Remove the category
        #[arg(long)]
        clear_category: bool,
        /// New payment method
        #[arg(long)]
        payment: Option<String>,
        /// Move to another account
        #[arg(short, long)]
        account: Option<String>,
    },
    /// Delete a transaction (both legs for a transfer)
    Delete {
        /// Transaction ID
        id: String,
    },
}

/// Handle a transaction command
pub fn handle_transaction_command(storage: &Storage, cmd: TransactionCommands) -> LedgerResult<()> {
    let service = TransactionService::new(storage);

    match cmd {
        TransactionCommands::Add {
            account,
            amount,
            kind,
            to,
            to_amount,
            payee,
            category,
            payment,
            date,
            memo,
        } => {
            let account = resolve_account(storage, &account)?;
            let amount = parse_money(&amount)?;
            let kind = match kind {
                Some(kind) => TransactionKind::parse(&kind).ok_or_else(|| {
                    LedgerError::Validation(format!(
                        "Invalid kind: '{}'. Use expense, income or transfer",
                        kind
                    ))
                })?,
                None if to.is_some() => TransactionKind::Transfer,
                None if amount.is_negative() => TransactionKind::Expense,
                None => TransactionKind::Income,
            };

            let mut input = CreateTransactionInput::new(
                kind,
                account.id,
                amount.abs(),
                date_or_today(storage, date.as_deref())?,
            );
            input.payee = payee;
            input.memo = memo;
            input.category_id = match category {
                Some(category) => Some(resolve_category(storage, &category)?.id),
                None => None,
            };
            input.payment_type = payment.as_deref().map(parse_payment).transpose()?;
            input.target_account_id = match to {
                Some(to) => Some(resolve_account(storage, &to)?.id),
                None => None,
            };
            input.target_amount = to_amount
                .as_deref()
                .map(parse_money)
                .transpose()?
                .map(|m| m.abs());

            let names = name_lookup(storage)?;
            let options = display_options(storage)?;
            match service.create(input)? {
                Created::Single(txn) => {
                    println!("Created transaction {}", txn.id.short());
                    print!("{}", format_transaction_details(&txn, &names, &options));
                }
                Created::Transfer(pair) => {
                    println!("Created transfer");
                    print!("{}", format_transfer_pair(&pair, &names, &options));
                }
            }
        }

        TransactionCommands::List {
            account,
            category,
            payee,
            from,
            until,
            exported,
            limit,
        } => {
            let mut filter = TransactionFilter::new().limit(limit);
            if let Some(account) = account {
                filter = filter.account(resolve_account(storage, &account)?.id);
            }
            if let Some(category) = category {
                filter = filter.category(resolve_category(storage, &category)?.id);
            }
            if let Some(payee) = payee {
                filter = filter.payee(payee);
            }
            if let Some(from) = from {
                filter.start_date = Some(parse_date(storage, &from)?);
            }
            if let Some(until) = until {
                filter.end_date = Some(parse_date(storage, &until)?);
            }
            if let Some(exported) = exported {
                filter = filter.exported(exported);
            }

            let transactions = service.list(filter)?;
            println!(
                "{}",
                format_transaction_register(
                    &transactions,
                    &name_lookup(storage)?,
                    &display_options(storage)?
                )
            );
        }

        TransactionCommands::Show { id } => {
            let txn = resolve_transaction(storage, &id)?;
            print!(
                "{}",
                format_transaction_details(&txn, &name_lookup(storage)?, &display_options(storage)?)
            );
        }

        TransactionCommands::Edit {
            id,
            amount,
            date,
            payee,
            memo,
            category,
            clear_category,
            payment,
            account,
        } => {
            let txn = resolve_transaction(storage, &id)?;

            let category_id = if clear_category {
                Some(None)
            } else if let Some(category) = category {
                Some(Some(resolve_category(storage, &category)?.id))
            } else {
                None
            };
            let input = UpdateTransactionInput {
                amount: amount.as_deref().map(parse_money).transpose()?,
                date: date.as_deref().map(|d| parse_date(storage, d)).transpose()?,
                payee,
                memo,
                category_id,
                payment_type: payment.as_deref().map(parse_payment).transpose()?,
                account_id: match account {
                    Some(account) => Some(resolve_account(storage, &account)?.id),
                    None => None,
                },
                ..Default::default()
            };

            let updated = service.update(txn.id, input)?;
            println!("Updated transaction {}", updated.id.short());
        }

        TransactionCommands::Delete { id } => {
            let txn = resolve_transaction(storage, &id)?;
            let deleted = service.delete(txn.id)?;
            if deleted.len() > 1 {
                println!("Deleted transfer ({} legs)", deleted.len());
            } else {
                println!("Deleted transaction {}", txn.id.short());
            }
        }
    }

    Ok(())
}

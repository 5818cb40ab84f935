//! CLI commands for account transfers
//!
//! A transfer is a linked pair of transactions; every command here works
//! on both legs, addressed through either one.

use clap::Subcommand;

use super::{
    date_or_today, display_options, name_lookup, parse_date, parse_money, resolve_account,
    resolve_category, resolve_transaction,
};
use crate::display::{format_transaction_details, format_transfer_pair};
use crate::error::LedgerResult;
use crate::services::{CreateTransfer, TransferChanges, TransferService};
use crate::storage::Storage;

/// Transfer subcommands
#[derive(Subcommand)]
pub enum TransferCommands {
    /// Move money from one account to another
    Create {
        /// Source account name or ID
        from: String,
        /// Target account name or ID
        to: String,
        /// Amount leaving the source account
        amount: String,
        /// Amount arriving on the target account (cross-currency)
        #[arg(long)]
        to_amount: Option<String>,
        /// Transfer date (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Memo for both legs
        #[arg(short, long)]
        memo: Option<String>,
        /// Payee text for both legs instead of "Transfer to/from ..."
        #[arg(short, long)]
        payee: Option<String>,
        /// Category for the outflow leg
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show both legs of a transfer
    Show {
        /// ID of either leg
        id: String,
    },
    /// Edit a transfer
    Edit {
        /// ID of either leg
        id: String,
        /// New outflow amount (mirrored unless --to-amount is given)
        #[arg(long)]
        amount: Option<String>,
        /// New inflow amount
        #[arg(long)]
        to_amount: Option<String>,
        /// Move the outflow leg to this account
        #[arg(long)]
        from: Option<String>,
        /// Move the inflow leg to this account
        #[arg(long)]
        to: Option<String>,
        /// New date for both legs
        #[arg(short, long)]
        date: Option<String>,
        /// New memo for both legs
        #[arg(short, long)]
        memo: Option<String>,
    },
    /// Delete a transfer (both legs)
    Delete {
        /// ID of either leg
        id: String,
    },
    /// Turn a leg whose sibling is gone into a plain transaction
    Detach {
        /// ID of the orphaned leg
        id: String,
    },
}

/// Handle a transfer command
pub fn handle_transfer_command(storage: &Storage, cmd: TransferCommands) -> LedgerResult<()> {
    let service = TransferService::new(storage);

    match cmd {
        TransferCommands::Create {
            from,
            to,
            amount,
            to_amount,
            date,
            memo,
            payee,
            category,
        } => {
            let source = resolve_account(storage, &from)?;
            let target = resolve_account(storage, &to)?;

            let mut input = CreateTransfer::new(
                source.id,
                target.id,
                parse_money(&amount)?,
                date_or_today(storage, date.as_deref())?,
            );
            input.target_amount = to_amount.as_deref().map(parse_money).transpose()?;
            input.memo = memo.unwrap_or_default();
            input.payee = payee;
            input.category_id = match category {
                Some(category) => Some(resolve_category(storage, &category)?.id),
                None => None,
            };

            let pair = service.create(input)?;
            println!("Transfer created:");
            print!(
                "{}",
                format_transfer_pair(&pair, &name_lookup(storage)?, &display_options(storage)?)
            );
        }

        TransferCommands::Show { id } => {
            let leg = resolve_transaction(storage, &id)?;
            let pair = service.pair(leg.id)?;
            print!(
                "{}",
                format_transfer_pair(&pair, &name_lookup(storage)?, &display_options(storage)?)
            );
        }

        TransferCommands::Edit {
            id,
            amount,
            to_amount,
            from,
            to,
            date,
            memo,
        } => {
            let leg = resolve_transaction(storage, &id)?;
            let pair = service.pair(leg.id)?;

            let changes = TransferChanges {
                amount: amount.as_deref().map(parse_money).transpose()?,
                target_amount: to_amount.as_deref().map(parse_money).transpose()?,
                source_account: match from {
                    Some(from) => Some(resolve_account(storage, &from)?.id),
                    None => None,
                },
                target_account: match to {
                    Some(to) => Some(resolve_account(storage, &to)?.id),
                    None => None,
                },
                date: date.as_deref().map(|d| parse_date(storage, d)).transpose()?,
                memo,
                ..Default::default()
            };

            let pair = service.edit(pair.outflow.id, changes)?;
            println!("Transfer updated:");
            print!(
                "{}",
                format_transfer_pair(&pair, &name_lookup(storage)?, &display_options(storage)?)
            );
        }

        TransferCommands::Delete { id } => {
            let leg = resolve_transaction(storage, &id)?;
            let pair = service.delete(leg.id)?;
            println!(
                "Deleted transfer ({} and {})",
                pair.outflow.id.short(),
                pair.inflow.id.short()
            );
        }

        TransferCommands::Detach { id } => {
            let leg = resolve_transaction(storage, &id)?;
            let txn = service.detach_orphan(leg.id)?;
            println!("Detached orphaned leg:");
            print!(
                "{}",
                format_transaction_details(&txn, &name_lookup(storage)?, &display_options(storage)?)
            );
        }
    }

    Ok(())
}

//! Payee CLI commands
//!
//! Implements CLI commands for payee management.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Subcommand;

use super::{display_options, parse_payment, resolve_category};
use crate::display::format_payee_list;
use crate::error::{LedgerError, LedgerResult};
use crate::models::Payee;
use crate::services::{AggregationService, PayeeService};
use crate::storage::Storage;

/// Payee subcommands
#[derive(Subcommand)]
pub enum PayeeCommands {
    /// List all payees with their defaults and usage
    List,
    /// Create a payee
    Create {
        /// Payee name (unique, case-sensitive)
        name: String,
        /// Default category name or ID
        #[arg(short, long)]
        category: Option<String>,
        /// Default payment method
        #[arg(short, long)]
        payment: Option<String>,
    },
    /// Rename a payee or change its defaults
    Edit {
        /// Payee name or ID
        payee: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// Default category name or ID
        #[arg(short, long, conflicts_with = "clear_category")]
        category: Option<String>,
        /// Remove the default category
        #[arg(long)]
        clear_category: bool,
        /// Default payment method
        #[arg(short, long, conflicts_with = "clear_payment")]
        payment: Option<String>,
        /// Remove the default payment method
        #[arg(long)]
        clear_payment: bool,
    },
    /// Delete a payee (transactions keep their payee text)
    Delete {
        /// Payee name or ID
        payee: String,
    },
    /// Create payees from a file with one name per line
    Import {
        /// Path to the file
        file: PathBuf,
        /// Fail on the first existing name instead of skipping it
        #[arg(long)]
        strict: bool,
    },
}

fn resolve_payee(service: &PayeeService, identifier: &str) -> LedgerResult<Payee> {
    service
        .find(identifier)?
        .ok_or_else(|| LedgerError::payee_not_found(identifier))
}

/// Handle a payee command
pub fn handle_payee_command(storage: &Storage, cmd: PayeeCommands) -> LedgerResult<()> {
    let service = PayeeService::new(storage);

    match cmd {
        PayeeCommands::List => {
            let summaries = AggregationService::new(storage).payee_summaries()?;
            let category_names: HashMap<_, _> = storage
                .categories
                .get_all()?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect();
            println!(
                "{}",
                format_payee_list(&summaries, &category_names, &display_options(storage)?)
            );
        }

        PayeeCommands::Create {
            name,
            category,
            payment,
        } => {
            let category_id = match category {
                Some(category) => Some(resolve_category(storage, &category)?.id),
                None => None,
            };
            let payment = payment.as_deref().map(parse_payment).transpose()?;

            let payee = service.create(&name, category_id, payment)?;
            println!("Created payee: {}", payee.name);
            println!("  ID: {}", payee.id);
        }

        PayeeCommands::Edit {
            payee,
            name,
            category,
            clear_category,
            payment,
            clear_payment,
        } => {
            let found = resolve_payee(&service, &payee)?;

            let category_id = if clear_category {
                Some(None)
            } else if let Some(category) = category {
                Some(Some(resolve_category(storage, &category)?.id))
            } else {
                None
            };
            let payment_type = if clear_payment {
                Some(None)
            } else {
                payment.as_deref().map(parse_payment).transpose()?.map(Some)
            };

            if name.is_none() && category_id.is_none() && payment_type.is_none() {
                println!("No changes specified.");
                return Ok(());
            }

            let updated = storage.transaction(|_| {
                let mut updated = found;
                if let Some(name) = &name {
                    updated = service.rename(updated.id, name)?;
                }
                if category_id.is_some() || payment_type.is_some() {
                    updated = service.set_defaults(updated.id, category_id, payment_type)?;
                }
                Ok(updated)
            })?;
            println!("Updated payee: {}", updated.name);
        }

        PayeeCommands::Delete { payee } => {
            let found = resolve_payee(&service, &payee)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted payee: {}", deleted.name);
        }

        PayeeCommands::Import { file, strict } => {
            let content = std::fs::read_to_string(&file).map_err(|e| {
                LedgerError::Import(format!("Failed to read {}: {}", file.display(), e))
            })?;
            let names: Vec<String> = content.lines().map(str::to_string).collect();

            let result = service.import_payees(&names, !strict)?;
            println!(
                "Created {} payee(s), skipped {} duplicate(s).",
                result.created, result.duplicates_skipped
            );
        }
    }

    Ok(())
}

//! Category CLI commands
//!
//! Implements CLI commands for category tree management.

use clap::Subcommand;

use super::{display_options, resolve_category};
use crate::display::format_category_tree;
use crate::error::{LedgerError, LedgerResult};
use crate::models::FlowType;
use crate::services::{AggregationService, CategoryChanges, CategoryService};
use crate::storage::Storage;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List all categories as a tree with usage
    List,

    /// Create a new category
    Create {
        /// Category name
        name: String,
        /// Flow type (income, expense, neutral)
        #[arg(short = 't', long = "type", default_value = "expense")]
        flow: String,
        /// Parent category name or ID
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Edit a category
    Edit {
        /// Category name or ID
        category: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New flow type
        #[arg(short = 't', long = "type")]
        flow: Option<String>,
        /// Move under this parent category
        #[arg(short, long, conflicts_with = "top_level")]
        parent: Option<String>,
        /// Move to the top level
        #[arg(long)]
        top_level: bool,
    },

    /// Delete a category; its children move up one level
    Delete {
        /// Category name or ID
        category: String,
    },
}

fn parse_flow(input: &str) -> LedgerResult<FlowType> {
    FlowType::parse(input).ok_or_else(|| {
        LedgerError::Validation(format!(
            "Invalid category type: '{}'. Valid types: income, expense, neutral",
            input
        ))
    })
}

/// Handle a category command
pub fn handle_category_command(storage: &Storage, cmd: CategoryCommands) -> LedgerResult<()> {
    let service = CategoryService::new(storage);

    match cmd {
        CategoryCommands::List => {
            let summaries = AggregationService::new(storage).category_summaries()?;
            println!(
                "{}",
                format_category_tree(&summaries, &display_options(storage)?)
            );
        }

        CategoryCommands::Create { name, flow, parent } => {
            let flow = parse_flow(&flow)?;
            let parent_id = match parent {
                Some(parent) => Some(resolve_category(storage, &parent)?.id),
                None => None,
            };

            let category = service.create(&name, flow, parent_id)?;
            println!("Created category: {}", category.name);
            println!("  Type: {}", category.flow);
            println!("  ID: {}", category.id);
        }

        CategoryCommands::Edit {
            category,
            name,
            flow,
            parent,
            top_level,
        } => {
            let found = resolve_category(storage, &category)?;

            let parent_id = if top_level {
                Some(None)
            } else if let Some(parent) = parent {
                Some(Some(resolve_category(storage, &parent)?.id))
            } else {
                None
            };
            let flow = flow.as_deref().map(parse_flow).transpose()?;

            if name.is_none() && flow.is_none() && parent_id.is_none() {
                println!("No changes specified. Use --name, --type, --parent or --top-level.");
                return Ok(());
            }

            let updated = service.update(
                found.id,
                CategoryChanges {
                    name,
                    flow,
                    parent_id,
                },
            )?;
            println!("Updated category: {}", updated.name);
        }

        CategoryCommands::Delete { category } => {
            let found = resolve_category(storage, &category)?;
            let deleted = service.delete(found.id)?;

            println!("Deleted category: {}", deleted.category.name);
            if deleted.children_moved > 0 {
                println!("  Sub-categories moved up: {}", deleted.children_moved);
            }
        }
    }

    Ok(())
}

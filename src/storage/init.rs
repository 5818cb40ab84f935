//! Storage initialization
//!
//! Handles first-run setup: default settings and a starter category tree.

use crate::config::paths::LedgerPaths;
use crate::config::settings::Settings;
use crate::error::LedgerError;
use crate::models::{Category, FlowType};

use super::Storage;

/// Starter categories as (parent, flow, children)
const DEFAULT_CATEGORIES: &[(&str, FlowType, &[&str])] = &[
    ("Income", FlowType::Income, &["Salary", "Interest", "Other Income"]),
    ("Housing", FlowType::Expense, &["Rent", "Utilities", "Insurance"]),
    ("Food", FlowType::Expense, &["Groceries", "Dining Out"]),
    ("Transport", FlowType::Expense, &["Public Transport", "Fuel"]),
    ("Leisure", FlowType::Expense, &["Entertainment", "Travel"]),
    ("Internal", FlowType::Neutral, &[]),
];

/// Initialize storage for a fresh installation
///
/// Writes default settings and, when no categories exist yet, the starter
/// category tree. Returns `false` if the ledger was already initialized.
pub fn initialize_storage(storage: &Storage) -> Result<bool, LedgerError> {
    if !needs_initialization(storage.paths()) {
        return Ok(false);
    }

    storage.transaction(|s| {
        Settings::default().save(s)?;

        if s.categories.count()? == 0 {
            for category in default_categories() {
                s.categories.upsert(category)?;
            }
        }
        Ok(())
    })?;

    tracing::info!(path = %storage.paths().base_dir().display(), "initialized ledger");
    Ok(true)
}

fn default_categories() -> Vec<Category> {
    let mut categories = Vec::new();
    for (name, flow, children) in DEFAULT_CATEGORIES {
        let parent = Category::new(*name, *flow);
        for child in children.iter() {
            categories.push(Category::with_parent(*child, *flow, parent.id));
        }
        categories.push(parent);
    }
    categories
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &LedgerPaths) -> bool {
    !paths.is_initialized()
}

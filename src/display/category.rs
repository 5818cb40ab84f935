//! Category display formatting
//!
//! Categories are listed in tree order with names indented by depth.

use tabled::Tabled;

use super::{render_table, DisplayOptions};
use crate::services::aggregation::CategorySummary;

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Category")]
    name: String,
    #[tabled(rename = "Type")]
    flow: String,
    #[tabled(rename = "Txns")]
    count: usize,
    #[tabled(rename = "Own")]
    own: String,
    #[tabled(rename = "Total")]
    total: String,
}

/// Format categories as an indented tree table
///
/// "Own" is the category's direct usage, "Total" includes sub-categories.
pub fn format_category_tree(summaries: &[CategorySummary], options: &DisplayOptions) -> String {
    if summaries.is_empty() {
        return "No categories found.".to_string();
    }

    render_table(summaries.iter().map(|s| {
        let name = if s.depth == 0 {
            s.category.name.clone()
        } else {
            format!("{}└ {}", "  ".repeat(s.depth - 1), s.category.name)
        };
        CategoryRow {
            id: s.category.id.short(),
            name,
            flow: s.category.flow.to_string(),
            count: s.total.count,
            own: options.money(s.own.total),
            total: options.money(s.total.total),
        }
    }))
}

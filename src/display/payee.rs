//! Payee display formatting

use std::collections::HashMap;

use tabled::Tabled;

use super::{render_table, DisplayOptions};
use crate::models::CategoryId;
use crate::services::aggregation::PayeeSummary;

#[derive(Tabled)]
struct PayeeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Default Category")]
    category: String,
    #[tabled(rename = "Default Payment")]
    payment: String,
    #[tabled(rename = "Txns")]
    count: usize,
    #[tabled(rename = "Total")]
    total: String,
}

/// Format payees with their defaults and usage
///
/// A default category missing from `category_names` is shown as "(deleted)".
pub fn format_payee_list(
    summaries: &[PayeeSummary],
    category_names: &HashMap<CategoryId, String>,
    options: &DisplayOptions,
) -> String {
    if summaries.is_empty() {
        return "No payees found.".to_string();
    }

    render_table(summaries.iter().map(|s| PayeeRow {
        id: s.payee.id.short(),
        name: s.payee.name.clone(),
        category: match s.payee.default_category_id {
            Some(id) => category_names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| "(deleted)".to_string()),
            None => String::new(),
        },
        payment: s
            .payee
            .default_payment_type
            .map(|m| m.to_string())
            .unwrap_or_default(),
        count: s.stats.count,
        total: options.money(s.stats.total),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, Payee, PaymentMethod};
    use crate::services::aggregation::UsageStats;

    #[test]
    fn test_format_payee_list() {
        let food = CategoryId::new();
        let mut grocer = Payee::with_default_category("Grocer", food);
        grocer.default_payment_type = Some(PaymentMethod::Cash);
        let ghost = Payee::with_default_category("Ghost", CategoryId::new());

        let summaries = vec![
            PayeeSummary {
                payee: grocer,
                stats: UsageStats {
                    count: 3,
                    total: Money::from_cents(-4510),
                },
            },
            PayeeSummary {
                payee: ghost,
                stats: UsageStats::default(),
            },
        ];
        let names = HashMap::from([(food, "Food".to_string())]);

        let output = format_payee_list(&summaries, &names, &DisplayOptions::default());
        assert!(output.contains("Grocer"));
        assert!(output.contains("Food"));
        assert!(output.contains(&PaymentMethod::Cash.to_string()));
        assert!(output.contains("-45.10"));
        assert!(output.contains("(deleted)"));
    }
}

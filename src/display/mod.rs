//! Display formatting for terminal output
//!
//! Turns models and service results into text for the CLI. Listings are
//! rendered as `tabled` tables; detail views are plain aligned text.
//! Anonymize mode is applied here and only here.

pub mod account;
pub mod category;
pub mod export;
pub mod payee;
pub mod transaction;

pub use account::{format_account_details, format_account_list, format_currency_totals};
pub use category::format_category_tree;
pub use export::{format_import_preview, format_import_result, format_manifest_list};
pub use payee::format_payee_list;
pub use transaction::{
    format_transaction_details, format_transaction_register, format_transfer_pair, NameLookup,
};

use chrono::NaiveDate;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::config::settings::DateFormat;
use crate::config::Settings;
use crate::models::Money;

/// Replacement text for amounts in anonymize mode
pub const MASK: &str = "****";

/// How values are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Mask every monetary value
    pub anonymize: bool,
    pub date_format: DateFormat,
}

impl DisplayOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            anonymize: settings.anonymize,
            date_format: settings.date_format,
        }
    }

    /// An amount, or the mask
    pub fn money(&self, amount: Money) -> String {
        if self.anonymize {
            MASK.to_string()
        } else {
            amount.to_string()
        }
    }

    /// An amount with its currency code, or the mask with the code
    pub fn money_in(&self, amount: Money, currency: &str) -> String {
        if self.anonymize {
            format!("{} {}", MASK, currency).trim_end().to_string()
        } else {
            amount.format_with_currency(currency)
        }
    }

    pub fn date(&self, date: NaiveDate) -> String {
        self.date_format.format_date(date)
    }
}

/// Render rows as a table
pub(crate) fn render_table<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

/// Cut a string to `max` characters, marking the cut with "..."
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_masking() {
        let plain = DisplayOptions::default();
        let masked = DisplayOptions {
            anonymize: true,
            ..Default::default()
        };
        let amount = Money::from_cents(-1250);

        assert_eq!(plain.money(amount), "-12.50");
        assert_eq!(plain.money_in(amount, "EUR"), "-12.50 EUR");
        assert_eq!(masked.money(amount), MASK);
        assert_eq!(masked.money_in(amount, "EUR"), "**** EUR");
    }

    #[test]
    fn test_date_uses_format() {
        let options = DisplayOptions {
            date_format: DateFormat::Dmy,
            ..Default::default()
        };
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(options.date(date), "05.01.2024");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long payee name", 10), "a very ...");
        assert_eq!(truncate("Bäckerei Müller", 8), "Bäcke...");
    }
}

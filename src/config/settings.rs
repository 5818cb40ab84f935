//! Runtime settings for pocket-ledger
//!
//! Settings are stored as key/value pairs in the record store and read back
//! on every call to [`Settings::load`]. Nothing here caches values between
//! requests, so a write through one handle is visible to the next load.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LedgerError, LedgerResult};
use crate::storage::Storage;

pub const KEY_ANONYMIZE: &str = "anonymize";
pub const KEY_DATE_FORMAT: &str = "date_format";
pub const KEY_REGISTRATION_ENABLED: &str = "registration_enabled";
pub const KEY_DEFAULT_CURRENCY: &str = "default_currency";

/// Every key the settings store accepts
pub const KNOWN_KEYS: [&str; 4] = [
    KEY_ANONYMIZE,
    KEY_DATE_FORMAT,
    KEY_REGISTRATION_ENABLED,
    KEY_DEFAULT_CURRENCY,
];

/// How dates are written in imported files and rendered in exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// `YYYY-MM-DD`
    #[default]
    Iso,
    /// `DD.MM.YYYY` or `DD/MM/YYYY`
    Dmy,
    /// `MM/DD/YYYY`
    Mdy,
}

impl DateFormat {
    /// Parse a format name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "iso" | "ymd" | "yyyy-mm-dd" => Some(Self::Iso),
            "dmy" | "dd.mm.yyyy" | "dd/mm/yyyy" => Some(Self::Dmy),
            "mdy" | "mm/dd/yyyy" => Some(Self::Mdy),
            _ => None,
        }
    }

    /// Stored name of the format
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iso => "iso",
            Self::Dmy => "dmy",
            Self::Mdy => "mdy",
        }
    }

    fn patterns(&self) -> &'static [&'static str] {
        match self {
            Self::Iso => &["%Y-%m-%d", "%Y/%m/%d"],
            Self::Dmy => &["%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y"],
            Self::Mdy => &["%m/%d/%Y", "%m-%d-%Y"],
        }
    }

    /// Normalize a date string to a calendar day
    ///
    /// The format's own patterns are tried first, then ISO. A trailing time
    /// part on an ISO timestamp ("2024-01-05T10:00:00") is ignored.
    pub fn parse_date(&self, s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        let candidates = self.patterns().iter().chain(Self::Iso.patterns());
        for pattern in candidates {
            if let Ok(date) = NaiveDate::parse_from_str(s, pattern) {
                return Some(date);
            }
        }

        s.get(..10)
            .filter(|_| s.len() > 10)
            .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
    }

    /// Render a date in this format
    pub fn format_date(&self, date: NaiveDate) -> String {
        match self {
            Self::Iso => date.format("%Y-%m-%d").to_string(),
            Self::Dmy => date.format("%d.%m.%Y").to_string(),
            Self::Mdy => date.format("%m/%d/%Y").to_string(),
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed view over the persisted settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Mask monetary values in display output
    pub anonymize: bool,

    /// Date format for import parsing and export rendering
    pub date_format: DateFormat,

    /// Whether new user registration is allowed by the hosting layer
    pub registration_enabled: bool,

    /// Currency code given to new accounts when none is supplied
    pub default_currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            anonymize: false,
            date_format: DateFormat::Iso,
            registration_enabled: true,
            default_currency: "EUR".to_string(),
        }
    }
}

impl Settings {
    /// Read the current settings from the store
    ///
    /// Missing keys take their defaults. A stored value that no longer parses
    /// is logged and replaced by its default rather than failing the request.
    pub fn load(storage: &Storage) -> LedgerResult<Self> {
        let pairs = storage.settings.get_all()?;
        let mut settings = Self::default();

        for (key, value) in pairs {
            if let Err(e) = settings.apply(&key, &value) {
                tracing::warn!(key = %key, value = %value, error = %e, "ignoring stored setting");
            }
        }

        Ok(settings)
    }

    /// Validate and persist one setting
    pub fn set(storage: &Storage, key: &str, value: &str) -> LedgerResult<Self> {
        let key = key.trim();
        let mut settings = Self::load(storage)?;
        settings.apply(key, value)?;
        let normalized = settings.value_of(key)?;

        storage.transaction(|s| s.settings.set(key, &normalized))?;
        tracing::info!(key, value = %normalized, "setting updated");

        Ok(settings)
    }

    /// Write every value to the store (used on first run)
    pub fn save(&self, storage: &Storage) -> LedgerResult<()> {
        storage.transaction(|s| {
            for (key, value) in self.pairs() {
                s.settings.set(key, &value)?;
            }
            Ok(())
        })
    }

    /// All settings as display-ready key/value pairs
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        KNOWN_KEYS
            .iter()
            .map(|key| (*key, self.value_of(key).unwrap_or_default()))
            .collect()
    }

    fn apply(&mut self, key: &str, value: &str) -> LedgerResult<()> {
        match key {
            KEY_ANONYMIZE => self.anonymize = parse_bool(key, value)?,
            KEY_REGISTRATION_ENABLED => self.registration_enabled = parse_bool(key, value)?,
            KEY_DATE_FORMAT => {
                self.date_format = DateFormat::parse(value).ok_or_else(|| {
                    LedgerError::Validation(format!(
                        "Invalid date format '{}'. Use iso, dmy or mdy",
                        value
                    ))
                })?
            }
            KEY_DEFAULT_CURRENCY => {
                let code = value.trim();
                if code.is_empty() {
                    return Err(LedgerError::Validation(
                        "Default currency cannot be empty".into(),
                    ));
                }
                self.default_currency = code.to_string();
            }
            _ => {
                return Err(LedgerError::Validation(format!(
                    "Unknown setting '{}'. Known settings: {}",
                    key,
                    KNOWN_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    fn value_of(&self, key: &str) -> LedgerResult<String> {
        match key {
            KEY_ANONYMIZE => Ok(self.anonymize.to_string()),
            KEY_REGISTRATION_ENABLED => Ok(self.registration_enabled.to_string()),
            KEY_DATE_FORMAT => Ok(self.date_format.as_str().to_string()),
            KEY_DEFAULT_CURRENCY => Ok(self.default_currency.clone()),
            _ => Err(LedgerError::Validation(format!("Unknown setting '{}'", key))),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> LedgerResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(LedgerError::Validation(format!(
            "Setting '{}' expects true or false, got '{}'",
            key, value
        ))),
    }
}

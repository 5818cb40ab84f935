//! Export manifest model
//!
//! A manifest is the persisted record of one export: what file was produced,
//! how many rows it held, and the literal content so it can be downloaded
//! again without regenerating it from records that may have changed since.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, ManifestId};

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Yaml,
}

impl ExportFormat {
    /// Parse a format name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// A persisted export record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    /// Unique identifier
    pub id: ManifestId,

    /// When the export ran
    pub created_at: DateTime<Utc>,

    /// Name of the produced file
    pub filename: String,

    /// Number of transaction rows in the content
    pub row_count: usize,

    /// Format of the content
    #[serde(default)]
    pub format: ExportFormat,

    /// Set when this manifest is one account's part of a grouped export
    #[serde(default)]
    pub account_id: Option<AccountId>,

    /// The exported bytes, verbatim
    pub content: String,
}

impl ExportManifest {
    /// Create a new manifest
    pub fn new(
        filename: impl Into<String>,
        row_count: usize,
        format: ExportFormat,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: ManifestId::new(),
            created_at: Utc::now(),
            filename: filename.into(),
            row_count,
            format,
            account_id: None,
            content: content.into(),
        }
    }

    /// Attach the account this manifest was split out for
    pub fn for_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Validate the manifest
    pub fn validate(&self) -> Result<(), ManifestValidationError> {
        if self.filename.trim().is_empty() {
            return Err(ManifestValidationError::EmptyFilename);
        }
        if self.filename.contains(['/', '\\']) {
            return Err(ManifestValidationError::PathInFilename(self.filename.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for ExportManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} rows)", self.filename, self.row_count)
    }
}

/// Validation errors for manifests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValidationError {
    EmptyFilename,
    PathInFilename(String),
}

impl fmt::Display for ManifestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFilename => write!(f, "Export filename cannot be empty"),
            Self::PathInFilename(name) => {
                write!(f, "Export filename must not contain a path: {}", name)
            }
        }
    }
}

impl std::error::Error for ManifestValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_manifest() {
        let manifest = ExportManifest::new("export.csv", 3, ExportFormat::Csv, "a,b\n");
        assert_eq!(manifest.row_count, 3);
        assert!(manifest.account_id.is_none());
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_for_account() {
        let account_id = AccountId::new();
        let manifest =
            ExportManifest::new("a.csv", 1, ExportFormat::Csv, "").for_account(account_id);
        assert_eq!(manifest.account_id, Some(account_id));
    }

    #[test]
    fn test_filename_validation() {
        let manifest = ExportManifest::new("  ", 0, ExportFormat::Json, "");
        assert_eq!(
            manifest.validate(),
            Err(ManifestValidationError::EmptyFilename)
        );

        let manifest = ExportManifest::new("../x.csv", 0, ExportFormat::Csv, "");
        assert!(matches!(
            manifest.validate(),
            Err(ManifestValidationError::PathInFilename(_))
        ));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("yml"), Some(ExportFormat::Yaml));
        assert_eq!(ExportFormat::parse("xlsx"), None);
        assert_eq!(ExportFormat::Json.extension(), "json");
    }
}

//! Export manifest and import preview formatting

use tabled::Tabled;

use super::{render_table, truncate, DisplayOptions};
use crate::models::ExportManifest;
use crate::services::import::{ImportPreview, ImportResult, ImportStatus};

#[derive(Tabled)]
struct ManifestRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "File")]
    filename: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Rows")]
    rows: usize,
}

/// Format export manifests, newest first as given
pub fn format_manifest_list(manifests: &[ExportManifest]) -> String {
    if manifests.is_empty() {
        return "No exports found.".to_string();
    }

    render_table(manifests.iter().map(|m| ManifestRow {
        id: m.id.short(),
        created: m.created_at.format("%Y-%m-%d %H:%M").to_string(),
        filename: m.filename.clone(),
        format: m.format.extension().to_string(),
        rows: m.row_count,
    }))
}

#[derive(Tabled)]
struct PreviewRow {
    #[tabled(rename = "Row")]
    row: usize,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Payee")]
    payee: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Format an import preview with per-row status and a summary line
pub fn format_import_preview(preview: &ImportPreview, options: &DisplayOptions) -> String {
    if preview.entries.is_empty() {
        return "No rows to import.".to_string();
    }

    let table = render_table(preview.entries.iter().map(|entry| {
        let (date, payee, amount) = match &entry.row {
            Some(row) => (
                options.date(row.date),
                truncate(&row.payee, 30),
                options.money(row.amount),
            ),
            None => Default::default(),
        };
        let status = match &entry.status {
            ImportStatus::New => "new".to_string(),
            ImportStatus::Duplicate(id) => format!("duplicate of {}", id.short()),
            ImportStatus::Error(message) => format!("error: {}", message),
        };
        PreviewRow {
            row: entry.row_number,
            date,
            payee,
            amount,
            status,
        }
    }));

    format!(
        "{}\n\n{} new, {} duplicate(s), {} error(s)\n",
        table,
        preview.new_count(),
        preview.duplicate_count(),
        preview.error_count()
    )
}

/// Format the outcome of a committed import
pub fn format_import_result(result: &ImportResult) -> String {
    let mut output = format!(
        "Imported {} transaction(s), skipped {} duplicate(s).\n",
        result.count, result.duplicates_skipped
    );
    for error in &result.errors {
        output.push_str(&format!("  row {}: {}\n", error.row_number, error.message));
    }
    output
}

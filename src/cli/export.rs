//! CLI commands for data export
//!
//! Exports are recorded as manifests that keep the produced content, so a
//! past export can be shown again or deleted later.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

use super::{parse_date, resolve_account};
use crate::display::format_manifest_list;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{ExportFormat, ExportManifest};
use crate::services::{ExportOptions, ExportService, TransactionFilter};
use crate::storage::Storage;

/// Export format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// Spreadsheet-friendly CSV
    Csv,
    /// JSON document with metadata
    Json,
    /// YAML document with metadata
    Yaml,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Yaml => ExportFormat::Yaml,
        }
    }
}

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export transactions and record a manifest
    Run {
        /// Export format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: FormatArg,
        /// One file per account
        #[arg(short, long)]
        grouped: bool,
        /// Only this account
        #[arg(short, long)]
        account: Option<String>,
        /// Earliest date
        #[arg(long)]
        from: Option<String>,
        /// Latest date
        #[arg(long)]
        until: Option<String>,
        /// Skip transactions that were already exported
        #[arg(long)]
        new_only: bool,
        /// Do not mark the transactions as exported
        #[arg(long)]
        no_mark: bool,
        /// Directory to write the file(s) to; content goes to stdout otherwise
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List recorded exports
    List,
    /// Print the content of a recorded export
    Show {
        /// Manifest ID or filename
        id: String,
    },
    /// Delete a recorded export and un-mark its transactions
    Delete {
        /// Manifest ID or filename
        id: String,
    },
}

fn resolve_manifest(service: &ExportService, identifier: &str) -> LedgerResult<ExportManifest> {
    service
        .find_manifest(identifier)?
        .ok_or_else(|| LedgerError::manifest_not_found(identifier))
}

/// Handle export commands
pub fn handle_export_command(storage: &Storage, cmd: ExportCommands) -> LedgerResult<()> {
    let service = ExportService::new(storage);

    match cmd {
        ExportCommands::Run {
            format,
            grouped,
            account,
            from,
            until,
            new_only,
            no_mark,
            output,
        } => {
            let mut filter = TransactionFilter::new();
            if let Some(account) = account {
                filter = filter.account(resolve_account(storage, &account)?.id);
            }
            if let Some(from) = from {
                filter.start_date = Some(parse_date(storage, &from)?);
            }
            if let Some(until) = until {
                filter.end_date = Some(parse_date(storage, &until)?);
            }
            if new_only {
                filter = filter.exported(false);
            }

            let options = ExportOptions {
                grouped,
                mark_exported: !no_mark,
                format: format.into(),
            };
            let exported = service.export_transactions(filter, options)?;

            for manifest in exported.manifests() {
                match &output {
                    Some(dir) => {
                        let path = dir.join(&manifest.filename);
                        std::fs::write(&path, &manifest.content).map_err(|e| {
                            LedgerError::Export(format!(
                                "Failed to write {}: {}",
                                path.display(),
                                e
                            ))
                        })?;
                        eprintln!("Wrote {} row(s) to {}", manifest.row_count, path.display());
                    }
                    None => print!("{}", manifest.content),
                }
            }
        }

        ExportCommands::List => {
            println!("{}", format_manifest_list(&service.list_manifests()?));
        }

        ExportCommands::Show { id } => {
            let manifest = resolve_manifest(&service, &id)?;
            print!("{}", service.manifest_content(manifest.id)?);
        }

        ExportCommands::Delete { id } => {
            let manifest = resolve_manifest(&service, &id)?;
            let cleared = service.delete_manifest(manifest.id)?;
            println!(
                "Deleted export {} ({} transaction(s) un-marked)",
                manifest.filename, cleared
            );
        }
    }

    Ok(())
}

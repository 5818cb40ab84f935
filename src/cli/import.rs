//! CLI commands for CSV import
//!
//! `check` shows what an import would do; `commit` parses the file again
//! and inserts the accepted rows.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use super::{display_options, resolve_account};
use crate::config::DateFormat;
use crate::display::{format_import_preview, format_import_result};
use crate::error::{LedgerError, LedgerResult};
use crate::services::ImportService;
use crate::storage::Storage;

/// Import subcommands
#[derive(Subcommand)]
pub enum ImportCommands {
    /// Preview an import: parsed rows, duplicates and errors
    Check {
        /// Path to CSV file
        file: PathBuf,
        /// Target account
        #[arg(short, long)]
        account: String,
        /// Date format of the file (iso, dmy, mdy); defaults to the setting
        #[arg(long)]
        date_format: Option<String>,
    },
    /// Import the rows of a CSV file
    Commit {
        /// Path to CSV file
        file: PathBuf,
        /// Target account
        #[arg(short, long)]
        account: String,
        /// Date format of the file (iso, dmy, mdy); defaults to the setting
        #[arg(long)]
        date_format: Option<String>,
        /// Import rows that match existing transactions too
        #[arg(long)]
        keep_duplicates: bool,
    },
}

fn read_file(path: &Path) -> LedgerResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| LedgerError::Import(format!("Failed to read {}: {}", path.display(), e)))
}

fn parse_date_format(input: Option<&str>) -> LedgerResult<Option<DateFormat>> {
    input
        .map(|s| {
            DateFormat::parse(s).ok_or_else(|| {
                LedgerError::Validation(format!(
                    "Invalid date format '{}'. Use iso, dmy or mdy",
                    s
                ))
            })
        })
        .transpose()
}

/// Handle an import command
pub fn handle_import_command(storage: &Storage, cmd: ImportCommands) -> LedgerResult<()> {
    let service = ImportService::new(storage);

    match cmd {
        ImportCommands::Check {
            file,
            account,
            date_format,
        } => {
            let account = resolve_account(storage, &account)?;
            let content = read_file(&file)?;
            let date_format = parse_date_format(date_format.as_deref())?;

            let preview = service.check(&content, account.id, date_format, None)?;
            println!("Import preview for '{}'", account.name);
            print!(
                "{}",
                format_import_preview(&preview, &display_options(storage)?)
            );
        }

        ImportCommands::Commit {
            file,
            account,
            date_format,
            keep_duplicates,
        } => {
            let account = resolve_account(storage, &account)?;
            let content = read_file(&file)?;
            let date_format = parse_date_format(date_format.as_deref())?;

            let result =
                service.import_transactions(&content, account.id, !keep_duplicates, date_format)?;
            println!("Import into '{}'", account.name);
            print!("{}", format_import_result(&result));
        }
    }

    Ok(())
}

//! Settings CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::error::LedgerResult;
use crate::storage::Storage;

/// Settings subcommands
#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show every setting
    Show,
    /// Change one setting
    Set {
        /// anonymize, date_format, registration_enabled or default_currency
        key: String,
        /// New value
        value: String,
    },
}

/// Handle a settings command
pub fn handle_settings_command(storage: &Storage, cmd: SettingsCommands) -> LedgerResult<()> {
    match cmd {
        SettingsCommands::Show => {
            for (key, value) in Settings::load(storage)?.pairs() {
                println!("{:<22} {}", key, value);
            }
        }
        SettingsCommands::Set { key, value } => {
            let settings = Settings::set(storage, &key, &value)?;
            let stored = settings
                .pairs()
                .into_iter()
                .find(|(k, _)| *k == key.trim())
                .map(|(_, v)| v)
                .unwrap_or(value);
            println!("{} = {}", key.trim(), stored);
        }
    }

    Ok(())
}

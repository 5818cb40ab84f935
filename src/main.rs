use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pocket_ledger::cli::{
    handle_account_command, handle_category_command, handle_check_command,
    handle_export_command, handle_import_command, handle_payee_command,
    handle_settings_command, handle_transaction_command, handle_transfer_command,
    AccountCommands, CategoryCommands, ExportCommands, ImportCommands, PayeeCommands,
    SettingsCommands, TransactionCommands, TransferCommands,
};
use pocket_ledger::config::{paths::DATA_DIR_ENV, LedgerPaths, Settings};
use pocket_ledger::storage::{init::initialize_storage, Storage};

#[derive(Parser)]
#[command(
    name = "pocket",
    version,
    about = "Personal finance ledger for the command line",
    long_about = "pocket-ledger keeps accounts, categories, payees and transactions \
                  in plain JSON files. It imports bank CSV files with duplicate \
                  detection and exports to CSV, JSON or YAML."
)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new ledger with default settings and categories
    Init,

    /// Show the data location and current settings
    Config,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Payee management commands
    #[command(subcommand)]
    Payee(PayeeCommands),

    /// Transaction management commands
    #[command(subcommand, alias = "txn")]
    Transaction(TransactionCommands),

    /// Transfers between accounts
    #[command(subcommand)]
    Transfer(TransferCommands),

    /// Import transactions from CSV
    #[command(subcommand)]
    Import(ImportCommands),

    /// Export transactions and manage past exports
    #[command(subcommand)]
    Export(ExportCommands),

    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Check the ledger for broken transfers and export records
    Check,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("pocket_ledger=info"),
        2 => EnvFilter::new("pocket_ledger=debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let paths = LedgerPaths::new()?;
    let mut storage = Storage::new(paths.clone())
        .with_context(|| format!("cannot open ledger at {}", paths.base_dir().display()))?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Init) => {
            if initialize_storage(&storage)? {
                println!("Initialized pocket-ledger at: {}", paths.base_dir().display());
                println!();
                println!("Default categories have been created:");
                println!("  - Income (Salary, Interest, Other Income)");
                println!("  - Housing (Rent, Utilities, Insurance)");
                println!("  - Food (Groceries, Dining Out)");
                println!("  - Transport (Public Transport, Fuel)");
                println!("  - Leisure (Entertainment, Travel)");
                println!("  - Internal");
                println!();
                println!("Run 'pocket account create <name>' to add your first account.");
            } else {
                println!("Ledger already initialized at: {}", paths.base_dir().display());
            }
        }
        Some(Commands::Config) => {
            let settings = Settings::load(&storage)?;
            println!("pocket-ledger Configuration");
            println!("===========================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Data directory: {}", paths.data_dir().display());
            println!("(override with {})", DATA_DIR_ENV);
            println!();
            println!("Settings:");
            for (key, value) in settings.pairs() {
                println!("  {:<22} {}", key, value);
            }
        }
        Some(Commands::Account(cmd)) => handle_account_command(&storage, cmd)?,
        Some(Commands::Category(cmd)) => handle_category_command(&storage, cmd)?,
        Some(Commands::Payee(cmd)) => handle_payee_command(&storage, cmd)?,
        Some(Commands::Transaction(cmd)) => handle_transaction_command(&storage, cmd)?,
        Some(Commands::Transfer(cmd)) => handle_transfer_command(&storage, cmd)?,
        Some(Commands::Import(cmd)) => handle_import_command(&storage, cmd)?,
        Some(Commands::Export(cmd)) => handle_export_command(&storage, cmd)?,
        Some(Commands::Settings(cmd)) => handle_settings_command(&storage, cmd)?,
        Some(Commands::Check) => handle_check_command(&storage)?,
        None => {
            println!("pocket-ledger - personal finance ledger");
            println!();
            println!("Run 'pocket --help' for usage information.");
            println!("Run 'pocket init' to set up a new ledger.");
        }
    }

    Ok(())
}

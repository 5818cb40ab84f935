//! Service layer for pocket-ledger
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, computed balances, and multi-row writes. Every
//! mutation runs inside [`Storage::transaction`](crate::storage::Storage::transaction).

pub mod account;
pub mod aggregation;
pub mod category;
pub mod duplicates;
pub mod export;
pub mod import;
pub mod integrity;
pub mod payee;
pub mod transaction;
pub mod transfer;

pub use account::{AccountChanges, AccountService, DeletedAccount};
pub use aggregation::{AccountSummary, AggregationService, CategorySummary, PayeeSummary};
pub use category::{CategoryChanges, CategoryService, DeletedCategory};
pub use duplicates::{DuplicateCandidate, DuplicateReport, DuplicateService};
pub use export::{ExportOptions, ExportOutput, ExportService};
pub use import::{ColumnMapping, ImportPreview, ImportResult, ImportService, ImportStatus};
pub use integrity::{IntegrityService, Violation};
pub use payee::{PayeeImportResult, PayeeService};
pub use transaction::{
    Created, CreateTransactionInput, TransactionFilter, TransactionKind, TransactionService,
    UpdateTransactionInput,
};
pub use transfer::{CreateTransfer, TransferChanges, TransferPair, TransferService};

//! Transaction service
//!
//! The create/update/delete surface for single transactions. Transfers are
//! recognised here and handed to [`TransferService`], which owns the
//! two-leg rules.

use chrono::NaiveDate;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccountId, CategoryId, Money, PaymentMethod, Transaction, TransactionId};
use crate::storage::Storage;

use super::transfer::{CreateTransfer, TransferChanges, TransferPair, TransferService};

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
}

/// What kind of entry is being created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Expense,
    Income,
    Transfer,
}

impl TransactionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "expense" | "out" => Some(Self::Expense),
            "income" | "in" => Some(Self::Income),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

/// Options for filtering transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Filter by account
    pub account_id: Option<AccountId>,
    /// Filter by category
    pub category_id: Option<CategoryId>,
    /// Filter by payee text (case-insensitive, trimmed)
    pub payee: Option<String>,
    /// Filter by date range start
    pub start_date: Option<NaiveDate>,
    /// Filter by date range end
    pub end_date: Option<NaiveDate>,
    /// Filter by exported state
    pub exported: Option<bool>,
    /// Maximum number of transactions to return
    pub limit: Option<usize>,
}

impl TransactionFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by account
    pub fn account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Filter by category
    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Filter by payee
    pub fn payee(mut self, payee: impl Into<String>) -> Self {
        self.payee = Some(payee.into());
        self
    }

    /// Filter by date range
    pub fn date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    /// Filter by exported state
    pub fn exported(mut self, exported: bool) -> Self {
        self.exported = Some(exported);
        self
    }

    /// Limit results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a transaction passes every set criterion except the limit
    pub fn matches(&self, txn: &Transaction) -> bool {
        if self.account_id.is_some_and(|id| txn.account_id != id) {
            return false;
        }
        if self.category_id.is_some() && txn.category_id != self.category_id {
            return false;
        }
        if let Some(payee) = &self.payee {
            if !txn.payee.trim().eq_ignore_ascii_case(payee.trim()) {
                return false;
            }
        }
        if self.start_date.is_some_and(|start| txn.date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| txn.date > end) {
            return false;
        }
        if self.exported.is_some_and(|exported| txn.exported != exported) {
            return false;
        }
        true
    }
}

/// Input for creating a new transaction
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub kind: TransactionKind,
    pub account_id: AccountId,
    /// Unsigned magnitude; the sign comes from `kind`
    pub amount: Money,
    pub date: NaiveDate,
    pub payee: Option<String>,
    pub memo: Option<String>,
    pub category_id: Option<CategoryId>,
    pub payment_type: Option<PaymentMethod>,
    /// Required for transfers
    pub target_account_id: Option<AccountId>,
    /// Inflow magnitude for transfers, when it differs
    pub target_amount: Option<Money>,
}

impl CreateTransactionInput {
    pub fn new(
        kind: TransactionKind,
        account_id: AccountId,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self {
            kind,
            account_id,
            amount,
            date,
            payee: None,
            memo: None,
            category_id: None,
            payment_type: None,
            target_account_id: None,
            target_amount: None,
        }
    }
}

/// Result of [`TransactionService::create`]
#[derive(Debug, Clone)]
pub enum Created {
    Single(Transaction),
    Transfer(TransferPair),
}

/// Changes to an existing transaction; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    /// Signed amount. For transfers, its magnitude becomes the outflow.
    pub amount: Option<Money>,
    pub date: Option<NaiveDate>,
    pub payee: Option<String>,
    pub memo: Option<String>,
    /// `Some(None)` clears the category
    pub category_id: Option<Option<CategoryId>>,
    pub payment_type: Option<PaymentMethod>,
    /// Move the row (or a transfer's outflow) to another account
    pub account_id: Option<AccountId>,
    /// Transfers only
    pub target_account_id: Option<AccountId>,
    /// Transfers only
    pub target_amount: Option<Money>,
}

impl<'a> TransactionService<'a> {
    /// Create a new transaction service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create an expense, income or transfer
    pub fn create(&self, input: CreateTransactionInput) -> LedgerResult<Created> {
        if !input.amount.is_positive() {
            return Err(LedgerError::Validation(format!(
                "Amount must be positive, got {}",
                input.amount
            )));
        }

        let signed = match input.kind {
            TransactionKind::Transfer => return self.create_transfer(input).map(Created::Transfer),
            TransactionKind::Expense => -input.amount,
            TransactionKind::Income => input.amount,
        };

        let txn = self.storage.transaction(|s| {
            if !s.accounts.exists(input.account_id)? {
                return Err(LedgerError::account_not_found(input.account_id.to_string()));
            }
            if let Some(category_id) = input.category_id {
                if !s.categories.exists(category_id)? {
                    return Err(LedgerError::category_not_found(category_id.to_string()));
                }
            }

            let mut txn = Transaction::new(input.account_id, input.date, signed);
            txn.payee = input.payee.as_deref().map(str::trim).unwrap_or_default().to_string();
            txn.memo = input.memo.clone().unwrap_or_default();
            txn.category_id = input.category_id;
            if let Some(payment_type) = input.payment_type {
                txn.payment_type = payment_type;
            }

            if !txn.payee.is_empty() {
                if let Some(payee) = s.payees.get_by_name(&txn.payee)? {
                    if txn.category_id.is_none() {
                        if let Some(default) = payee.default_category_id {
                            // Defaults are advisory and may point at a deleted category
                            if s.categories.exists(default)? {
                                txn.category_id = Some(default);
                            }
                        }
                    }
                    if input.payment_type.is_none() {
                        if let Some(default) = payee.default_payment_type {
                            txn.payment_type = default;
                        }
                    }
                }
            }

            txn.validate()
                .map_err(|e| LedgerError::Validation(e.to_string()))?;
            s.transactions.upsert(txn.clone())?;
            Ok(txn)
        })?;

        tracing::info!(
            transaction_id = %txn.id,
            account_id = %txn.account_id,
            amount = %txn.amount,
            "transaction created"
        );

        Ok(Created::Single(txn))
    }

    fn create_transfer(&self, input: CreateTransactionInput) -> LedgerResult<TransferPair> {
        let target = input.target_account_id.ok_or_else(|| {
            LedgerError::Validation("A transfer requires a target account".into())
        })?;

        let mut transfer = CreateTransfer::new(input.account_id, target, input.amount, input.date);
        transfer.target_amount = input.target_amount;
        transfer.memo = input.memo.unwrap_or_default();
        transfer.payee = input
            .payee
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        transfer.category_id = input.category_id;

        TransferService::new(self.storage).create(transfer)
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> LedgerResult<Transaction> {
        self.storage
            .transactions
            .get(id)?
            .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))
    }

    /// Find a transaction by full ID or its short display form
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Transaction>> {
        if let Ok(id) = identifier.parse::<TransactionId>() {
            return self.storage.transactions.get(id);
        }

        let mut matches = self
            .storage
            .transactions
            .get_all()?
            .into_iter()
            .filter(|t| t.id.short() == identifier);
        match (matches.next(), matches.next()) {
            (Some(txn), None) => Ok(Some(txn)),
            (Some(_), Some(_)) => Err(LedgerError::Validation(format!(
                "'{}' matches more than one transaction",
                identifier
            ))),
            _ => Ok(None),
        }
    }

    /// List transactions, newest first
    pub fn list(&self, filter: TransactionFilter) -> LedgerResult<Vec<Transaction>> {
        let mut transactions = if let Some(account_id) = filter.account_id {
            self.storage.transactions.get_by_account(account_id)?
        } else if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            self.storage.transactions.get_by_date_range(start, end)?
        } else {
            self.storage.transactions.get_all()?
        };

        transactions.retain(|t| filter.matches(t));

        if let Some(limit) = filter.limit {
            transactions.truncate(limit);
        }

        Ok(transactions)
    }

    /// Update a transaction
    ///
    /// Transfer legs are edited as a pair through their outflow leg; an
    /// inflow id is resolved to its sibling first. Returns the row that was
    /// addressed.
    pub fn update(
        &self,
        id: TransactionId,
        input: UpdateTransactionInput,
    ) -> LedgerResult<Transaction> {
        let txn = self.get(id)?;

        if txn.is_transfer() {
            let transfers = TransferService::new(self.storage);
            let outflow_id = if txn.amount.is_negative() {
                txn.id
            } else {
                transfers.pair(txn.id)?.outflow.id
            };

            let changes = TransferChanges {
                amount: input.amount.map(|a| a.abs()),
                target_amount: input.target_amount,
                source_account: input.account_id,
                target_account: input.target_account_id,
                date: input.date,
                memo: input.memo,
                payee: input.payee.map(|p| p.trim().to_string()),
                category_id: input.category_id,
                payment_type: input.payment_type,
            };
            let pair = transfers.edit(outflow_id, changes)?;
            return Ok(if pair.outflow.id == id {
                pair.outflow
            } else {
                pair.inflow
            });
        }

        if input.target_account_id.is_some() || input.target_amount.is_some() {
            return Err(LedgerError::Validation(
                "Target account and amount only apply to transfers".into(),
            ));
        }

        let updated = self.storage.transaction(|s| {
            let mut txn = s
                .transactions
                .get(id)?
                .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))?;

            if let Some(account_id) = input.account_id {
                if !s.accounts.exists(account_id)? {
                    return Err(LedgerError::account_not_found(account_id.to_string()));
                }
                txn.account_id = account_id;
            }
            if let Some(amount) = input.amount {
                txn.amount = amount;
            }
            if let Some(date) = input.date {
                txn.date = date;
            }
            if let Some(payee) = &input.payee {
                txn.payee = payee.trim().to_string();
            }
            if let Some(memo) = &input.memo {
                txn.memo.clone_from(memo);
            }
            if let Some(category_id) = input.category_id {
                if let Some(cat_id) = category_id {
                    if !s.categories.exists(cat_id)? {
                        return Err(LedgerError::category_not_found(cat_id.to_string()));
                    }
                }
                txn.category_id = category_id;
            }
            if let Some(payment_type) = input.payment_type {
                txn.payment_type = payment_type;
            }

            txn.touch();
            txn.validate()
                .map_err(|e| LedgerError::Validation(e.to_string()))?;
            s.transactions.upsert(txn.clone())?;
            Ok(txn)
        })?;

        tracing::info!(
            transaction_id = %updated.id,
            amount = %updated.amount,
            "transaction updated"
        );
        Ok(updated)
    }

    /// Delete a transaction; both legs for a transfer
    pub fn delete(&self, id: TransactionId) -> LedgerResult<Vec<Transaction>> {
        let txn = self.get(id)?;

        if txn.is_transfer() {
            let pair = TransferService::new(self.storage).delete(id)?;
            return Ok(vec![pair.outflow, pair.inflow]);
        }

        self.storage.transaction(|s| s.transactions.delete(id))?;
        tracing::info!(transaction_id = %id, "transaction deleted");
        Ok(vec![txn])
    }

    /// Count all transactions
    pub fn count(&self) -> LedgerResult<usize> {
        self.storage.transactions.count()
    }
}

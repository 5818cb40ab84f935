//! Transfer service
//!
//! A transfer is two transaction rows sharing one `transfer_id`: the
//! outflow (negative) on the source account and the inflow (positive) on the
//! target account. This module is the only place that creates, edits or
//! deletes legs, and every change to a pair is a single store transaction.
//!
//! Edits are addressed through the outflow leg. A leg whose sibling is
//! missing is reported as [`LedgerError::OrphanedTransferLeg`] and never
//! silently turned into a plain transaction; [`TransferService::detach_orphan`]
//! is the explicit repair.

use chrono::NaiveDate;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Account, AccountId, CategoryId, Money, PaymentMethod, Transaction, TransactionId, TransferId,
};
use crate::storage::Storage;

/// Service for managing transfers between accounts
pub struct TransferService<'a> {
    storage: &'a Storage,
}

/// Input for a new transfer
#[derive(Debug, Clone)]
pub struct CreateTransfer {
    pub source: AccountId,
    pub target: AccountId,
    /// Magnitude leaving the source account
    pub amount: Money,
    /// Magnitude arriving on the target account, when it differs
    pub target_amount: Option<Money>,
    pub date: NaiveDate,
    pub memo: String,
    /// Replaces the generated "Transfer to/from" payee text on both legs
    pub payee: Option<String>,
    /// Category for the outflow leg
    pub category_id: Option<CategoryId>,
}

impl CreateTransfer {
    /// A same-amount transfer with generated payee text
    pub fn new(source: AccountId, target: AccountId, amount: Money, date: NaiveDate) -> Self {
        Self {
            source,
            target,
            amount,
            target_amount: None,
            date,
            memo: String::new(),
            payee: None,
            category_id: None,
        }
    }
}

/// Changes to an existing transfer; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct TransferChanges {
    /// New outflow magnitude; mirrored onto the inflow unless `target_amount` is set
    pub amount: Option<Money>,
    pub target_amount: Option<Money>,
    /// Move the outflow leg to another account
    pub source_account: Option<AccountId>,
    /// Move the inflow leg to another account
    pub target_account: Option<AccountId>,
    /// Mirrored to both legs
    pub date: Option<NaiveDate>,
    /// Mirrored to both legs
    pub memo: Option<String>,
    /// Outflow leg only
    pub payee: Option<String>,
    /// Outflow leg only; `Some(None)` clears it
    pub category_id: Option<Option<CategoryId>>,
    /// Outflow leg only
    pub payment_type: Option<PaymentMethod>,
}

/// Both legs of a transfer
#[derive(Debug, Clone)]
pub struct TransferPair {
    /// The negative leg on the source account
    pub outflow: Transaction,
    /// The positive leg on the target account
    pub inflow: Transaction,
}

impl TransferPair {
    /// The shared correlation key
    pub fn transfer_id(&self) -> Option<TransferId> {
        self.outflow.transfer_id
    }

    /// Order two rows sharing a transfer id as (outflow, inflow)
    fn from_legs(a: Transaction, b: Transaction) -> LedgerResult<Self> {
        match (a.amount.is_negative(), b.amount.is_negative()) {
            (true, false) => Ok(Self {
                outflow: a,
                inflow: b,
            }),
            (false, true) => Ok(Self {
                outflow: b,
                inflow: a,
            }),
            _ => Err(LedgerError::Consistency(format!(
                "Transfer {} does not have exactly one negative leg",
                a.transfer_id.map(|t| t.to_string()).unwrap_or_default()
            ))),
        }
    }
}

fn positive(amount: Money, what: &str) -> LedgerResult<Money> {
    if amount.is_positive() {
        Ok(amount)
    } else {
        Err(LedgerError::Validation(format!(
            "{} must be positive, got {}",
            what, amount
        )))
    }
}

fn require_account(storage: &Storage, id: AccountId) -> LedgerResult<Account> {
    storage
        .accounts
        .get(id)?
        .ok_or_else(|| LedgerError::account_not_found(id.to_string()))
}

fn require_transaction(storage: &Storage, id: TransactionId) -> LedgerResult<Transaction> {
    storage
        .transactions
        .get(id)?
        .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))
}

/// The transfer id of `txn`, or a validation error for plain rows
fn transfer_id_of(txn: &Transaction) -> LedgerResult<TransferId> {
    txn.transfer_id.ok_or_else(|| {
        LedgerError::Validation(format!("Transaction {} is not part of a transfer", txn.id))
    })
}

/// Find the one sibling of `leg`, failing if the pair is broken
fn find_sibling(storage: &Storage, leg: &Transaction) -> LedgerResult<Transaction> {
    let transfer_id = transfer_id_of(leg)?;
    let legs = storage.transactions.get_by_transfer(transfer_id)?;

    let mut others = legs.into_iter().filter(|t| t.id != leg.id);
    match (others.next(), others.next()) {
        (Some(sibling), None) => Ok(sibling),
        (sibling, extra) => {
            tracing::warn!(
                transaction_id = %leg.id,
                transfer_id = %transfer_id,
                siblings = sibling.iter().count() + extra.iter().count() + others.count(),
                "transfer leg without exactly one sibling"
            );
            Err(LedgerError::OrphanedTransferLeg {
                transaction_id: leg.id.to_string(),
                transfer_id: transfer_id.to_string(),
            })
        }
    }
}

impl<'a> TransferService<'a> {
    /// Create a new transfer service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a transfer: two legs committed together or not at all
    pub fn create(&self, input: CreateTransfer) -> LedgerResult<TransferPair> {
        if input.source == input.target {
            return Err(LedgerError::InvalidTransfer(
                "Cannot transfer to the same account".into(),
            ));
        }
        let amount = positive(input.amount, "Transfer amount")?;
        let target_amount = match input.target_amount {
            Some(target) => positive(target, "Target amount")?,
            None => amount,
        };

        let pair = self.storage.transaction(|s| {
            let source = require_account(s, input.source)?;
            let target = require_account(s, input.target)?;
            if let Some(category_id) = input.category_id {
                if !s.categories.exists(category_id)? {
                    return Err(LedgerError::category_not_found(category_id.to_string()));
                }
            }

            let transfer_id = TransferId::new();

            let mut outflow = Transaction::new(source.id, input.date, -amount);
            outflow.payee = input
                .payee
                .clone()
                .unwrap_or_else(|| format!("Transfer to {}", target.name));
            outflow.category_id = input.category_id;

            let mut inflow = Transaction::new(target.id, input.date, target_amount);
            inflow.payee = input
                .payee
                .clone()
                .unwrap_or_else(|| format!("Transfer from {}", source.name));

            for leg in [&mut outflow, &mut inflow] {
                leg.transfer_id = Some(transfer_id);
                leg.payment_type = PaymentMethod::BankTransfer;
                leg.memo.clone_from(&input.memo);
                leg.validate()
                    .map_err(|e| LedgerError::Validation(e.to_string()))?;
            }

            s.transactions.upsert(outflow.clone())?;
            s.transactions.upsert(inflow.clone())?;

            Ok(TransferPair { outflow, inflow })
        })?;

        tracing::info!(
            transfer_id = %transfer_id_of(&pair.outflow)?,
            source = %pair.outflow.account_id,
            target = %pair.inflow.account_id,
            amount = %amount,
            target_amount = %target_amount,
            "transfer created"
        );

        Ok(pair)
    }

    /// Both legs of the transfer `id` belongs to, as (outflow, inflow)
    pub fn pair(&self, id: TransactionId) -> LedgerResult<TransferPair> {
        let leg = require_transaction(self.storage, id)?;
        let sibling = find_sibling(self.storage, &leg)?;
        TransferPair::from_legs(leg, sibling)
    }

    /// Edit a transfer through its outflow leg
    pub fn edit(
        &self,
        outflow_id: TransactionId,
        changes: TransferChanges,
    ) -> LedgerResult<TransferPair> {
        let amount = changes
            .amount
            .map(|a| positive(a, "Transfer amount"))
            .transpose()?;
        let target_amount = changes
            .target_amount
            .map(|a| positive(a, "Target amount"))
            .transpose()?;

        let pair = self.storage.transaction(|s| {
            let mut outflow = require_transaction(s, outflow_id)?;
            transfer_id_of(&outflow)?;
            if !outflow.amount.is_negative() {
                return Err(LedgerError::Validation(format!(
                    "Transfers are edited through their outflow leg; {} is the inflow",
                    outflow_id
                )));
            }
            let mut inflow = find_sibling(s, &outflow)?;

            if let Some(account_id) = changes.source_account {
                require_account(s, account_id)?;
                outflow.account_id = account_id;
            }
            if let Some(account_id) = changes.target_account {
                require_account(s, account_id)?;
                inflow.account_id = account_id;
            }
            if outflow.account_id == inflow.account_id {
                return Err(LedgerError::InvalidTransfer(
                    "Both legs of a transfer cannot be on the same account".into(),
                ));
            }

            if let Some(amount) = amount {
                outflow.amount = -amount;
                if target_amount.is_none() {
                    inflow.amount = amount;
                }
            }
            if let Some(target_amount) = target_amount {
                inflow.amount = target_amount;
            }

            if let Some(date) = changes.date {
                outflow.date = date;
                inflow.date = date;
            }
            if let Some(memo) = &changes.memo {
                outflow.memo.clone_from(memo);
                inflow.memo.clone_from(memo);
            }

            if let Some(payee) = &changes.payee {
                outflow.payee.clone_from(payee);
            }
            if let Some(category_id) = changes.category_id {
                if let Some(id) = category_id {
                    if !s.categories.exists(id)? {
                        return Err(LedgerError::category_not_found(id.to_string()));
                    }
                }
                outflow.category_id = category_id;
            }
            if let Some(payment_type) = changes.payment_type {
                outflow.payment_type = payment_type;
            }

            for leg in [&mut outflow, &mut inflow] {
                leg.touch();
                leg.validate()
                    .map_err(|e| LedgerError::Validation(e.to_string()))?;
            }

            s.transactions.upsert(outflow.clone())?;
            s.transactions.upsert(inflow.clone())?;

            Ok(TransferPair { outflow, inflow })
        })?;

        tracing::info!(
            transfer_id = %transfer_id_of(&pair.outflow)?,
            outflow = %pair.outflow.amount,
            inflow = %pair.inflow.amount,
            "transfer updated"
        );

        Ok(pair)
    }

    /// Delete a transfer through either leg; both legs go together
    pub fn delete(&self, id: TransactionId) -> LedgerResult<TransferPair> {
        let pair = self.storage.transaction(|s| {
            let leg = require_transaction(s, id)?;
            let sibling = find_sibling(s, &leg)?;

            s.transactions.delete(leg.id)?;
            s.transactions.delete(sibling.id)?;

            TransferPair::from_legs(leg, sibling)
        })?;

        tracing::info!(
            transfer_id = %transfer_id_of(&pair.outflow)?,
            "transfer deleted"
        );

        Ok(pair)
    }

    /// Turn an orphaned leg into a plain transaction
    ///
    /// Refuses to touch a leg that still has exactly one sibling.
    pub fn detach_orphan(&self, id: TransactionId) -> LedgerResult<Transaction> {
        let detached = self.storage.transaction(|s| {
            let mut leg = require_transaction(s, id)?;
            let transfer_id = transfer_id_of(&leg)?;

            if find_sibling(s, &leg).is_ok() {
                return Err(LedgerError::Validation(format!(
                    "Transfer {} is intact; delete or edit it instead",
                    transfer_id
                )));
            }

            leg.transfer_id = None;
            leg.touch();
            s.transactions.upsert(leg.clone())?;
            Ok(leg)
        })?;

        tracing::warn!(transaction_id = %detached.id, "orphaned transfer leg detached");
        Ok(detached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use crate::services::aggregation::AggregationService;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn create_account(storage: &Storage, name: &str, currency: &str, cents: i64) -> AccountId {
        let account = Account::with_initial_balance(name, currency, Money::from_cents(cents));
        let id = account.id;
        storage.transaction(|s| s.accounts.upsert(account)).unwrap();
        id
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    fn balance(storage: &Storage, id: AccountId) -> i64 {
        AggregationService::new(storage)
            .current_balance(id)
            .unwrap()
            .cents()
    }

    #[test]
    fn test_create_transfer_moves_balances() {
        let (_temp_dir, storage) = create_test_storage();
        let a = create_account(&storage, "A", "EUR", 50000);
        let b = create_account(&storage, "B", "EUR", 20000);

        let pair = TransferService::new(&storage)
            .create(CreateTransfer::new(a, b, Money::from_cents(10000), date()))
            .unwrap();

        assert_eq!(balance(&storage, a), 40000);
        assert_eq!(balance(&storage, b), 30000);
        assert_eq!(pair.outflow.amount.cents(), -10000);
        assert_eq!(pair.inflow.amount.cents(), 10000);
        assert_eq!(pair.outflow.payee, "Transfer to B");
        assert_eq!(pair.inflow.payee, "Transfer from A");
        assert_eq!(pair.inflow.payment_type, PaymentMethod::BankTransfer);

        let legs = storage
            .transactions
            .get_by_transfer(pair.transfer_id().unwrap())
            .unwrap();
        assert_eq!(legs.len(), 2);
    }

    #[test]
    fn test_create_with_target_amount() {
        let (_temp_dir, storage) = create_test_storage();
        let eur = create_account(&storage, "Euro", "EUR", 0);
        let chf = create_account(&storage, "Franc", "CHF", 0);

        let mut input = CreateTransfer::new(eur, chf, Money::from_cents(10000), date());
        input.target_amount = Some(Money::from_cents(9650));
        input.memo = "exchange".into();
        let pair = TransferService::new(&storage).create(input).unwrap();

        assert_eq!(pair.outflow.amount.cents(), -10000);
        assert_eq!(pair.inflow.amount.cents(), 9650);
        assert_eq!(pair.inflow.memo, "exchange");
    }

    #[test]
    fn test_create_rejects_same_account() {
        let (_temp_dir, storage) = create_test_storage();
        let a = create_account(&storage, "A", "EUR", 0);

        let err = TransferService::new(&storage)
            .create(CreateTransfer::new(a, a, Money::from_cents(100), date()))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransfer(_)));
        assert_eq!(storage.transactions.count().unwrap(), 0);
    }

    #[test]
    fn test_create_rejects_non_positive_amounts() {
        let (_temp_dir, storage) = create_test_storage();
        let a = create_account(&storage, "A", "EUR", 0);
        let b = create_account(&storage, "B", "EUR", 0);
        let service = TransferService::new(&storage);

        let err = service
            .create(CreateTransfer::new(a, b, Money::zero(), date()))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let mut input = CreateTransfer::new(a, b, Money::from_cents(100), date());
        input.target_amount = Some(Money::from_cents(-1));
        assert!(service.create(input).unwrap_err().is_validation());
        assert_eq!(storage.transactions.count().unwrap(), 0);
    }

    #[test]
    fn test_create_with_missing_account_writes_nothing() {
        let (_temp_dir, storage) = create_test_storage();
        let a = create_account(&storage, "A", "EUR", 0);

        let err = TransferService::new(&storage)
            .create(CreateTransfer::new(a, AccountId::new(), Money::from_cents(100), date()))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(storage.transactions.count().unwrap(), 0);
    }

    #[test]
    fn test_edit_amount_mirrors_to_inflow() {
        let (_temp_dir, storage) = create_test_storage();
        let a = create_account(&storage, "A", "EUR", 0);
        let b = create_account(&storage, "B", "EUR", 0);
        let service = TransferService::new(&storage);
        let pair = service
            .create(CreateTransfer::new(a, b, Money::from_cents(10000), date()))
            .unwrap();

        let edited = service
            .edit(
                pair.outflow.id,
                TransferChanges {
                    amount: Some(Money::from_cents(15000)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(edited.outflow.amount.cents(), -15000);
        assert_eq!(edited.inflow.amount.cents(), 15000);
        assert_eq!(balance(&storage, b), 15000);
    }

    #[test]
    fn test_edit_with_target_override() {
        let (_temp_dir, storage) = create_test_storage();
        let a = create_account(&storage, "A", "EUR", 0);
        let b = create_account(&storage, "B", "USD", 0);
        let service = TransferService::new(&storage);
        let pair = service
            .create(CreateTransfer::new(a, b, Money::from_cents(10000), date()))
            .unwrap();

        let edited = service
            .edit(
                pair.outflow.id,
                TransferChanges {
                    amount: Some(Money::from_cents(15000)),
                    target_amount: Some(Money::from_cents(16200)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(edited.outflow.amount.cents(), -15000);
        assert_eq!(edited.inflow.amount.cents(), 16200);
    }

    #[test]
    fn test_edit_mirrors_date_and_memo_but_not_payee() {
        let (_temp_dir, storage) = create_test_storage();
        let a = create_account(&storage, "A", "EUR", 0);
        let b = create_account(&storage, "B", "EUR", 0);
        let service = TransferService::new(&storage);
        let pair = service
            .create(CreateTransfer::new(a, b, Money::from_cents(100), date()))
            .unwrap();

        let new_date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let edited = service
            .edit(
                pair.outflow.id,
                TransferChanges {
                    date: Some(new_date),
                    memo: Some("savings".into()),
                    payee: Some("Monthly savings".into()),
                    payment_type: Some(PaymentMethod::Online),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(edited.inflow.date, new_date);
        assert_eq!(edited.inflow.memo, "savings");
        assert_eq!(edited.outflow.payee, "Monthly savings");
        assert_eq!(edited.inflow.payee, "Transfer from A");
        assert_eq!(edited.outflow.payment_type, PaymentMethod::Online);
        assert_eq!(edited.inflow.payment_type, PaymentMethod::BankTransfer);
    }

    #[test]
    fn test_edit_rejects_inflow_leg() {
        let (_temp_dir, storage) = create_test_storage();
        let a = create_account(&storage, "A", "EUR", 0);
        let b = create_account(&storage, "B", "EUR", 0);
        let service = TransferService::new(&storage);
        let pair = service
            .create(CreateTransfer::new(a, b, Money::from_cents(100), date()))
            .unwrap();

        let err = service
            .edit(pair.inflow.id, TransferChanges::default())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_edit_reassign_account() {
        let (_temp_dir, storage) = create_test_storage();
        let a = create_account(&storage, "A", "EUR", 0);
        let b = create_account(&storage, "B", "EUR", 0);
        let c = create_account(&storage, "C", "EUR", 0);
        let service = TransferService::new(&storage);
        let pair = service
            .create(CreateTransfer::new(a, b, Money::from_cents(100), date()))
            .unwrap();

        let edited = service
            .edit(
                pair.outflow.id,
                TransferChanges {
                    target_account: Some(c),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(edited.outflow.account_id, a);
        assert_eq!(edited.inflow.account_id, c);
        assert_eq!(balance(&storage, b), 0);
        assert_eq!(balance(&storage, c), 100);

        let err = service
            .edit(
                pair.outflow.id,
                TransferChanges {
                    source_account: Some(c),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransfer(_)));
        assert_eq!(
            storage.transactions.get(pair.outflow.id).unwrap().unwrap().account_id,
            a
        );
    }

    #[test]
    fn test_edit_orphaned_leg_fails() {
        let (_temp_dir, storage) = create_test_storage();
        let a = create_account(&storage, "A", "EUR", 0);
        let b = create_account(&storage, "B", "EUR", 0);
        let service = TransferService::new(&storage);
        let pair = service
            .create(CreateTransfer::new(a, b, Money::from_cents(100), date()))
            .unwrap();

        // Simulate corruption: the inflow vanished
        storage
            .transaction(|s| s.transactions.delete(pair.inflow.id).map(|_| ()))
            .unwrap();

        let err = service
            .edit(
                pair.outflow.id,
                TransferChanges {
                    amount: Some(Money::from_cents(500)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::OrphanedTransferLeg { .. }));

        let stored = storage.transactions.get(pair.outflow.id).unwrap().unwrap();
        assert_eq!(stored.amount.cents(), -100);
        assert!(stored.transfer_id.is_some());
    }

    #[test]
    fn test_delete_either_leg_removes_both() {
        let (_temp_dir, storage) = create_test_storage();
        let a = create_account(&storage, "A", "EUR", 50000);
        let b = create_account(&storage, "B", "EUR", 20000);
        let service = TransferService::new(&storage);
        let pair = service
            .create(CreateTransfer::new(a, b, Money::from_cents(10000), date()))
            .unwrap();

        service.delete(pair.inflow.id).unwrap();

        assert_eq!(storage.transactions.count().unwrap(), 0);
        assert_eq!(balance(&storage, a), 50000);
        assert_eq!(balance(&storage, b), 20000);
    }

    #[test]
    fn test_delete_orphan_fails() {
        let (_temp_dir, storage) = create_test_storage();
        let a = create_account(&storage, "A", "EUR", 0);
        let b = create_account(&storage, "B", "EUR", 0);
        let service = TransferService::new(&storage);
        let pair = service
            .create(CreateTransfer::new(a, b, Money::from_cents(100), date()))
            .unwrap();
        storage
            .transaction(|s| s.transactions.delete(pair.outflow.id).map(|_| ()))
            .unwrap();

        let err = service.delete(pair.inflow.id).unwrap_err();
        assert!(err.is_consistency());
        assert_eq!(storage.transactions.count().unwrap(), 1);
    }

    #[test]
    fn test_detach_orphan() {
        let (_temp_dir, storage) = create_test_storage();
        let a = create_account(&storage, "A", "EUR", 0);
        let b = create_account(&storage, "B", "EUR", 0);
        let service = TransferService::new(&storage);
        let pair = service
            .create(CreateTransfer::new(a, b, Money::from_cents(100), date()))
            .unwrap();

        let err = service.detach_orphan(pair.outflow.id).unwrap_err();
        assert!(err.is_validation());

        storage
            .transaction(|s| s.transactions.delete(pair.outflow.id).map(|_| ()))
            .unwrap();
        let detached = service.detach_orphan(pair.inflow.id).unwrap();
        assert!(detached.transfer_id.is_none());
        assert_eq!(detached.amount.cents(), 100);
    }

    #[test]
    fn test_pair_orders_legs() {
        let (_temp_dir, storage) = create_test_storage();
        let a = create_account(&storage, "A", "EUR", 0);
        let b = create_account(&storage, "B", "EUR", 0);
        let service = TransferService::new(&storage);
        let created = service
            .create(CreateTransfer::new(a, b, Money::from_cents(100), date()))
            .unwrap();

        let pair = service.pair(created.inflow.id).unwrap();
        assert_eq!(pair.outflow.id, created.outflow.id);
        assert_eq!(pair.inflow.id, created.inflow.id);
    }
}

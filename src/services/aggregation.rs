//! Balance and aggregation engine
//!
//! Everything here is derived from the stored transactions on every call:
//! account balances, category usage (own plus all descendants) and payee
//! usage. Nothing is cached, so a read can never disagree with the rows.
//!
//! A transaction pointing at a missing account or category is left out of
//! that aggregate only.

use std::collections::{BTreeMap, HashMap};
use std::ops::AddAssign;

use serde::Serialize;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Account, AccountId, Category, CategoryId, Money, Payee, Transaction};
use crate::storage::Storage;

/// Number of transactions and their summed amount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    pub count: usize,
    pub total: Money,
}

impl UsageStats {
    fn add(&mut self, amount: Money) {
        self.count += 1;
        self.total += amount;
    }
}

impl AddAssign for UsageStats {
    fn add_assign(&mut self, other: Self) {
        self.count += other.count;
        self.total += other.total;
    }
}

fn balance_overflow(account: &Account) -> LedgerError {
    LedgerError::Consistency(format!(
        "balance of account '{}' ({}) is out of range",
        account.name, account.id
    ))
}

/// `initial_balance + Σ amount` over the account's transactions
pub fn current_balance(account: &Account, transactions: &[Transaction]) -> LedgerResult<Money> {
    transactions
        .iter()
        .filter(|t| t.account_id == account.id)
        .try_fold(account.initial_balance, |acc, t| acc.checked_add(t.amount))
        .ok_or_else(|| balance_overflow(account))
}

/// Current balance and transaction count for every account in one pass
pub fn balances(
    accounts: &[Account],
    transactions: &[Transaction],
) -> LedgerResult<HashMap<AccountId, (Money, usize)>> {
    let mut result: HashMap<AccountId, (Money, usize)> = accounts
        .iter()
        .map(|a| (a.id, (a.initial_balance, 0)))
        .collect();

    for txn in transactions {
        if let Some((balance, count)) = result.get_mut(&txn.account_id) {
            match balance.checked_add(txn.amount) {
                Some(sum) => *balance = sum,
                None => {
                    let account = accounts.iter().find(|a| a.id == txn.account_id);
                    return Err(account.map(balance_overflow).unwrap_or_else(|| {
                        LedgerError::Consistency("balance out of range".into())
                    }));
                }
            }
            *count += 1;
        }
    }

    Ok(result)
}

/// Index-addressable view of the category forest
///
/// Categories whose parent is missing are roots. A category whose ancestry
/// never reaches a root (a parent cycle) is outside the forest: it reports
/// its own usage only.
struct CategoryArena<'c> {
    categories: &'c [Category],
    index: HashMap<CategoryId, usize>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl<'c> CategoryArena<'c> {
    fn build(categories: &'c [Category]) -> Self {
        let index: HashMap<CategoryId, usize> = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id, i))
            .collect();

        let mut parent = vec![None; categories.len()];
        let mut children = vec![Vec::new(); categories.len()];
        let mut roots = Vec::new();

        for (i, category) in categories.iter().enumerate() {
            match category.parent_id.and_then(|p| index.get(&p).copied()) {
                Some(p) => {
                    parent[i] = Some(p);
                    children[p].push(i);
                }
                None => roots.push(i),
            }
        }

        Self {
            categories,
            index,
            parent,
            children,
            roots,
        }
    }

    /// Depth-first pre-order over the forest with each node's depth
    fn preorder(&self) -> Vec<(usize, usize)> {
        let mut order = Vec::with_capacity(self.categories.len());
        let mut stack: Vec<(usize, usize)> = self.roots.iter().rev().map(|&r| (r, 0)).collect();

        while let Some((i, depth)) = stack.pop() {
            order.push((i, depth));
            stack.extend(self.children[i].iter().rev().map(|&c| (c, depth + 1)));
        }

        order
    }

    /// Own and recursive stats per arena slot
    fn stats(&self, transactions: &[Transaction]) -> (Vec<UsageStats>, Vec<UsageStats>) {
        let mut own = vec![UsageStats::default(); self.categories.len()];
        for txn in transactions {
            if let Some(&i) = txn.category_id.as_ref().and_then(|id| self.index.get(id)) {
                own[i].add(txn.amount);
            }
        }

        // Reverse pre-order visits every child before its parent
        let mut total = own.clone();
        for (i, _) in self.preorder().into_iter().rev() {
            if let Some(p) = self.parent[i] {
                let child = total[i];
                total[p] += child;
            }
        }

        (own, total)
    }

    fn descendants(&self, id: CategoryId) -> Vec<CategoryId> {
        let Some(&start) = self.index.get(&id) else {
            return Vec::new();
        };

        let mut seen = vec![false; self.categories.len()];
        seen[start] = true;
        let mut stack = self.children[start].clone();
        let mut result = Vec::new();

        while let Some(i) = stack.pop() {
            if std::mem::replace(&mut seen[i], true) {
                continue;
            }
            result.push(self.categories[i].id);
            stack.extend(self.children[i].iter().copied());
        }

        result
    }
}

/// Recursive usage per category: own tallies plus every descendant's
pub fn category_stats(
    categories: &[Category],
    transactions: &[Transaction],
) -> HashMap<CategoryId, UsageStats> {
    let arena = CategoryArena::build(categories);
    let (_, total) = arena.stats(transactions);
    categories.iter().map(|c| c.id).zip(total).collect()
}

/// Ids of every category below `id`, at any depth
pub fn descendants(categories: &[Category], id: CategoryId) -> Vec<CategoryId> {
    CategoryArena::build(categories).descendants(id)
}

/// Usage per payee: transactions whose payee text equals the name exactly
pub fn payee_stats(payees: &[Payee], transactions: &[Transaction]) -> HashMap<String, UsageStats> {
    let mut stats: HashMap<String, UsageStats> = payees
        .iter()
        .map(|p| (p.name.clone(), UsageStats::default()))
        .collect();

    for txn in transactions {
        if let Some(entry) = stats.get_mut(txn.payee.as_str()) {
            entry.add(txn.amount);
        }
    }

    stats
}

/// Sum of current balances per currency code, no conversion
pub fn totals_by_currency(
    accounts: &[Account],
    transactions: &[Transaction],
) -> LedgerResult<BTreeMap<String, Money>> {
    let balances = balances(accounts, transactions)?;
    let mut totals: BTreeMap<String, Money> = BTreeMap::new();
    for account in accounts {
        let balance = balances.get(&account.id).map(|(b, _)| *b).unwrap_or_default();
        let total = totals.entry(account.currency.clone()).or_default();
        *total = total.checked_add(balance).ok_or_else(|| {
            LedgerError::Consistency(format!("{} total is out of range", account.currency))
        })?;
    }
    Ok(totals)
}

/// An account with its derived balance
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub account: Account,
    pub balance: Money,
    pub transaction_count: usize,
}

/// A category with its position in the tree and its usage
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    /// 0 for top-level categories
    pub depth: usize,
    /// Transactions assigned directly to this category
    pub own: UsageStats,
    /// Own usage plus every descendant's
    pub total: UsageStats,
}

/// A payee with its usage
#[derive(Debug, Clone, Serialize)]
pub struct PayeeSummary {
    pub payee: Payee,
    pub stats: UsageStats,
}

/// Read-only listings over the record store
pub struct AggregationService<'a> {
    storage: &'a Storage,
}

impl<'a> AggregationService<'a> {
    /// Create a new aggregation service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Every account with its current balance, sorted by name
    pub fn account_summaries(&self) -> LedgerResult<Vec<AccountSummary>> {
        let accounts = self.storage.accounts.get_all()?;
        let transactions = self.storage.transactions.get_all()?;
        let balances = balances(&accounts, &transactions)?;

        Ok(accounts
            .into_iter()
            .map(|account| {
                let (balance, transaction_count) = balances
                    .get(&account.id)
                    .copied()
                    .unwrap_or((account.initial_balance, 0));
                AccountSummary {
                    account,
                    balance,
                    transaction_count,
                }
            })
            .collect())
    }

    /// One account with its current balance
    pub fn account_summary(&self, id: AccountId) -> LedgerResult<AccountSummary> {
        let account = self
            .storage
            .accounts
            .get(id)?
            .ok_or_else(|| LedgerError::account_not_found(id.to_string()))?;
        let transactions = self.storage.transactions.get_by_account(id)?;

        Ok(AccountSummary {
            balance: current_balance(&account, &transactions)?,
            transaction_count: transactions.len(),
            account,
        })
    }

    /// Current balance of one account
    pub fn current_balance(&self, id: AccountId) -> LedgerResult<Money> {
        Ok(self.account_summary(id)?.balance)
    }

    /// Categories in tree order (each parent followed by its children)
    ///
    /// Categories caught in a parent cycle come last, at depth 0.
    pub fn category_summaries(&self) -> LedgerResult<Vec<CategorySummary>> {
        let categories = self.storage.categories.get_all()?;
        let transactions = self.storage.transactions.get_all()?;
        let arena = CategoryArena::build(&categories);
        let (own, total) = arena.stats(&transactions);

        let mut placed = vec![false; categories.len()];
        let mut ordered: Vec<(usize, usize)> = arena.preorder();
        for &(i, _) in &ordered {
            placed[i] = true;
        }
        let stranded: Vec<usize> = (0..categories.len()).filter(|&i| !placed[i]).collect();
        if !stranded.is_empty() {
            tracing::warn!(count = stranded.len(), "categories with cyclic parents");
        }
        ordered.extend(stranded.into_iter().map(|i| (i, 0)));

        Ok(ordered
            .into_iter()
            .map(|(i, depth)| CategorySummary {
                category: categories[i].clone(),
                depth,
                own: own[i],
                total: total[i],
            })
            .collect())
    }

    /// Recursive usage of one category
    pub fn category_stats(&self, id: CategoryId) -> LedgerResult<UsageStats> {
        if !self.storage.categories.exists(id)? {
            return Err(LedgerError::category_not_found(id.to_string()));
        }
        let categories = self.storage.categories.get_all()?;
        let transactions = self.storage.transactions.get_all()?;
        Ok(category_stats(&categories, &transactions)
            .remove(&id)
            .unwrap_or_default())
    }

    /// Every payee with its usage, sorted by name
    pub fn payee_summaries(&self) -> LedgerResult<Vec<PayeeSummary>> {
        let payees = self.storage.payees.get_all()?;
        let transactions = self.storage.transactions.get_all()?;
        let mut stats = payee_stats(&payees, &transactions);

        Ok(payees
            .into_iter()
            .map(|payee| PayeeSummary {
                stats: stats.remove(&payee.name).unwrap_or_default(),
                payee,
            })
            .collect())
    }

    /// Sum of balances per currency code
    pub fn totals_by_currency(&self) -> LedgerResult<BTreeMap<String, Money>> {
        let accounts = self.storage.accounts.get_all()?;
        let transactions = self.storage.transactions.get_all()?;
        totals_by_currency(&accounts, &transactions)
    }
}

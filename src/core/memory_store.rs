//! Thread-safe in-memory ledger store
//!
//! This module provides the `InMemoryLedgerStore` struct, the store backing the
//! ledger engine. It keeps accounts, operation types and transactions in
//! memory and implements the [`LedgerStore`] capability with real unit-of-work
//! semantics.
//!
//! # Design
//!
//! Reference data (accounts, operation types) lives in `DashMap`s for
//! fine-grained concurrent lookups. Every account owns an `AccountLedger`: the
//! account's transactions in creation order plus a version counter, behind a
//! `parking_lot::Mutex` that plays the role of the account's row locks.
//!
//! # Units of work
//!
//! A unit of work never touches the ledger directly. Reads see a snapshot of
//! the ledger overlaid with the unit's own staged writes; writes are staged.
//! Only after the caller's work succeeds are the staged writes validated and
//! applied to the ledger in one step, under the ledger lock. A failure
//! anywhere before that drops the staged writes, so nothing partial is ever
//! visible.
//!
//! # Isolation
//!
//! - [`IsolationMode::Locking`]: the ledger lock is held from the first read
//!   until the staged writes are applied. Concurrent units on the same account
//!   run strictly one after the other.
//! - [`IsolationMode::Optimistic`]: the unit works on a cloned snapshot without
//!   holding the lock and re-checks the ledger version on commit. A version
//!   change means another unit committed first; the unit is discarded with
//!   `LedgerError::Conflict`.
//!
//! Lock acquisition in both modes is bounded by the configured lock timeout.

use crate::config::{IsolationMode, LedgerConfig};
use crate::core::traits::{LedgerStore, ReferenceCheck, UnitOfWork};
use crate::types::account::{DOCUMENT_NUMBER_MAX_LEN, DOCUMENT_NUMBER_MIN_LEN};
use crate::types::{
    Account, AccountId, LedgerError, NewTransaction, OperationKind, OperationType,
    OperationTypeId, OutstandingDebit, SettlementUpdate, Transaction, TransactionId,
};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Transactions of one account plus the version used for conflict detection
#[derive(Debug, Default)]
struct AccountLedger {
    /// Bumped on every commit
    version: u64,

    /// In creation (commit) order
    transactions: Vec<Transaction>,
}

impl AccountLedger {
    /// Apply staged writes in one step
    ///
    /// Every update target is resolved before anything is changed, so a
    /// missing row leaves the ledger untouched.
    fn apply(&mut self, staged: StagedWrites) -> Result<(), LedgerError> {
        let mut positions = Vec::with_capacity(staged.updates.len());
        for update in &staged.updates {
            let position = self
                .transactions
                .iter()
                .position(|tx| tx.id == update.transaction_id)
                .ok_or_else(|| {
                    LedgerError::store(format!(
                        "transaction {} vanished before commit",
                        update.transaction_id
                    ))
                })?;
            positions.push(position);
        }

        for (position, update) in positions.into_iter().zip(staged.updates) {
            self.transactions[position].balance = update.balance;
        }
        self.transactions.extend(staged.inserts);
        self.version += 1;

        Ok(())
    }
}

/// Writes staged by a unit of work, waiting for commit
#[derive(Debug, Default)]
struct StagedWrites {
    /// Balance changes to rows that existed when the unit started
    updates: Vec<SettlementUpdate>,

    /// Rows created by the unit, in insert order
    inserts: Vec<Transaction>,
}

/// Unit of work over one account's ledger snapshot
struct MemoryUnit<'a> {
    account_id: AccountId,
    snapshot: &'a [Transaction],
    next_transaction_id: &'a AtomicI64,
    staged: StagedWrites,
}

impl<'a> MemoryUnit<'a> {
    fn new(
        account_id: AccountId,
        snapshot: &'a [Transaction],
        next_transaction_id: &'a AtomicI64,
    ) -> Self {
        Self {
            account_id,
            snapshot,
            next_transaction_id,
            staged: StagedWrites::default(),
        }
    }

    /// Balance of a snapshot row as seen by this unit
    fn visible_balance(&self, tx: &Transaction) -> Decimal {
        self.staged
            .updates
            .iter()
            .rev()
            .find(|update| update.transaction_id == tx.id)
            .map(|update| update.balance)
            .unwrap_or(tx.balance)
    }

    fn into_staged(self) -> StagedWrites {
        self.staged
    }
}

/// Enforce that a balance has the amount's sign (or is zero) and does not
/// exceed it in magnitude
fn check_balance_fits(
    transaction_id: Option<TransactionId>,
    amount: Decimal,
    balance: Decimal,
) -> Result<(), LedgerError> {
    let same_sign = balance.is_zero() || balance.is_sign_negative() == amount.is_sign_negative();
    if same_sign && balance.abs() <= amount.abs() {
        return Ok(());
    }

    let row = transaction_id
        .map(|id| format!("transaction {}", id))
        .unwrap_or_else(|| "new transaction".to_string());
    Err(LedgerError::store(format!(
        "balance {} does not fit amount {} of {}",
        balance, amount, row
    )))
}

impl UnitOfWork for MemoryUnit<'_> {
    fn outstanding_debits(&mut self) -> Result<Vec<OutstandingDebit>, LedgerError> {
        let existing = self
            .snapshot
            .iter()
            .map(|tx| OutstandingDebit::new(tx.id, self.visible_balance(tx)));
        let staged = self
            .staged
            .inserts
            .iter()
            .map(|tx| OutstandingDebit::new(tx.id, tx.balance));

        Ok(existing
            .chain(staged)
            .filter(|debit| debit.balance < Decimal::ZERO)
            .collect())
    }

    fn update_balance(&mut self, update: SettlementUpdate) -> Result<(), LedgerError> {
        if let Some(inserted) = self
            .staged
            .inserts
            .iter_mut()
            .find(|tx| tx.id == update.transaction_id)
        {
            check_balance_fits(Some(inserted.id), inserted.amount, update.balance)?;
            inserted.balance = update.balance;
            return Ok(());
        }

        let existing = self
            .snapshot
            .iter()
            .find(|tx| tx.id == update.transaction_id)
            .ok_or_else(|| {
                LedgerError::store(format!(
                    "transaction {} does not belong to account {}",
                    update.transaction_id, self.account_id
                ))
            })?;
        check_balance_fits(Some(existing.id), existing.amount, update.balance)?;

        self.staged.updates.push(update);
        Ok(())
    }

    fn insert_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<TransactionId, LedgerError> {
        if transaction.account_id != self.account_id {
            return Err(LedgerError::store(format!(
                "unit of work for account {} cannot insert into account {}",
                self.account_id, transaction.account_id
            )));
        }
        check_balance_fits(None, transaction.amount, transaction.balance)?;

        let id = self.next_transaction_id.fetch_add(1, Ordering::SeqCst);
        self.staged.inserts.push(Transaction {
            id,
            account_id: transaction.account_id,
            operation_type_id: transaction.operation_type_id,
            amount: transaction.amount,
            balance: transaction.balance,
            created_at: Utc::now(),
        });

        Ok(id)
    }
}

/// In-memory store for accounts, operation types and transactions
///
/// Safe to share across threads (wrap it in an `Arc`). Postings on different
/// accounts never contend; postings on the same account are isolated
/// according to the configured [`IsolationMode`].
#[derive(Debug)]
pub struct InMemoryLedgerStore {
    config: LedgerConfig,
    accounts: DashMap<AccountId, Account>,
    operation_types: DashMap<OperationTypeId, OperationType>,
    ledgers: DashMap<AccountId, Arc<Mutex<AccountLedger>>>,
    next_account_id: AtomicI64,
    next_transaction_id: AtomicI64,
}

impl InMemoryLedgerStore {
    /// Create an empty store with no accounts and no operation types
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            accounts: DashMap::new(),
            operation_types: DashMap::new(),
            ledgers: DashMap::new(),
            next_account_id: AtomicI64::new(1),
            next_transaction_id: AtomicI64::new(1),
        }
    }

    /// Create an empty store seeded with [`OperationType::standard_catalogue`]
    pub fn with_standard_operation_types(config: LedgerConfig) -> Self {
        let store = Self::new(config);
        for operation_type in OperationType::standard_catalogue() {
            store.register_operation_type(operation_type);
        }
        store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Create an account with the next free identifier
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Validation` if the document number is not between
    /// 3 and 255 characters long.
    pub fn create_account(&self, document_number: &str) -> Result<Account, LedgerError> {
        validate_document_number(document_number)?;

        let id = self.next_account_id.fetch_add(1, Ordering::SeqCst);
        let account = Account::new(id, document_number);
        self.accounts.insert(id, account.clone());
        self.ledgers.insert(id, Arc::default());

        Ok(account)
    }

    /// Insert an account with a caller-chosen identifier
    ///
    /// Used to seed the store from an external account list.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Validation` if the identifier is taken, not
    /// positive, or the document number is invalid.
    pub fn insert_account(&self, account: Account) -> Result<(), LedgerError> {
        if account.id <= 0 {
            return Err(LedgerError::validation(
                "account_id",
                format!("must be positive, got {}", account.id),
            ));
        }
        validate_document_number(&account.document_number)?;

        let id = account.id;
        let mut inserted = false;
        self.accounts.entry(id).or_insert_with(|| {
            inserted = true;
            account
        });
        if !inserted {
            return Err(LedgerError::validation(
                "account_id",
                format!("account {} already exists", id),
            ));
        }
        self.ledgers.insert(id, Arc::default());
        self.next_account_id.fetch_max(id + 1, Ordering::SeqCst);

        Ok(())
    }

    /// Register (or replace) an operation type
    pub fn register_operation_type(&self, operation_type: OperationType) {
        self.operation_types.insert(operation_type.id, operation_type);
    }

    pub fn account(&self, account_id: AccountId) -> Option<Account> {
        self.accounts
            .get(&account_id)
            .map(|entry| entry.value().clone())
    }

    pub fn operation_type(&self, operation_type_id: OperationTypeId) -> Option<OperationType> {
        self.operation_types
            .get(&operation_type_id)
            .map(|entry| entry.value().clone())
    }

    /// All accounts sorted by identifier
    pub fn accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by_key(|account| account.id);
        accounts
    }

    /// Committed transactions of one account in creation order
    pub fn transactions_for(&self, account_id: AccountId) -> Vec<Transaction> {
        self.ledger(account_id)
            .map(|ledger| {
                let guard = ledger.lock();
                guard.transactions.clone()
            })
            .unwrap_or_default()
    }

    /// Every committed transaction sorted by identifier
    pub fn all_transactions(&self) -> Vec<Transaction> {
        let ledgers: Vec<_> = self
            .ledgers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut transactions: Vec<Transaction> = ledgers
            .iter()
            .flat_map(|ledger| ledger.lock().transactions.clone())
            .collect();
        transactions.sort_by_key(|tx| tx.id);
        transactions
    }

    /// The account's ledger handle, cloned out so no map guard is held while
    /// waiting for the ledger lock
    fn ledger(&self, account_id: AccountId) -> Option<Arc<Mutex<AccountLedger>>> {
        self.ledgers
            .get(&account_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    fn lock<'l>(
        &self,
        ledger: &'l Mutex<AccountLedger>,
        account_id: AccountId,
    ) -> Result<MutexGuard<'l, AccountLedger>, LedgerError> {
        ledger
            .try_lock_for(self.config.lock_timeout)
            .ok_or_else(|| {
                LedgerError::store_retryable(format!(
                    "timed out after {}ms waiting for the ledger lock of account {}",
                    self.config.lock_timeout.as_millis(),
                    account_id
                ))
            })
    }
}

fn validate_document_number(document_number: &str) -> Result<(), LedgerError> {
    let len = document_number.chars().count();
    if !(DOCUMENT_NUMBER_MIN_LEN..=DOCUMENT_NUMBER_MAX_LEN).contains(&len) {
        return Err(LedgerError::validation(
            "document_number",
            format!(
                "must be between {} and {} characters in length",
                DOCUMENT_NUMBER_MIN_LEN, DOCUMENT_NUMBER_MAX_LEN
            ),
        ));
    }
    Ok(())
}

impl LedgerStore for InMemoryLedgerStore {
    fn check_references(
        &self,
        account_id: AccountId,
        operation_type_id: OperationTypeId,
    ) -> Result<ReferenceCheck, LedgerError> {
        Ok(ReferenceCheck {
            account_exists: self.accounts.contains_key(&account_id),
            operation_type_exists: self.operation_types.contains_key(&operation_type_id),
        })
    }

    fn operation_kind(
        &self,
        operation_type_id: OperationTypeId,
    ) -> Result<Option<OperationKind>, LedgerError> {
        Ok(self
            .operation_types
            .get(&operation_type_id)
            .map(|entry| entry.value().kind))
    }

    fn unit_of_work<T, F>(&self, account_id: AccountId, work: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, LedgerError>,
    {
        let ledger = self
            .ledger(account_id)
            .ok_or_else(|| LedgerError::account_not_found(account_id))?;

        match self.config.isolation {
            IsolationMode::Locking => {
                let mut guard = self.lock(&ledger, account_id)?;
                let (value, staged) = {
                    let mut unit =
                        MemoryUnit::new(account_id, &guard.transactions, &self.next_transaction_id);
                    let value = work(&mut unit)?;
                    (value, unit.into_staged())
                };
                guard.apply(staged)?;
                Ok(value)
            }
            IsolationMode::Optimistic => {
                let (version, snapshot) = {
                    let guard = self.lock(&ledger, account_id)?;
                    (guard.version, guard.transactions.clone())
                };

                let mut unit = MemoryUnit::new(account_id, &snapshot, &self.next_transaction_id);
                let value = work(&mut unit)?;
                let staged = unit.into_staged();

                let mut guard = self.lock(&ledger, account_id)?;
                if guard.version != version {
                    return Err(LedgerError::conflict(account_id, 1));
                }
                guard.apply(staged)?;
                Ok(value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    fn dec(value: i64, scale: u32) -> Decimal {
        Decimal::new(value, scale)
    }

    fn store(isolation: IsolationMode) -> InMemoryLedgerStore {
        let config = LedgerConfig::new(isolation, Duration::from_millis(50), 3);
        InMemoryLedgerStore::with_standard_operation_types(config)
    }

    fn debit(account_id: AccountId, amount: Decimal) -> NewTransaction {
        NewTransaction {
            account_id,
            operation_type_id: 1,
            amount: -amount,
            balance: -amount,
        }
    }

    #[test]
    fn test_create_account_assigns_sequential_ids() {
        let store = store(IsolationMode::Locking);
        let first = store.create_account("12345678900").unwrap();
        let second = store.create_account("98765432100").unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.account(2).unwrap().document_number, "98765432100");
    }

    #[rstest]
    #[case::too_short("12")]
    #[case::too_long(&"9".repeat(256))]
    fn test_create_account_rejects_document_number(#[case] document_number: &str) {
        let store = store(IsolationMode::Locking);
        assert!(matches!(
            store.create_account(document_number),
            Err(LedgerError::Validation { .. })
        ));
    }

    #[test]
    fn test_insert_account_rejects_duplicates_and_advances_ids() {
        let store = store(IsolationMode::Locking);
        store.insert_account(Account::new(10, "123")).unwrap();

        assert!(matches!(
            store.insert_account(Account::new(10, "456")),
            Err(LedgerError::Validation { .. })
        ));
        assert_eq!(store.create_account("789").unwrap().id, 11);
    }

    #[rstest]
    fn test_commit_makes_writes_visible(
        #[values(IsolationMode::Locking, IsolationMode::Optimistic)] isolation: IsolationMode,
    ) {
        let store = store(isolation);
        let account = store.create_account("12345678900").unwrap();

        let id = store
            .unit_of_work(account.id, |unit| unit.insert_transaction(debit(account.id, dec(40, 0))))
            .unwrap();

        let transactions = store.transactions_for(account.id);
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].id, id);
        assert_eq!(transactions[0].balance, dec(-40, 0));
    }

    #[rstest]
    fn test_failed_work_discards_staged_writes(
        #[values(IsolationMode::Locking, IsolationMode::Optimistic)] isolation: IsolationMode,
    ) {
        let store = store(isolation);
        let account = store.create_account("12345678900").unwrap();
        store
            .unit_of_work(account.id, |unit| unit.insert_transaction(debit(account.id, dec(40, 0))))
            .unwrap();

        let result: Result<(), _> = store.unit_of_work(account.id, |unit| {
            let debts = unit.outstanding_debits()?;
            unit.update_balance(SettlementUpdate::new(debts[0].transaction_id, Decimal::ZERO))?;
            unit.insert_transaction(debit(account.id, dec(5, 0)))?;
            Err(LedgerError::store("injected"))
        });

        assert_eq!(result, Err(LedgerError::store("injected")));
        let transactions = store.transactions_for(account.id);
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].balance, dec(-40, 0));
    }

    #[test]
    fn test_reads_see_own_staged_writes() {
        let store = store(IsolationMode::Locking);
        let account = store.create_account("12345678900").unwrap();

        store
            .unit_of_work(account.id, |unit| {
                let first = unit.insert_transaction(debit(account.id, dec(10, 0)))?;
                unit.insert_transaction(debit(account.id, dec(20, 0)))?;
                unit.update_balance(SettlementUpdate::new(first, Decimal::ZERO))?;

                let debts = unit.outstanding_debits()?;
                assert_eq!(debts.len(), 1);
                assert_eq!(debts[0].balance, dec(-20, 0));
                Ok(())
            })
            .unwrap();
    }

    #[rstest]
    #[case::flips_sign(dec(5, 0))]
    #[case::grows(dec(-41, 0))]
    fn test_update_that_breaks_balance_invariants_is_rejected(#[case] balance: Decimal) {
        let store = store(IsolationMode::Locking);
        let account = store.create_account("12345678900").unwrap();
        let id = store
            .unit_of_work(account.id, |unit| unit.insert_transaction(debit(account.id, dec(40, 0))))
            .unwrap();

        let result =
            store.unit_of_work(account.id, |unit| unit.update_balance(SettlementUpdate::new(id, balance)));

        assert!(matches!(result, Err(LedgerError::Store { retryable: false, .. })));
        assert_eq!(store.transactions_for(account.id)[0].balance, dec(-40, 0));
    }

    #[test]
    fn test_update_of_foreign_transaction_is_rejected() {
        let store = store(IsolationMode::Locking);
        let owner = store.create_account("12345678900").unwrap();
        let other = store.create_account("98765432100").unwrap();
        let id = store
            .unit_of_work(owner.id, |unit| unit.insert_transaction(debit(owner.id, dec(40, 0))))
            .unwrap();

        let result = store.unit_of_work(other.id, |unit| {
            unit.update_balance(SettlementUpdate::new(id, Decimal::ZERO))
        });

        assert!(matches!(result, Err(LedgerError::Store { .. })));
    }

    #[test]
    fn test_unit_of_work_on_unknown_account() {
        let store = store(IsolationMode::Locking);
        let result = store.unit_of_work(42, |_| Ok(()));
        assert_eq!(result, Err(LedgerError::account_not_found(42)));
    }

    #[test]
    fn test_lock_timeout_is_retryable_store_error() {
        let store = store(IsolationMode::Locking);
        let account = store.create_account("12345678900").unwrap();

        let ledger = store.ledger(account.id).unwrap();
        let _held = ledger.lock();

        let result = store.unit_of_work(account.id, |_| Ok(()));
        match result {
            Err(error @ LedgerError::Store { .. }) => assert!(error.is_retryable()),
            other => panic!("Expected retryable store error, got {:?}", other),
        }
    }

    #[test]
    fn test_optimistic_commit_detects_concurrent_commit() {
        let store = store(IsolationMode::Optimistic);
        let account = store.create_account("12345678900").unwrap();

        let result = store.unit_of_work(account.id, |unit| {
            unit.outstanding_debits()?;
            // Another unit commits while this one is still working
            store.unit_of_work(account.id, |inner| {
                inner.insert_transaction(debit(account.id, dec(1, 0)))
            })?;
            unit.insert_transaction(debit(account.id, dec(2, 0)))
        });

        assert_eq!(result, Err(LedgerError::conflict(account.id, 1)));
        let transactions = store.transactions_for(account.id);
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount, dec(-1, 0));
    }

    #[test]
    fn test_all_transactions_sorted_by_id() {
        let store = store(IsolationMode::Locking);
        let first = store.create_account("12345678900").unwrap();
        let second = store.create_account("98765432100").unwrap();

        for (account_id, amount) in [(second.id, 1), (first.id, 2), (second.id, 3)] {
            store
                .unit_of_work(account_id, |unit| {
                    unit.insert_transaction(debit(account_id, dec(amount, 0)))
                })
                .unwrap();
        }

        let ids: Vec<_> = store.all_transactions().iter().map(|tx| tx.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}

//! Concurrent postings against a single account
//!
//! Credits racing on the same outstanding debt must never settle it twice and
//! never lose a write, under either isolation mode.

use account_ledger::config::{IsolationMode, LedgerConfig};
use account_ledger::core::{InMemoryLedgerStore, LedgerStore, LedgerWriter};
use account_ledger::types::{AccountId, LedgerError, PostRequest, Transaction};
use rstest::rstest;
use rust_decimal::Decimal;
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tracing::Span;

const PURCHASE: i64 = 1;
const CREDIT_VOUCHER: i64 = 4;

fn setup(config: LedgerConfig) -> (LedgerWriter<InMemoryLedgerStore>, AccountId) {
    let store = Arc::new(InMemoryLedgerStore::with_standard_operation_types(
        config.clone(),
    ));
    let account = store
        .create_account("12345678900")
        .expect("account should be created");
    (LedgerWriter::new(store, &config, Span::none()), account.id)
}

fn config(isolation: IsolationMode) -> LedgerConfig {
    LedgerConfig {
        isolation,
        // Optimistic units may lose several races in a row under contention
        max_conflict_retries: 1_000,
        ..LedgerConfig::default()
    }
}

/// Post every request from its own thread, all released at once
fn race(
    writer: &LedgerWriter<InMemoryLedgerStore>,
    requests: Vec<PostRequest>,
) -> Vec<Result<account_ledger::types::PostedTransaction, LedgerError>> {
    let barrier = Arc::new(Barrier::new(requests.len()));

    thread::scope(|scope| {
        let handles: Vec<_> = requests
            .into_iter()
            .map(|request| {
                let barrier = Arc::clone(&barrier);
                scope.spawn(move || {
                    barrier.wait();
                    writer.post(request)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().expect("posting thread panicked"))
            .collect()
    })
}

fn sum_balances<'a>(rows: impl Iterator<Item = &'a Transaction>) -> Decimal {
    rows.map(|tx| tx.balance).sum()
}

#[rstest]
fn test_two_credits_never_settle_the_same_debt_twice(
    #[values(IsolationMode::Locking, IsolationMode::Optimistic)] isolation: IsolationMode,
) {
    let (writer, account) = setup(config(isolation));
    writer
        .post(PostRequest::new(account, PURCHASE, Decimal::new(100, 0)))
        .unwrap();

    let results = race(
        &writer,
        vec![
            PostRequest::new(account, CREDIT_VOUCHER, Decimal::new(60, 0)),
            PostRequest::new(account, CREDIT_VOUCHER, Decimal::new(70, 0)),
        ],
    );
    assert!(results.iter().all(Result::is_ok), "{:?}", results);

    let rows = writer.store().transactions_for(account);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].balance, Decimal::ZERO);
    // 130 credited against 100 of debt leaves exactly 30 of credit balance
    assert_eq!(sum_balances(rows[1..].iter()), Decimal::new(30, 0));
}

#[rstest]
fn test_many_small_credits_settle_exactly(
    #[values(IsolationMode::Locking, IsolationMode::Optimistic)] isolation: IsolationMode,
) {
    let (writer, account) = setup(config(isolation));
    for _ in 0..4 {
        writer
            .post(PostRequest::new(account, PURCHASE, Decimal::new(25, 0)))
            .unwrap();
    }

    let credits = (0..16)
        .map(|_| PostRequest::new(account, CREDIT_VOUCHER, Decimal::new(625, 2)))
        .collect();
    let results = race(&writer, credits);
    assert!(results.iter().all(Result::is_ok));

    let rows = writer.store().transactions_for(account);
    assert_eq!(rows.len(), 20);
    // 16 x 6.25 == 4 x 25: every debt closed, no credit left over
    assert!(rows.iter().all(|tx| tx.balance.is_zero()), "{:?}", rows);
}

#[rstest]
fn test_concurrent_debits_and_credits_conserve_value(
    #[values(IsolationMode::Locking, IsolationMode::Optimistic)] isolation: IsolationMode,
) {
    let (writer, account) = setup(config(isolation));

    let mut requests = Vec::new();
    for i in 0..10 {
        requests.push(PostRequest::new(account, PURCHASE, Decimal::new(10 + i, 0)));
        requests.push(PostRequest::new(account, CREDIT_VOUCHER, Decimal::new(7, 0)));
    }
    let results = race(&writer, requests);
    assert!(results.iter().all(Result::is_ok));

    let rows = writer.store().transactions_for(account);
    assert_eq!(rows.len(), 20);

    let debits: Decimal = rows.iter().filter(|tx| tx.amount < Decimal::ZERO).map(|tx| tx.amount).sum();
    let credits: Decimal = rows.iter().filter(|tx| tx.amount > Decimal::ZERO).map(|tx| tx.amount).sum();
    // Settlement moves value between rows but never creates or destroys it
    assert_eq!(sum_balances(rows.iter()), debits + credits);

    for tx in &rows {
        if tx.amount < Decimal::ZERO {
            assert!(tx.balance <= Decimal::ZERO && tx.balance >= tx.amount, "{:?}", tx);
        } else {
            assert!(tx.balance >= Decimal::ZERO && tx.balance <= tx.amount, "{:?}", tx);
        }
    }
}

#[test]
fn test_lock_timeout_surfaces_as_retryable_store_error() {
    let config = LedgerConfig {
        lock_timeout: Duration::from_millis(20),
        ..LedgerConfig::default()
    };
    let (writer, account) = setup(config);
    let (locked_tx, locked_rx) = mpsc::channel();

    thread::scope(|scope| {
        let store = writer.store();
        scope.spawn(move || {
            store
                .unit_of_work(account, |_unit| {
                    locked_tx.send(()).unwrap();
                    thread::sleep(Duration::from_millis(300));
                    Ok(())
                })
                .unwrap();
        });

        locked_rx.recv().unwrap();
        let result = writer.post(PostRequest::new(account, CREDIT_VOUCHER, Decimal::new(5, 0)));

        let error = result.unwrap_err();
        assert!(matches!(error, LedgerError::Store { .. }), "{:?}", error);
        assert!(error.is_retryable());
    });

    assert!(writer.store().transactions_for(account).is_empty());
}

#[test]
fn test_other_accounts_are_not_blocked() {
    let config = LedgerConfig {
        lock_timeout: Duration::from_millis(20),
        ..LedgerConfig::default()
    };
    let (writer, busy) = setup(config);
    let other = writer.store().create_account("98765432100").unwrap().id;
    let (locked_tx, locked_rx) = mpsc::channel();

    thread::scope(|scope| {
        let store = writer.store();
        scope.spawn(move || {
            store
                .unit_of_work(busy, |_unit| {
                    locked_tx.send(()).unwrap();
                    thread::sleep(Duration::from_millis(200));
                    Ok(())
                })
                .unwrap();
        });

        locked_rx.recv().unwrap();
        let posted = writer
            .post(PostRequest::new(other, PURCHASE, Decimal::new(5, 0)))
            .unwrap();
        assert_eq!(posted.balance, Decimal::new(-5, 0));
    });
}

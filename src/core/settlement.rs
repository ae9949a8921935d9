//! FIFO settlement of a credit against outstanding debt
//!
//! Pure computation: no store access, no side effects. Given a credit amount
//! and the account's outstanding debits in read order, [`settle`] works out
//! the new balance of each debit it touches and what is left of the credit.
//!
//! The pass is a waterfall:
//!
//! ```text
//! remaining = credit
//! for each debt (oldest first):
//!     remaining == 0        -> stop
//!     remaining >= |debt|   -> debt balance 0,                   remaining -= |debt|
//!     remaining <  |debt|   -> debt balance -(|debt| - remaining), remaining = 0, stop
//! remainder = remaining
//! ```

use crate::types::{LedgerError, OutstandingDebit, SettlementUpdate};
use rust_decimal::Decimal;

/// Outcome of a settlement pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settlement {
    /// New balances for the debits that were touched, in read order
    pub updates: Vec<SettlementUpdate>,

    /// Part of the credit left over after settling; never negative
    pub remainder: Decimal,
}

impl Settlement {
    /// Total debt relieved by this pass
    pub fn settled(&self, credit: Decimal) -> Decimal {
        credit - self.remainder
    }
}

/// Apply `credit` to `outstanding` oldest first
///
/// Entries whose balance is not negative are not debt and are skipped without
/// an update.
///
/// # Errors
///
/// Returns `LedgerError::Validation` if `credit` is not positive.
pub fn settle(credit: Decimal, outstanding: &[OutstandingDebit]) -> Result<Settlement, LedgerError> {
    if credit <= Decimal::ZERO {
        return Err(LedgerError::validation(
            "amount",
            format!("credit must be positive, got {}", credit),
        ));
    }

    let mut remaining = credit;
    let mut updates = Vec::new();

    for debit in outstanding {
        if remaining.is_zero() {
            break;
        }
        if debit.balance >= Decimal::ZERO {
            continue;
        }

        let debt = debit.balance.abs();
        if remaining >= debt {
            updates.push(SettlementUpdate::new(debit.transaction_id, Decimal::ZERO));
            remaining -= debt;
        } else {
            updates.push(SettlementUpdate::new(
                debit.transaction_id,
                -(debt - remaining),
            ));
            remaining = Decimal::ZERO;
        }
    }

    Ok(Settlement {
        updates,
        remainder: remaining,
    })
}

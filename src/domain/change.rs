//! Greedy change-making over a finite coin stock.
//!
//! The calculator walks the catalog from the largest coin down and takes as
//! many of each coin as both the stock and the remaining amount allow. It does
//! not backtrack: when the greedy walk ends with a remainder, the amount is
//! reported as infeasible even if another combination would have matched.
//! Fewer, larger coins keep the dispenser's drop count low.

use super::coin::{Cents, Denomination};
use super::inventory::{CoinSet, Inventory};
use crate::error::{Result, SettlementError};

/// Picks the coins to return for `amount` from `stock`.
///
/// Returns `Ok(None)` when the stock cannot cover the amount exactly, and an
/// empty set for a zero amount. A negative amount is a caller bug and yields
/// `InvalidArgument`. The stock is only read.
pub fn compute_change(amount: i64, stock: &Inventory) -> Result<Option<CoinSet>> {
    let mut remaining = u64::try_from(amount).map_err(|_| {
        SettlementError::InvalidArgument(format!("change amount must not be negative, got {amount}"))
    })?;

    let mut change = CoinSet::new();
    for denomination in Denomination::descending() {
        if remaining == 0 {
            break;
        }
        let value = u64::from(denomination.value());
        let wanted = remaining / value;
        let taken = wanted.min(u64::from(stock.count(denomination)));
        if taken > 0 {
            // taken <= stock count, which is a u32
            change.add(denomination, taken as u32);
            remaining -= taken * value;
        }
    }

    Ok((remaining == 0).then_some(change))
}

/// Whether [`compute_change`] would find a combination for `amount`.
pub fn can_satisfy(amount: Cents, stock: &Inventory) -> bool {
    matches!(compute_change(i64::from(amount), stock), Ok(Some(_)))
}

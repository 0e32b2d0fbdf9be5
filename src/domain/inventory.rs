use super::change;
use super::coin::{Cents, Denomination};
use crate::error::{Result, SettlementError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The machine's coin stock, by denomination.
///
/// Entries with a zero count are never stored, so a missing key and a count of
/// zero compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Denomination, u32>", into = "BTreeMap<Denomination, u32>")]
pub struct Inventory {
    counts: BTreeMap<Denomination, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a stock from literal counts. Repeated denominations are summed,
    /// saturating at `u32::MAX`; use [`Inventory::try_from_counts`] for
    /// untrusted input.
    pub fn from_counts(counts: impl IntoIterator<Item = (Denomination, u32)>) -> Self {
        let mut inventory = Self::new();
        for (denomination, count) in counts {
            let entry = inventory.counts.entry(denomination).or_default();
            *entry = entry.saturating_add(count);
        }
        inventory.counts.retain(|_, count| *count > 0);
        inventory
    }

    /// Like [`Inventory::from_counts`], but a repeated denomination whose counts
    /// add up past `u32::MAX` is an `InvalidArgument`.
    pub fn try_from_counts(counts: impl IntoIterator<Item = (Denomination, u32)>) -> Result<Self> {
        let mut inventory = Self::new();
        for (denomination, count) in counts {
            let entry = inventory.counts.entry(denomination).or_default();
            *entry = entry.checked_add(count).ok_or_else(|| {
                SettlementError::InvalidArgument(format!("too many {denomination} coins in stock"))
            })?;
        }
        inventory.counts.retain(|_, count| *count > 0);
        Ok(inventory)
    }

    pub fn count(&self, denomination: Denomination) -> u32 {
        self.counts.get(&denomination).copied().unwrap_or(0)
    }

    pub fn total_value(&self) -> Cents {
        self.counts.iter().map(|(d, c)| d.value() * c).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Non-empty entries, smallest denomination first.
    pub fn iter(&self) -> impl Iterator<Item = (Denomination, u32)> + '_ {
        self.counts.iter().map(|(d, c)| (*d, *c))
    }

    /// Whether `amount` can be returned from this stock using the greedy policy.
    pub fn can_satisfy(&self, amount: Cents) -> bool {
        change::can_satisfy(amount, self)
    }

    /// Applies a combined deposit/withdrawal as a single step.
    ///
    /// Every resulting count is checked before anything is written: on
    /// `NegativeStock` or `StockOverflow` the inventory is left exactly as it was.
    pub fn apply(&mut self, delta: &InventoryDelta) -> Result<()> {
        let mut updated = Vec::with_capacity(delta.changes.len());
        for (&denomination, &change) in &delta.changes {
            let available = self.count(denomination);
            let next = i64::from(available).saturating_add(change);
            if next < 0 {
                return Err(SettlementError::NegativeStock {
                    denomination,
                    available,
                    delta: change,
                });
            }
            let next = u32::try_from(next).map_err(|_| SettlementError::StockOverflow {
                denomination,
                available,
                delta: change,
            })?;
            updated.push((denomination, next));
        }

        for (denomination, count) in updated {
            if count == 0 {
                self.counts.remove(&denomination);
            } else {
                self.counts.insert(denomination, count);
            }
        }
        Ok(())
    }
}

impl From<BTreeMap<Denomination, u32>> for Inventory {
    fn from(counts: BTreeMap<Denomination, u32>) -> Self {
        Self::from_counts(counts)
    }
}

impl From<Inventory> for BTreeMap<Denomination, u32> {
    fn from(inventory: Inventory) -> Self {
        inventory.counts
    }
}

/// A bag of coins handed back to the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CoinSet {
    counts: BTreeMap<Denomination, u32>,
}

impl CoinSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, denomination: Denomination, count: u32) {
        if count > 0 {
            *self.counts.entry(denomination).or_default() += count;
        }
    }

    pub fn count(&self, denomination: Denomination) -> u32 {
        self.counts.get(&denomination).copied().unwrap_or(0)
    }

    pub fn total_value(&self) -> Cents {
        self.counts.iter().map(|(d, c)| d.value() * c).sum()
    }

    pub fn coin_count(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// One entry per physical coin, largest first (the order they are dropped).
    pub fn coins(&self) -> Vec<Denomination> {
        self.counts
            .iter()
            .rev()
            .flat_map(|(d, c)| std::iter::repeat_n(*d, *c as usize))
            .collect()
    }
}

impl FromIterator<Denomination> for CoinSet {
    fn from_iter<I: IntoIterator<Item = Denomination>>(iter: I) -> Self {
        let mut set = CoinSet::new();
        for coin in iter {
            set.add(coin, 1);
        }
        set
    }
}

/// Signed per-denomination change to an [`Inventory`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InventoryDelta {
    changes: BTreeMap<Denomination, i64>,
}

impl InventoryDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deposit(&mut self, coins: &[Denomination]) {
        for coin in coins {
            self.adjust(*coin, 1);
        }
    }

    pub fn withdraw(&mut self, coins: &CoinSet) {
        for (denomination, count) in &coins.counts {
            self.adjust(*denomination, -i64::from(*count));
        }
    }

    pub fn adjust(&mut self, denomination: Denomination, by: i64) {
        let entry = self.changes.entry(denomination).or_default();
        *entry += by;
        if *entry == 0 {
            self.changes.remove(&denomination);
        }
    }

    pub fn get(&self, denomination: Denomination) -> i64 {
        self.changes.get(&denomination).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

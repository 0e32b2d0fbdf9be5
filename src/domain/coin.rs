use crate::error::SettlementError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount of money in minor currency units (euro cents).
pub type Cents = u32;

/// A coin accepted by the machine, identified by its face value in cents.
///
/// Variants are declared in ascending value order so the derived `Ord`
/// matches the face value ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Denomination {
    OneCent = 1,
    TwoCents = 2,
    FiveCents = 5,
    TenCents = 10,
    TwentyCents = 20,
    FiftyCents = 50,
    OneEuro = 100,
    TwoEuros = 200,
}

impl Denomination {
    /// Every accepted denomination, smallest first.
    pub const ALL: [Denomination; 8] = [
        Denomination::OneCent,
        Denomination::TwoCents,
        Denomination::FiveCents,
        Denomination::TenCents,
        Denomination::TwentyCents,
        Denomination::FiftyCents,
        Denomination::OneEuro,
        Denomination::TwoEuros,
    ];

    pub const fn value(self) -> Cents {
        self as Cents
    }

    /// Iterates the catalog from the largest coin down.
    pub fn descending() -> impl Iterator<Item = Denomination> {
        Self::ALL.into_iter().rev()
    }
}

impl TryFrom<u32> for Denomination {
    type Error = SettlementError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|d| d.value() == value)
            .ok_or_else(|| SettlementError::InvalidArgument(format!("{value} is not an accepted coin")))
    }
}

impl From<Denomination> for u32 {
    fn from(denomination: Denomination) -> Self {
        denomination.value()
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            v if v >= 100 => write!(f, "{}EUR", v / 100),
            v => write!(f, "{v}c"),
        }
    }
}

/// Total face value of a sequence of coins, saturating at `Cents::MAX`.
pub fn total_value<'a>(coins: impl IntoIterator<Item = &'a Denomination>) -> Cents {
    coins
        .into_iter()
        .fold(0, |total: Cents, coin| total.saturating_add(coin.value()))
}

use super::coin::Cents;
use super::inventory::{CoinSet, InventoryDelta};
use super::payment::PaymentMethod;
use super::state::{SettlementState, StateTrail};
use serde::Serialize;
use std::fmt;

/// Why a customer did not get a beverage, or did not get their change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Rejection {
    InsufficientPayment { paid: Cents, price: Cents },
    HopperOverflow { inserted: usize, capacity: usize },
    ChangeUnavailable { change: Cents },
    BrewFailure,
    ChargeDeclined,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::InsufficientPayment { paid, price } => {
                write!(f, "paid {paid} of {price}")
            }
            Rejection::HopperOverflow { inserted, capacity } => {
                write!(f, "{inserted} coins inserted, hopper holds {capacity}")
            }
            Rejection::ChangeUnavailable { change } => write!(f, "cannot return {change} in change"),
            Rejection::BrewFailure => write!(f, "brewer failed"),
            Rejection::ChargeDeclined => write!(f, "card charge declined"),
        }
    }
}

/// Money handed back to the customer as compensation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "via", content = "amount", rename_all = "lowercase")]
pub enum Refund {
    #[default]
    None,
    /// Inserted coins returned through the hopper flush.
    Coins(Cents),
    /// Amount credited back to the card.
    Card(Cents),
}

/// Record of a finished settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementOutcome {
    pub method: PaymentMethod,
    /// Value taken from the customer: inserted coins, or the card charge once accepted.
    pub paid: Cents,
    pub brewed: bool,
    pub rejection: Option<Rejection>,
    /// Coins dispensed as change.
    pub change: CoinSet,
    /// Change owed but kept because the stock could not cover it.
    pub change_shortfall: Option<Cents>,
    pub refund: Refund,
    /// What was committed to the coin stock.
    pub delta: InventoryDelta,
    pub states: StateTrail,
}

impl SettlementOutcome {
    pub fn new(method: PaymentMethod, paid: Cents) -> Self {
        Self {
            method,
            paid,
            brewed: false,
            rejection: None,
            change: CoinSet::new(),
            change_shortfall: None,
            refund: Refund::None,
            delta: InventoryDelta::new(),
            states: StateTrail::new(),
        }
    }

    pub fn final_state(&self) -> SettlementState {
        self.states.current()
    }
}

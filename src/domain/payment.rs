use super::coin::{Cents, Denomination, total_value};
use serde::Serialize;

/// A single customer payment, as delivered by the coin validator or card reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    /// Coins already validated and held in the hopper, in insertion order.
    Coins(Vec<Denomination>),
    /// A card tap requesting the given amount.
    CardCharge(Cents),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Coins,
    Card,
}

impl PaymentEvent {
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentEvent::Coins(_) => PaymentMethod::Coins,
            PaymentEvent::CardCharge(_) => PaymentMethod::Card,
        }
    }

    /// Value offered by the customer.
    pub fn offered(&self) -> Cents {
        match self {
            PaymentEvent::Coins(coins) => total_value(coins),
            PaymentEvent::CardCharge(amount) => *amount,
        }
    }
}

impl From<Vec<Denomination>> for PaymentEvent {
    fn from(coins: Vec<Denomination>) -> Self {
        PaymentEvent::Coins(coins)
    }
}

use super::coin::{Cents, Denomination};
use super::inventory::{Inventory, InventoryDelta};
use crate::error::Result;
use async_trait::async_trait;

/// The beverage mechanism.
#[async_trait]
pub trait Brewer: Send + Sync {
    /// Brews one beverage. `false` means nothing was produced.
    async fn make_a_coffee(&self) -> bool;
}

/// The coin hopper and change dispenser.
#[async_trait]
pub trait CashDrop: Send + Sync {
    /// Ejects one coin from the stock. `false` if the coin was not physically there.
    async fn drop_cashback(&self, coin: Denomination) -> bool;
    /// Returns every coin currently held in the hopper to the customer.
    async fn flush_stored_money(&self) -> Result<()>;
}

/// The card payment terminal.
#[async_trait]
pub trait CardHandler: Send + Sync {
    async fn try_charge_amount(&self, amount: Cents) -> bool;
    async fn refund(&self, amount: Cents) -> Result<()>;
}

/// Owner of the machine's coin stock.
#[async_trait]
pub trait CoinStore: Send + Sync {
    /// Snapshot of the current stock.
    async fn stock(&self) -> Result<Inventory>;
    /// Applies `delta` atomically, or not at all.
    async fn apply(&self, delta: &InventoryDelta) -> Result<()>;
}

pub type BrewerBox = Box<dyn Brewer>;
pub type CashDropBox = Box<dyn CashDrop>;
pub type CardHandlerBox = Box<dyn CardHandler>;
pub type CoinStoreBox = Box<dyn CoinStore>;

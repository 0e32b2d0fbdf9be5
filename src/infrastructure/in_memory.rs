use crate::domain::inventory::{Inventory, InventoryDelta};
use crate::domain::ports::CoinStore;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory coin stock.
///
/// Uses `Arc<RwLock<Inventory>>` so clones share the same stock: the engine owns
/// one handle, while an operator console or a test can keep another to inspect it.
/// The stock lives as long as the process.
#[derive(Default, Clone)]
pub struct InMemoryCoinStore {
    stock: Arc<RwLock<Inventory>>,
}

impl InMemoryCoinStore {
    /// Creates an empty coin store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a coin store preloaded with `stock`.
    pub fn with_stock(stock: Inventory) -> Self {
        Self {
            stock: Arc::new(RwLock::new(stock)),
        }
    }
}

#[async_trait]
impl CoinStore for InMemoryCoinStore {
    async fn stock(&self) -> Result<Inventory> {
        let stock = self.stock.read().await;
        Ok(stock.clone())
    }

    async fn apply(&self, delta: &InventoryDelta) -> Result<()> {
        let mut stock = self.stock.write().await;
        stock.apply(delta)
    }
}

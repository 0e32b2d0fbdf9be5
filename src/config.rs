use crate::domain::coin::{Cents, Denomination};
use crate::domain::inventory::Inventory;
use crate::error::{Result, SettlementError};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// What to do when a paid beverage is owed change the stock cannot cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShortfallPolicy {
    /// Brew anyway and keep the overpayment; no change is dispensed.
    #[default]
    BrewAndKeep,
    /// Do not brew and return the inserted coins.
    Refuse,
}

/// Machine settings. Every field has a default, so an empty JSON object is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineConfig {
    /// Price of one beverage.
    pub price: Cents,
    /// Coins the hopper can physically hold before it stops accepting.
    pub hopper_capacity: usize,
    pub shortfall: ShortfallPolicy,
    /// Whether inserted coins join the stock when the change owed cannot be paid.
    pub credit_coins_on_shortfall: bool,
    pub card_reader: bool,
    pub initial_stock: Inventory,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            price: 50,
            hopper_capacity: 5,
            shortfall: ShortfallPolicy::default(),
            credit_coins_on_shortfall: true,
            card_reader: true,
            initial_stock: Inventory::new(),
        }
    }
}

impl MachineConfig {
    /// Loads a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.price == 0 {
            return Err(SettlementError::InvalidArgument(
                "price must be greater than zero".to_string(),
            ));
        }
        if self.hopper_capacity == 0 {
            return Err(SettlementError::InvalidArgument(
                "hopper capacity must be at least one coin".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parses a stock description such as `20=5,10=10`.
pub fn parse_stock(spec: &str) -> Result<Inventory> {
    let mut counts = Vec::new();
    for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (coin, count) = entry.split_once('=').ok_or_else(|| {
            SettlementError::InvalidArgument(format!("expected <coin>=<count>, got '{entry}'"))
        })?;
        let coin: u32 = coin.trim().parse().map_err(|_| {
            SettlementError::InvalidArgument(format!("invalid coin value '{coin}'"))
        })?;
        let count: u32 = count.trim().parse().map_err(|_| {
            SettlementError::InvalidArgument(format!("invalid coin count '{count}'"))
        })?;
        counts.push((Denomination::try_from(coin)?, count));
    }
    Inventory::try_from_counts(counts)
}

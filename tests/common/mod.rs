#![allow(dead_code)]

use brewpay::application::engine::{Collaborators, SettlementEngine};
use brewpay::config::MachineConfig;
use brewpay::domain::coin::Denomination;
use brewpay::domain::inventory::Inventory;
use brewpay::infrastructure::in_memory::InMemoryCoinStore;
use brewpay::infrastructure::simulated::{RecordingCashDrop, ScriptedBrewer, ScriptedCardHandler};
use rand::Rng;
use rand::seq::SliceRandom;
use std::fs::File;
use std::io::Error;
use std::path::Path;

/// An engine wired to simulated hardware, with handles kept for inspection.
pub struct Machine {
    pub engine: SettlementEngine,
    pub brewer: ScriptedBrewer,
    pub cash_drop: RecordingCashDrop,
    pub card: ScriptedCardHandler,
    pub store: InMemoryCoinStore,
}

impl Machine {
    pub fn new(stock: Inventory) -> Self {
        Self::with_config(stock, MachineConfig::default())
    }

    pub fn with_config(stock: Inventory, config: MachineConfig) -> Self {
        Self::assemble(ScriptedBrewer::new(), stock, config)
    }

    pub fn with_brewer(brewer: ScriptedBrewer, stock: Inventory) -> Self {
        Self::assemble(brewer, stock, MachineConfig::default())
    }

    fn assemble(brewer: ScriptedBrewer, stock: Inventory, config: MachineConfig) -> Self {
        let cash_drop = RecordingCashDrop::new();
        let card = ScriptedCardHandler::approving();
        let store = InMemoryCoinStore::with_stock(stock);
        let engine = SettlementEngine::new(
            Collaborators {
                brewer: Box::new(brewer.clone()),
                cash_drop: Box::new(cash_drop.clone()),
                card_handler: Box::new(card.clone()),
            },
            Box::new(store.clone()),
            config,
        );
        Self {
            engine,
            brewer,
            cash_drop,
            card,
            store,
        }
    }
}

/// Writes `rows` random scripted events in the simulator's CSV layout.
pub fn generate_events_csv(path: &Path, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    let mut rng = rand::thread_rng();

    wtr.write_record(["type", "coins", "amount", "brew", "charge"])?;

    for _ in 0..rows {
        let brew = if rng.gen_bool(0.9) { "ok" } else { "fail" };
        if rng.gen_bool(0.2) {
            let charge = if rng.gen_bool(0.8) { "ok" } else { "declined" };
            wtr.write_record(["card", "", "50", brew, charge])?;
        } else {
            let count = rng.gen_range(1..=6);
            let coins: Vec<String> = (0..count)
                .map(|_| {
                    Denomination::ALL
                        .choose(&mut rng)
                        .map(|d| d.value().to_string())
                        .unwrap_or_default()
                })
                .collect();
            wtr.write_record(["coins", &coins.join(" "), "", brew, ""])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

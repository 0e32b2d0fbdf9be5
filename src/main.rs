use brewpay::application::engine::{Collaborators, SettlementEngine};
use brewpay::config::{MachineConfig, ShortfallPolicy, parse_stock};
use brewpay::domain::coin::Cents;
use brewpay::domain::inventory::Inventory;
use brewpay::domain::ports::CardHandlerBox;
use brewpay::infrastructure::in_memory::InMemoryCoinStore;
use brewpay::infrastructure::noop::NoCardReader;
use brewpay::infrastructure::simulated::{RecordingCashDrop, ScriptedBrewer, ScriptedCardHandler};
use brewpay::interfaces::csv::event_reader::EventReader;
use brewpay::interfaces::csv::stock_writer::StockWriter;
use brewpay::interfaces::json::{Report, write_report};
use brewpay::telemetry;
use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scripted payment events CSV file
    input: PathBuf,

    /// Machine configuration (JSON). Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial coin stock, e.g. `20=5,10=10`
    #[arg(long, value_parser = parse_stock_arg)]
    stock: Option<Inventory>,

    /// Beverage price in cents
    #[arg(long)]
    price: Option<Cents>,

    /// Refuse to brew when the change owed cannot be returned
    #[arg(long)]
    refuse_on_shortfall: bool,

    /// Simulate a machine without a card reader
    #[arg(long)]
    no_card_reader: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn parse_stock_arg(raw: &str) -> std::result::Result<Inventory, String> {
    parse_stock(raw).map_err(|e| e.to_string())
}

impl Cli {
    fn machine_config(&self) -> Result<MachineConfig> {
        let mut config = match &self.config {
            Some(path) => MachineConfig::from_json_file(path).into_diagnostic()?,
            None => MachineConfig::default(),
        };
        if let Some(stock) = &self.stock {
            config.initial_stock = stock.clone();
        }
        if let Some(price) = self.price {
            config.price = price;
        }
        if self.refuse_on_shortfall {
            config.shortfall = ShortfallPolicy::Refuse;
        }
        if self.no_card_reader {
            config.card_reader = false;
        }
        config.validate().into_diagnostic()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_json);

    let config = cli.machine_config()?;

    let brewer = ScriptedBrewer::new();
    let card = ScriptedCardHandler::approving();
    let card_handler: CardHandlerBox = if config.card_reader {
        Box::new(card.clone())
    } else {
        Box::new(NoCardReader)
    };
    let store = InMemoryCoinStore::with_stock(config.initial_stock.clone());

    let engine = SettlementEngine::new(
        Collaborators {
            brewer: Box::new(brewer.clone()),
            cash_drop: Box::new(RecordingCashDrop::new()),
            card_handler,
        },
        Box::new(store),
        config,
    );

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = EventReader::new(file);
    let mut outcomes = Vec::new();
    for event in reader.events() {
        let scripted = match event {
            Ok(scripted) => scripted,
            Err(e) => {
                eprintln!("Error reading event: {}", e);
                continue;
            }
        };
        brewer.push_outcome(scripted.brew_succeeds).await;
        card.push_outcome(scripted.charge_approved).await;

        match engine.execute(scripted.event).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => eprintln!("Error settling payment: {}", e),
        }
        // Unconsumed scripts (refused coins never brew) must not leak into the next event.
        brewer.clear_script().await;
        card.clear_script().await;
    }

    let stock = engine.stock().await.into_diagnostic()?;

    let stdout = io::stdout();
    match cli.format {
        OutputFormat::Csv => StockWriter::new(stdout.lock())
            .write_stock(&stock)
            .into_diagnostic()?,
        OutputFormat::Json => write_report(
            stdout.lock(),
            &Report {
                outcomes: &outcomes,
                stock: &stock,
            },
        )
        .into_diagnostic()?,
    }

    Ok(())
}

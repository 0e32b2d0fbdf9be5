use crate::domain::coin::{Cents, Denomination};
use crate::domain::payment::PaymentEvent;
use crate::error::{Result, SettlementError};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum EventType {
    Coins,
    Card,
}

#[derive(Debug, Deserialize, PartialEq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
enum BrewScript {
    #[default]
    Ok,
    Fail,
}

#[derive(Debug, Deserialize, PartialEq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
enum ChargeScript {
    #[default]
    Ok,
    Declined,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    r#type: EventType,
    coins: Option<String>,
    amount: Option<Cents>,
    brew: Option<BrewScript>,
    charge: Option<ChargeScript>,
}

/// A payment event plus how the simulated hardware should react to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedEvent {
    pub event: PaymentEvent,
    pub brew_succeeds: bool,
    pub charge_approved: bool,
}

impl EventRecord {
    fn into_scripted(self) -> Result<ScriptedEvent> {
        let record = self;
        let event = match record.r#type {
            EventType::Coins => {
                let coins = record
                    .coins
                    .as_deref()
                    .unwrap_or_default()
                    .split_whitespace()
                    .map(parse_coin)
                    .collect::<Result<Vec<_>>>()?;
                PaymentEvent::Coins(coins)
            }
            EventType::Card => {
                let amount = record.amount.ok_or_else(|| {
                    SettlementError::InvalidArgument("card event without amount".to_string())
                })?;
                PaymentEvent::CardCharge(amount)
            }
        };
        Ok(ScriptedEvent {
            event,
            brew_succeeds: record.brew.unwrap_or_default() == BrewScript::Ok,
            charge_approved: record.charge.unwrap_or_default() == ChargeScript::Ok,
        })
    }
}

fn parse_coin(raw: &str) -> Result<Denomination> {
    let value: u32 = raw
        .parse()
        .map_err(|_| SettlementError::InvalidArgument(format!("invalid coin '{raw}'")))?;
    Denomination::try_from(value)
}

/// Reads scripted payment events from a CSV source.
///
/// Expected header: `type, coins, amount, brew, charge`. Trailing columns may be
/// omitted; `brew` and `charge` default to `ok`.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    /// Creates a new `EventReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and validates events.
    pub fn events(self) -> impl Iterator<Item = Result<ScriptedEvent>> {
        self.reader.into_deserialize::<EventRecord>().map(|result| {
            result
                .map_err(SettlementError::from)
                .and_then(EventRecord::into_scripted)
        })
    }
}

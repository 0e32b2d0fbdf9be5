use crate::domain::coin::Denomination;
use crate::domain::state::SettlementState;
use thiserror::Error;

/// Fatal or local errors raised while settling a payment.
///
/// Customer-facing refusals (insufficient payment, hopper overflow, ...) are not
/// errors; they are reported as [`Rejection`](crate::domain::outcome::Rejection)s
/// inside the settlement outcome.
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] serde_json::Error),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Applying {delta:+} to {denomination} would leave negative stock ({available} available)")]
    NegativeStock {
        denomination: Denomination,
        available: u32,
        delta: i64,
    },
    #[error("Applying {delta:+} to {denomination} would overflow its count ({available} stocked)")]
    StockOverflow {
        denomination: Denomination,
        available: u32,
        delta: i64,
    },
    #[error("Invalid settlement transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: SettlementState,
        to: SettlementState,
    },
    #[error("Cash drop could not eject a {coin} coin after dispensing {dispensed:?}")]
    CashDropFailed {
        coin: Denomination,
        dispensed: Vec<Denomination>,
    },
    #[error("Collaborator failure: {0}")]
    CollaboratorError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, SettlementError>;

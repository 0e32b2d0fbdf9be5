//! # brewpay
//!
//! Payment settlement and change-making for a coffee vending machine.
//!
//! The [`SettlementEngine`](application::engine::SettlementEngine) takes one
//! payment event at a time (coins from the hopper, or a card tap), drives the
//! brewer, change dispenser and card terminal through the ports in
//! [`domain::ports`], and keeps the coin stock consistent: coins are only
//! credited and change only withdrawn once a beverage has actually been brewed.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod telemetry;

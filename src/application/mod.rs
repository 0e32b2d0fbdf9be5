//! Application layer containing the settlement orchestration.
//!
//! This module defines the `SettlementEngine`, the single entry point that turns a
//! payment event into brewer, dispenser and card terminal calls. It serialises
//! settlements with a `tokio` mutex so the coin stock is never planned against
//! by two transactions at once.

pub mod engine;

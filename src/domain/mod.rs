//! Domain layer: coins, stock, change-making and the collaborator ports.
//!
//! Nothing in here performs I/O; the settlement engine in the application layer
//! drives the ports defined in [`ports`].

pub mod change;
pub mod coin;
pub mod inventory;
pub mod outcome;
pub mod payment;
pub mod ports;
pub mod state;

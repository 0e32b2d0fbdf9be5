//! Inputs and outputs of the simulator binary.

pub mod csv;
pub mod json;

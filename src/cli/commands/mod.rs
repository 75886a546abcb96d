//! Command implementations.

pub mod analyze;
pub mod check;
pub mod config_cmd;
pub mod extract;
pub mod tickets;

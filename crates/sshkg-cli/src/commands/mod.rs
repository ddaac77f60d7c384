//! Entry points for the two operating modes.

pub mod generate;
pub mod interactive;

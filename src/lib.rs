//! Common functionality for replan.
#![warn(missing_docs)]
pub mod analysis;
pub mod cli;
pub mod demand;
pub mod finance;
pub mod input;
pub mod log;
pub mod model;
pub mod optimisation;
pub mod output;
pub mod settings;
pub mod technology;
pub mod units;

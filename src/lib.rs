pub mod adapters;
pub mod aggregator;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod fx;
pub mod output;
pub mod sources;

pub use errors::{Error, Result};

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, DatagolTables, RunInput};
pub use error::ScoutError;
pub use types::*;

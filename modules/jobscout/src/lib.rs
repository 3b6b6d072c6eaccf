pub mod aggregator;
pub mod budget;
pub mod datagol;
pub mod dedup;
pub mod filter;
pub mod provider;
pub mod run_cache;
pub mod runner;
pub mod scheduler;
pub mod scout;
pub mod search_space;
pub mod sources;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

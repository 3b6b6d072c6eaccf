use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoutError {
    /// No title/location combinations to search. Fatal before scheduling.
    #[error("No search space: job titles ({titles}) x locations ({locations}) is empty")]
    EmptySearchSpace { titles: usize, locations: usize },

    /// Recent runs of the provider actor could not be listed. Fatal to the
    /// run-reuse lookup and to the invocation.
    #[error("Failed to list recent runs for {actor_id}: {message}")]
    ProviderList { actor_id: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

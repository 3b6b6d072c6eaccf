use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatagolError>;

#[derive(Debug, Error)]
pub enum DatagolError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for DatagolError {
    fn from(err: reqwest::Error) -> Self {
        DatagolError::Network(err.to_string())
    }
}

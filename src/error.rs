use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("agent rejected execute with status {0}")]
    ExecuteRejected(u16),

    #[error("coordinator rejected register with status {0}")]
    RegisterRejected(u16),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FleetError>;

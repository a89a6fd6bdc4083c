use barbuddy_client::{ClientError, ConfigError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("{0}")]
    Usage(String),

    #[error("could not render output: {0}")]
    Json(#[from] serde_json::Error),
}

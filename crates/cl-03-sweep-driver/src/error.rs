use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid sweep interval: {0}")]
    InvalidInterval(String),
}

use thiserror::Error;

use crate::core::types::EntityId;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Malformed update: {0}")]
    MalformedUpdate(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

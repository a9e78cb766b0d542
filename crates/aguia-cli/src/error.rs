use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] aguia_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("User id cannot be empty")]
    EmptyUserId,
    #[error("Nothing to change: pass at least one preference flag")]
    NothingToSet,
    #[error("No preferences stored for user {0}")]
    NoStoredPreferences(String),
    #[error("Save rejected: {0}")]
    SaveRejected(String),
}

impl From<aguia_core::models::EmptyUserId> for CliError {
    fn from(_: aguia_core::models::EmptyUserId) -> Self {
        Self::EmptyUserId
    }
}

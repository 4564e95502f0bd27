//! Error type shared by the file store and the stories storage.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// Nothing was ever written under this key, or it was already removed.
    #[error("No data saved for key: {0}")]
    NoDataSaved(String),

    #[error("Could not save file for key {key}: {source}")]
    CouldNotSaveFile {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Reserved for account-scoped storage.
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Failed to encode value for key {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode value for key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// True when the error only means "there is nothing stored here".
    pub fn is_no_data(&self) -> bool {
        matches!(self, StorageError::NoDataSaved(_))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

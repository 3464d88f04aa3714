//! Error types for slide bookmarking and search.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing bookmark state.
///
/// Structural problems in a presentation page are never errors: extraction
/// degrades to empty or placeholder values instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write the backing store.
    #[error("Store I/O error: {0}")]
    StoreIo(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("Store serialization error: {0}")]
    StoreSerialization(#[from] serde_json::Error),

    /// The backing store is not reachable at all.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// No collection with the given id exists.
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// The reserved default collection cannot be deleted.
    #[error("The default collection cannot be deleted")]
    ReservedCollection,

    /// The presentation page did not answer a message.
    #[error("Page unreachable: {0}")]
    PageUnreachable(String),

    /// Input could not be interpreted.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Error::StoreIo(_) | Error::StoreUnavailable(_) => {
                "Could not access saved bookmarks. Please try again.".to_string()
            }
            Error::StoreSerialization(_) => {
                "Saved bookmark data could not be read.".to_string()
            }
            Error::UnknownCollection(id) => format!("Collection '{}' no longer exists.", id),
            Error::ReservedCollection => "The General collection cannot be deleted.".to_string(),
            Error::PageUnreachable(_) => {
                "Could not reach the page. Confirm you are on a presentation and reload."
                    .to_string()
            }
            Error::InvalidInput(msg) => msg.clone(),
        }
    }
}

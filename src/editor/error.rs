//! Save failures and the messages shown for them.

use crate::{domain::DocumentError, storage::BackendError};

/// Shown when a failure carries no message of its own.
pub const GENERIC_ERROR: &str = "Something went wrong";

/// Reasons a save (or another editor call) did not go through.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// There is no signed-in user.
    #[error("You must be signed in to save")]
    NotAuthenticated,

    /// An article was saved without selecting a book.
    #[error("Select at least one book before saving an article")]
    MissingBook,

    /// The document does not have the required shape.
    #[error("The document is invalid: {0}")]
    InvalidDocument(#[from] DocumentError),

    /// The backend rejected the call or could not be reached.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SaveError {
    /// The text shown to the user.
    ///
    /// Backend failures without a message fall back to [`GENERIC_ERROR`].
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(error) => error.message().unwrap_or_else(|| GENERIC_ERROR.to_owned()),
            other => other.to_string(),
        }
    }

    /// Whether the failure happened before any network call.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        !matches!(self, Self::Backend(_))
    }
}

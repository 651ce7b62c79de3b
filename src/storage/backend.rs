//! The boundary between the editor and wherever content is persisted.

use std::future::Future;

use crate::{
    domain::{ContentKind, ContentPayload, ContentRecord, TaxonomyKind, TaxonomyOption},
    storage::LibraryError,
};

/// The calls the editor makes to fetch options and persist content.
///
/// Implemented over HTTP by [`crate::storage::HttpBackend`] and over a local
/// [`crate::storage::Library`] by [`crate::storage::LocalBackend`].
pub trait Backend: Send + Sync + 'static {
    /// Fetch every option of a taxonomy.
    fn fetch_taxonomy(
        &self,
        kind: TaxonomyKind,
    ) -> impl Future<Output = Result<Vec<TaxonomyOption>, BackendError>> + Send;

    /// Create a taxonomy option on behalf of a user.
    fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        name: &str,
        user_uid: &str,
    ) -> impl Future<Output = Result<TaxonomyOption, BackendError>> + Send;

    /// Fetch every book, projected to selectable options.
    fn fetch_books(&self) -> impl Future<Output = Result<Vec<TaxonomyOption>, BackendError>> + Send;

    /// Fetch a persisted record.
    fn fetch_content(
        &self,
        kind: ContentKind,
        id: &str,
    ) -> impl Future<Output = Result<ContentRecord, BackendError>> + Send;

    /// Create or update a record.
    ///
    /// The returned record is canonical: its taxonomy ids may differ from the
    /// payload's.
    fn upsert_content(
        &self,
        payload: &ContentPayload,
    ) -> impl Future<Output = Result<ContentRecord, BackendError>> + Send;
}

/// Failures reported by a [`Backend`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The request could not be sent or its response could not be read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server responded with {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The `message` field of the error body, if there was one.
        message: Option<String>,
    },

    /// The local library rejected the call.
    #[error(transparent)]
    Library(#[from] LibraryError),
}

impl BackendError {
    /// A message fit to show the user, if the failure carries one.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Http(_) => None,
            Self::Status { message, .. } => message.clone(),
            Self::Library(error) => Some(error.to_string()),
        }
    }
}

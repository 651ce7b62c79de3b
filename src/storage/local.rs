use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    domain::{ContentKind, ContentPayload, ContentRecord, TaxonomyKind, TaxonomyOption},
    storage::{Backend, BackendError, Library, LibraryError},
};

/// A [`Backend`] that reads and writes a [`Library`] on the local
/// filesystem.
///
/// Clones share the same library.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    library: Arc<RwLock<Library>>,
}

impl LocalBackend {
    /// Serve an opened library.
    #[must_use]
    pub fn new(library: Library) -> Self {
        Self {
            library: Arc::new(RwLock::new(library)),
        }
    }

    /// Shared access to the underlying library.
    #[must_use]
    pub fn library(&self) -> Arc<RwLock<Library>> {
        Arc::clone(&self.library)
    }
}

impl Backend for LocalBackend {
    async fn fetch_taxonomy(
        &self,
        kind: TaxonomyKind,
    ) -> Result<Vec<TaxonomyOption>, BackendError> {
        Ok(self.library.read().await.taxonomy(kind))
    }

    async fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        name: &str,
        user_uid: &str,
    ) -> Result<TaxonomyOption, BackendError> {
        let mut library = self.library.write().await;
        Ok(library.create_taxonomy(kind, name, user_uid)?)
    }

    async fn fetch_books(&self) -> Result<Vec<TaxonomyOption>, BackendError> {
        let library = self.library.read().await;
        Ok(library.books().map(crate::domain::Book::as_option).collect())
    }

    async fn fetch_content(
        &self,
        kind: ContentKind,
        id: &str,
    ) -> Result<ContentRecord, BackendError> {
        self.library
            .read()
            .await
            .record(kind, id)
            .cloned()
            .ok_or_else(|| LibraryError::NotFound(id.to_owned()).into())
    }

    async fn upsert_content(
        &self,
        payload: &ContentPayload,
    ) -> Result<ContentRecord, BackendError> {
        let mut library = self.library.write().await;
        Ok(library.upsert_content(payload)?)
    }
}

use std::time::Duration;

use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    domain::{
        ContentKind, ContentPayload, ContentRecord, NewTaxonomyOption, TaxonomyKind,
        TaxonomyOption,
    },
    storage::{Backend, BackendError},
};

const TIMEOUT: Duration = Duration::from_secs(30);

/// A [`Backend`] that talks JSON to the site's API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

/// A book as listed by the API. Only the fields needed to select it are
/// read.
#[derive(Debug, Deserialize)]
struct BookSummary {
    id: String,
    title: String,
}

/// The body of an error response.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl HttpBackend {
    /// Create a client for the API served at `base_url`.
    ///
    /// A trailing slash on the base URL is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(TIMEOUT).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { client, base_url })
    }

    fn url(&self, collection: &str, id: Option<&str>) -> String {
        id.map_or_else(
            || format!("{}/api/{collection}", self.base_url),
            |id| format!("{}/api/{collection}/{id}", self.base_url),
        )
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, BackendError> {
        tracing::debug!("GET {url}");
        read_response(self.client.get(url).send().await?).await
    }
}

/// Decode a successful response, or turn a failed one into a status error.
async fn read_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    // the error body is best effort; a missing or malformed one has no message
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message);
    tracing::warn!("request failed with {status}");

    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

impl Backend for HttpBackend {
    async fn fetch_taxonomy(
        &self,
        kind: TaxonomyKind,
    ) -> Result<Vec<TaxonomyOption>, BackendError> {
        self.get(&self.url(kind.collection(), None)).await
    }

    async fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        name: &str,
        user_uid: &str,
    ) -> Result<TaxonomyOption, BackendError> {
        let url = self.url(kind.collection(), None);
        tracing::debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .json(&NewTaxonomyOption { name, user_uid })
            .send()
            .await?;
        read_response(response).await
    }

    async fn fetch_books(&self) -> Result<Vec<TaxonomyOption>, BackendError> {
        let books: Vec<BookSummary> = self.get(&self.url("books", None)).await?;
        Ok(books
            .into_iter()
            .map(|book| TaxonomyOption::new(book.id, book.title))
            .collect())
    }

    async fn fetch_content(
        &self,
        kind: ContentKind,
        id: &str,
    ) -> Result<ContentRecord, BackendError> {
        self.get(&self.url(kind.collection(), Some(id))).await
    }

    async fn upsert_content(
        &self,
        payload: &ContentPayload,
    ) -> Result<ContentRecord, BackendError> {
        let id = payload.id.as_deref().filter(|id| !id.is_empty());
        let url = self.url(payload.kind.collection(), id);
        let request = if id.is_some() {
            tracing::debug!("PUT {url}");
            self.client.put(url)
        } else {
            tracing::debug!("POST {url}");
            self.client.post(url)
        };
        read_response(request.json(payload).send().await?).await
    }
}

//! Content records and the payload used to persist them.

use std::{fmt, str::FromStr};

use borsh::BorshSerialize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::document::Document;

/// The kinds of content the site publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// A review of a single book.
    Review,
    /// An article referencing one or more books.
    Article,
    /// A free-standing post.
    Post,
}

impl ContentKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 3] = [Self::Review, Self::Article, Self::Post];

    /// The plural name used for collections of this kind.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Review => "reviews",
            Self::Article => "articles",
            Self::Post => "posts",
        }
    }

    /// Whether content of this kind carries themes.
    #[must_use]
    pub const fn has_themes(self) -> bool {
        matches!(self, Self::Article)
    }

    /// Whether content of this kind must reference at least one book.
    #[must_use]
    pub const fn requires_book(self) -> bool {
        matches!(self, Self::Article)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Review => "review",
            Self::Article => "article",
            Self::Post => "post",
        };
        f.write_str(name)
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s || kind.collection() == s)
            .ok_or_else(|| format!("unknown content kind '{s}'"))
    }
}

/// Content visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Visible only to its author.
    #[default]
    Draft,
    /// Visible to everyone.
    Published,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => f.write_str("draft"),
            Self::Published => f.write_str("published"),
        }
    }
}

/// The books a piece of content references.
///
/// Reviews reference a single book and serialize it as a string; articles
/// serialize an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookIds {
    /// A single book.
    One(String),
    /// Any number of books.
    Many(Vec<String>),
}

impl BookIds {
    /// The referenced book ids.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        match self {
            Self::One(id) => std::slice::from_ref(id),
            Self::Many(ids) => ids,
        }
    }
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier issued by the authentication provider.
    pub uid: String,
    /// Display name.
    pub name: String,
}

impl User {
    /// Create a user.
    #[must_use]
    pub fn new(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
        }
    }
}

/// What the editor sends to be persisted.
///
/// An absent `id` creates a new record; a present one updates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPayload {
    /// Id of the record to update, if it has been persisted before.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The kind of content.
    pub kind: ContentKind,
    /// Derived from the first heading.
    pub title: String,
    /// Derived from the first paragraph.
    pub description: String,
    /// The document tree.
    pub raw_content: Document,
    /// The document rendered to HTML.
    pub html_content: String,
    /// Requested visibility.
    pub status: Status,
    /// Selected tags.
    pub tag_ids: Vec<String>,
    /// Selected themes; articles only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_ids: Option<Vec<String>>,
    /// Selected books.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_ids: Option<BookIds>,
    /// Estimated read time in minutes.
    pub read_time: u32,
    /// The saving user.
    pub user_uid: String,
}

impl ContentPayload {
    /// The referenced book ids, empty if there are none.
    #[must_use]
    pub fn book_ids(&self) -> &[String] {
        self.book_ids.as_ref().map(BookIds::ids).unwrap_or_default()
    }

    /// The selected theme ids, empty if there are none.
    #[must_use]
    pub fn theme_ids(&self) -> &[String] {
        self.theme_ids.as_deref().unwrap_or_default()
    }
}

/// A persisted review, article or post, as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    /// Server-assigned identifier.
    pub id: String,
    /// The kind of content.
    pub kind: ContentKind,
    /// Derived from the first heading.
    pub title: String,
    /// Derived from the first paragraph.
    pub description: String,
    /// The document tree.
    pub raw_content: Document,
    /// The document rendered to HTML.
    pub html_content: String,
    /// Visibility.
    pub status: Status,
    /// Attached tags.
    pub tag_ids: Vec<String>,
    /// Attached themes; articles only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_ids: Option<Vec<String>>,
    /// Referenced books.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_ids: Option<BookIds>,
    /// Estimated read time in minutes.
    pub read_time: u32,
    /// The author.
    pub user_uid: String,
    /// When the record was first saved.
    pub created: DateTime<Utc>,
    /// When the record last changed.
    pub updated: DateTime<Utc>,
}

impl ContentRecord {
    /// Build a record from a payload.
    ///
    /// Duplicate taxonomy ids are collapsed, keeping the first occurrence.
    #[must_use]
    pub fn from_payload(
        id: String,
        payload: &ContentPayload,
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind: payload.kind,
            title: payload.title.clone(),
            description: payload.description.clone(),
            raw_content: payload.raw_content.clone(),
            html_content: payload.html_content.clone(),
            status: payload.status,
            tag_ids: dedup(&payload.tag_ids),
            theme_ids: payload.theme_ids.as_deref().map(dedup),
            book_ids: payload.book_ids.as_ref().map(|books| match books {
                BookIds::One(id) => BookIds::One(id.clone()),
                BookIds::Many(ids) => BookIds::Many(dedup(ids)),
            }),
            read_time: payload.read_time,
            user_uid: payload.user_uid.clone(),
            created,
            updated,
        }
    }

    /// The referenced book ids, empty if there are none.
    #[must_use]
    pub fn book_ids(&self) -> &[String] {
        self.book_ids.as_ref().map(BookIds::ids).unwrap_or_default()
    }

    /// The attached theme ids, empty if there are none.
    #[must_use]
    pub fn theme_ids(&self) -> &[String] {
        self.theme_ids.as_deref().unwrap_or_default()
    }

    /// Returns a value generated by hashing the persisted content.
    ///
    /// Any change to the document, its derived values, the status or the
    /// taxonomy changes the fingerprint. Ids, authorship and timestamps do
    /// not contribute.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        #[derive(BorshSerialize)]
        struct FingerprintData<'a> {
            document: Vec<u8>,
            title: &'a str,
            description: &'a str,
            html: &'a str,
            published: bool,
            tags: &'a Vec<String>,
            themes: &'a Option<Vec<String>>,
            books: Vec<&'a str>,
            read_time: u32,
        }

        let data = FingerprintData {
            // attributes that do not reach the HTML still have to be stored
            document: serde_json::to_vec(&self.raw_content).unwrap_or_default(),
            title: &self.title,
            description: &self.description,
            html: &self.html_content,
            published: self.status == Status::Published,
            tags: &self.tag_ids,
            themes: &self.theme_ids,
            books: self.book_ids().iter().map(String::as_str).collect(),
            read_time: self.read_time,
        };

        // encode using [borsh](https://borsh.io/); writing into a Vec cannot fail
        let encoded = borsh::to_vec(&data).unwrap_or_default();
        let hash = Sha256::digest(encoded);
        format!("{hash:x}")
    }
}

fn dedup(ids: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::document::Node;

    fn payload() -> ContentPayload {
        ContentPayload {
            id: None,
            kind: ContentKind::Article,
            title: "Dune".to_owned(),
            description: "Spice".to_owned(),
            raw_content: Document::new(vec![Node::heading(1, vec![Node::text("Dune")])]),
            html_content: "<h1>Dune</h1>".to_owned(),
            status: Status::Draft,
            tag_ids: vec!["a".to_owned(), "b".to_owned(), "a".to_owned()],
            theme_ids: Some(vec!["t".to_owned()]),
            book_ids: Some(BookIds::Many(vec!["b1".to_owned(), "b1".to_owned()])),
            read_time: 1,
            user_uid: "u1".to_owned(),
        }
    }

    #[test]
    fn review_book_serializes_as_string() {
        let mut payload = payload();
        payload.kind = ContentKind::Review;
        payload.theme_ids = None;
        payload.book_ids = Some(BookIds::One("b1".to_owned()));

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["bookIds"], json!("b1"));
        assert_eq!(value["kind"], json!("review"));
        assert!(value.get("themeIds").is_none());
        assert!(value.get("id").is_none());
    }

    #[test]
    fn article_books_serialize_as_array() {
        let value = serde_json::to_value(payload()).unwrap();
        assert_eq!(value["bookIds"], json!(["b1", "b1"]));
        assert_eq!(value["rawContent"]["type"], json!("doc"));
    }

    #[test]
    fn record_collapses_duplicate_ids() {
        let now = Utc::now();
        let record = ContentRecord::from_payload("r1".to_owned(), &payload(), now, now);

        assert_eq!(record.tag_ids, vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(record.book_ids(), &["b1".to_owned()]);
    }

    #[test]
    fn fingerprint_ignores_ids_and_timestamps() {
        let payload = payload();
        let now = Utc::now();
        let first = ContentRecord::from_payload("r1".to_owned(), &payload, now, now);
        let second = ContentRecord::from_payload(
            "r2".to_owned(),
            &payload,
            now - chrono::Duration::days(1),
            now,
        );
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn status_affects_fingerprint() {
        let now = Utc::now();
        let draft = ContentRecord::from_payload("r1".to_owned(), &payload(), now, now);
        let mut published = draft.clone();
        published.status = Status::Published;
        assert_ne!(draft.fingerprint(), published.fingerprint());
    }

    #[test]
    fn node_attributes_affect_fingerprint() {
        let now = Utc::now();
        let plain = ContentRecord::from_payload("r1".to_owned(), &payload(), now, now);
        let mut aligned = plain.clone();
        aligned.raw_content = Document::new(vec![
            Node::heading(1, vec![Node::text("Dune")]).with_attr("textAlign", json!("center")),
        ]);

        assert_eq!(plain.html_content, aligned.html_content);
        assert_ne!(plain.fingerprint(), aligned.fingerprint());
    }

    #[test]
    fn content_kind_parses_singular_and_plural() {
        assert_eq!("article".parse::<ContentKind>(), Ok(ContentKind::Article));
        assert_eq!("reviews".parse::<ContentKind>(), Ok(ContentKind::Review));
        assert!("book".parse::<ContentKind>().is_err());
    }
}

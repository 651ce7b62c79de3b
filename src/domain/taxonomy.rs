//! Tags, themes, categories and the books content can reference.

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User-defined labels attachable to content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomyKind {
    /// Free-form tags.
    Tag,
    /// Recurring themes discussed by articles.
    Theme,
    /// Book categories.
    Category,
}

impl TaxonomyKind {
    /// Every kind.
    pub const ALL: [Self; 3] = [Self::Tag, Self::Theme, Self::Category];

    /// The plural name used for collections of this kind.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Tag => "tags",
            Self::Theme => "themes",
            Self::Category => "categories",
        }
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tag => "tag",
            Self::Theme => "theme",
            Self::Category => "category",
        };
        f.write_str(name)
    }
}

impl FromStr for TaxonomyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s || kind.collection() == s)
            .ok_or_else(|| format!("unknown taxonomy '{s}'"))
    }
}

/// A selectable option: a tag, theme, category or book projected to its id
/// and display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxonomyOption {
    /// Identifier of the underlying entity.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl TaxonomyOption {
    /// Create an option.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Request body for creating a taxonomy option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaxonomyOption<'a> {
    /// Display name of the new option.
    pub name: &'a str,
    /// The creating user.
    pub user_uid: &'a str,
}

/// A book that reviews and articles can reference.
///
/// Articles that reference a book push their tags and themes onto it, see
/// [`crate::domain::merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Stable identifier.
    pub id: String,
    /// Title of the book.
    pub title: String,
    /// Author, if known.
    pub author: Option<String>,
    /// Tags attached to the book.
    pub tag_ids: BTreeSet<String>,
    /// Themes attached to the book.
    pub theme_ids: BTreeSet<String>,
    /// When the book was added.
    pub created: DateTime<Utc>,
}

impl Book {
    /// A new book with a fresh id and no taxonomy.
    #[must_use]
    pub fn new(title: String, author: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            author,
            tag_ids: BTreeSet::new(),
            theme_ids: BTreeSet::new(),
            created: Utc::now(),
        }
    }

    /// The book as a selectable option.
    #[must_use]
    pub fn as_option(&self) -> TaxonomyOption {
        TaxonomyOption::new(self.id.clone(), self.title.clone())
    }
}

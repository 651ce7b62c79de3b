//! The editing core of a site for book reviews, articles and posts
//!
//! Content is written as a structured rich-text document. Its title,
//! description, read time and HTML are derived from the document, and it is
//! saved through a [`storage::Backend`], either a remote API or a local
//! [`Library`] of plain-text files. When an article is saved, its tags and
//! themes are merged into every book it references.

pub mod domain;
pub use domain::{Config, ContentKind, ContentRecord, Document, TaxonomyKind, User};

pub mod editor;
pub use editor::{EditorState, EditorStore, SaveError};

/// Persistence of content, books and taxonomy.
pub mod storage;
pub use storage::{Backend, HttpBackend, Library, LocalBackend};

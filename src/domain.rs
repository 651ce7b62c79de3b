//! Domain models for the content site.
//!
//! This module contains the rich-text document and everything derived from
//! it, content records, taxonomy, books, the book merge rules, and
//! configuration.

/// The rich-text document and its derived title, description and read time.
pub mod document;
pub use document::{Document, DocumentError, Mark, MarkKind, Node, NodeKind};

/// Reviews, articles and posts.
pub mod content;
pub use content::{BookIds, ContentKind, ContentPayload, ContentRecord, Status, User};

/// Tags, themes, categories and books.
pub mod taxonomy;
pub use taxonomy::{Book, NewTaxonomyOption, TaxonomyKind, TaxonomyOption};

pub mod merge;

mod render;
pub use render::render_html;

mod config;
pub use config::Config;

//! Reconciliation of an article's taxonomy into the books it references.
//!
//! Every tag and theme attached to an article must also be visible on each
//! book the article references. Books keep whatever they already had, so the
//! new set is the union of the existing and incoming ids. Tags and themes are
//! merged independently, and so is every book.
//!
//! Union is idempotent: saving the same article again leaves the books as
//! they are.

use std::collections::BTreeSet;

use crate::domain::taxonomy::Book;

/// Add `incoming` ids to `existing`.
///
/// Returns the number of ids that were not already present.
pub fn union_into(existing: &mut BTreeSet<String>, incoming: &[String]) -> usize {
    let before = existing.len();
    existing.extend(incoming.iter().cloned());
    existing.len() - before
}

/// What a merge changed on a single book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Tags newly attached to the book.
    pub tags_added: usize,
    /// Themes newly attached to the book.
    pub themes_added: usize,
}

impl MergeOutcome {
    /// Whether the book changed.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.tags_added > 0 || self.themes_added > 0
    }
}

/// Merge an article's tags and themes into one book.
pub fn merge_into_book(book: &mut Book, tag_ids: &[String], theme_ids: &[String]) -> MergeOutcome {
    MergeOutcome {
        tags_added: union_into(&mut book.tag_ids, tag_ids),
        themes_added: union_into(&mut book.theme_ids, theme_ids),
    }
}

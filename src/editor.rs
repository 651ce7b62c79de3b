//! Editing a single review, article or post.
//!
//! [`EditorState`] holds the draft and changes only through
//! [`EditorState::reduce`]. [`EditorStore`] wraps it with the calls that
//! reach a [`crate::storage::Backend`]: fetching options, loading and saving
//! content, and the debounced autosave.

mod debounce;
pub use debounce::Debouncer;

mod error;
pub use error::{GENERIC_ERROR, SaveError};

mod state;
pub use state::{Action, EditorState, Notification, NotificationLevel, Options, SaveStatus};

mod store;
pub use store::EditorStore;

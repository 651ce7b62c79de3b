mod backend;
pub use backend::{Backend, BackendError};

pub mod directory;
pub use directory::{Library, LibraryError, LibraryLoadError};

mod http;
pub use http::HttpBackend;

mod local;
pub use local::LocalBackend;

/// Markdown serialization for content records.
pub mod markdown;
pub use markdown::{LoadError, MarkdownRecord};

mod yaml;

//! A filesystem backed content library
//!
//! The [`Library`] stores reviews, articles, posts, books and taxonomy in a
//! directory of plain-text files, and plays the server's part of the save
//! protocol: it validates payloads, assigns ids, and merges article taxonomy
//! into the referenced books.
//!
//! ```text
//! library/
//! ├── config.toml
//! ├── tags.yaml
//! ├── themes.yaml
//! ├── categories.yaml
//! ├── books/<id>.yaml
//! ├── reviews/<id>.md
//! ├── articles/<id>.md
//! └── posts/<id>.md
//! ```

use std::{
    collections::{BTreeMap, HashMap},
    ffi::OsStr,
    fmt, io,
    path::{Path, PathBuf},
};

use chrono::Utc;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use walkdir::WalkDir;

use crate::{
    domain::{
        Book, Config, ContentKind, ContentPayload, ContentRecord, DocumentError, TaxonomyKind,
        TaxonomyOption, merge,
    },
    storage::{
        markdown::{LoadError, MarkdownRecord},
        yaml::{self, StoredOption},
    },
};

const BOOKS_DIR: &str = "books";

/// A filesystem backed store of content.
#[derive(Debug)]
pub struct Library {
    /// The root of the directory content is stored in.
    root: PathBuf,
    config: Config,
    records: HashMap<String, ContentRecord>,
    books: BTreeMap<String, Book>,
    taxonomy: HashMap<TaxonomyKind, Vec<StoredOption>>,
}

impl Library {
    /// Create the directory layout and a default configuration, then open
    /// the library.
    ///
    /// An existing configuration is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories or the configuration cannot be
    /// written, or if the existing content cannot be loaded.
    pub fn init(root: PathBuf) -> Result<Self, LibraryLoadError> {
        std::fs::create_dir_all(root.join(BOOKS_DIR))?;
        for kind in ContentKind::ALL {
            std::fs::create_dir_all(root.join(kind.collection()))?;
        }

        let config_path = root.join("config.toml");
        if !config_path.exists() {
            Config::default()
                .save(&config_path)
                .map_err(io::Error::other)?;
        }

        Self::open(root)
    }

    /// Load all content from disk.
    ///
    /// # Errors
    ///
    /// Taxonomy files that exist but cannot be parsed are an error. Record
    /// and book files that cannot be parsed, or whose names do not match
    /// their ids, are unrecognised: they are skipped if `allow_unrecognised`
    /// is set in the configuration, and reported as an error otherwise.
    pub fn open(root: PathBuf) -> Result<Self, LibraryLoadError> {
        let config = load_config(&root);

        let mut taxonomy = HashMap::new();
        for kind in TaxonomyKind::ALL {
            let path = taxonomy_path(&root, kind);
            let options = yaml::load_taxonomy(&path)
                .map_err(|source| LibraryLoadError::Taxonomy { path, source })?;
            taxonomy.insert(kind, options);
        }

        let book_paths = collect_paths(&root.join(BOOKS_DIR), "yaml");
        let (books, unrecognised_books): (Vec<_>, Vec<_>) = book_paths
            .par_iter()
            .map(|path| try_load_book(path))
            .partition(Result::is_ok);

        let mut record_results = Vec::new();
        for kind in ContentKind::ALL {
            let paths = collect_paths(&root.join(kind.collection()), "md");
            record_results.extend(
                paths
                    .par_iter()
                    .map(|path| try_load_record(path, kind))
                    .collect::<Vec<_>>(),
            );
        }
        let (records, unrecognised_records): (Vec<_>, Vec<_>) =
            record_results.into_iter().partition(Result::is_ok);

        let unrecognised_paths: Vec<PathBuf> = unrecognised_books
            .into_iter()
            .filter_map(Result::err)
            .chain(unrecognised_records.into_iter().filter_map(Result::err))
            .collect();

        if !config.allow_unrecognised && !unrecognised_paths.is_empty() {
            return Err(LibraryLoadError::UnrecognisedFiles(unrecognised_paths));
        }

        let books = books
            .into_iter()
            .filter_map(Result::ok)
            .map(|book| (book.id.clone(), book))
            .collect();
        let records = records
            .into_iter()
            .filter_map(Result::ok)
            .map(|record| (record.id.clone(), record))
            .collect();

        Ok(Self {
            root,
            config,
            records,
            books,
            taxonomy,
        })
    }

    /// The root directory of the library.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The library configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Every option of a taxonomy, in creation order.
    #[must_use]
    pub fn taxonomy(&self, kind: TaxonomyKind) -> Vec<TaxonomyOption> {
        self.taxonomy
            .get(&kind)
            .map(|options| options.iter().map(StoredOption::as_option).collect())
            .unwrap_or_default()
    }

    /// Create a taxonomy option.
    ///
    /// The name is trimmed. If an option with the same name already exists
    /// (ignoring case), it is returned instead of creating a duplicate.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or the taxonomy file cannot be
    /// written.
    pub fn create_taxonomy(
        &mut self,
        kind: TaxonomyKind,
        name: &str,
        user_uid: &str,
    ) -> Result<TaxonomyOption, LibraryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::EmptyName);
        }

        let options = self.taxonomy.entry(kind).or_default();
        let lowercase = name.to_lowercase();
        if let Some(existing) = options
            .iter()
            .find(|option| option.name.to_lowercase() == lowercase)
        {
            tracing::debug!("{kind} '{name}' already exists as {}", existing.id);
            return Ok(existing.as_option());
        }

        let option = StoredOption {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_owned(),
            created_by: user_uid.to_owned(),
            created: Utc::now(),
        };
        options.push(option.clone());
        yaml::save_taxonomy(&taxonomy_path(&self.root, kind), options)?;

        tracing::info!("Added {kind}: {name}");
        Ok(option.as_option())
    }

    /// Add a book.
    ///
    /// # Errors
    ///
    /// Returns an error if the title is empty or the book cannot be written.
    pub fn add_book(&mut self, title: &str, author: Option<String>) -> Result<Book, LibraryError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LibraryError::EmptyName);
        }

        let book = Book::new(title.to_owned(), author);
        yaml::save_book(&book_path(&self.root, &book.id), &book)?;
        self.books.insert(book.id.clone(), book.clone());

        tracing::info!("Added book: {title}");
        Ok(book)
    }

    /// Look up a book by id.
    #[must_use]
    pub fn book(&self, id: &str) -> Option<&Book> {
        self.books.get(id)
    }

    /// Every book, ordered by id.
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    /// Look up a record by kind and id.
    #[must_use]
    pub fn record(&self, kind: ContentKind, id: &str) -> Option<&ContentRecord> {
        self.records.get(id).filter(|record| record.kind == kind)
    }

    /// Every record of a kind, most recently updated first.
    #[must_use]
    pub fn records(&self, kind: ContentKind) -> Vec<&ContentRecord> {
        let mut records: Vec<_> = self
            .records
            .values()
            .filter(|record| record.kind == kind)
            .collect();
        records.sort_by(|a, b| b.updated.cmp(&a.updated).then_with(|| a.id.cmp(&b.id)));
        records
    }

    /// Create or update a record from an editor payload.
    ///
    /// A payload without an id (or with an empty one) creates a record with
    /// a fresh id; otherwise the existing record is updated. When an article
    /// is saved, its tags and themes are merged into every book it
    /// references (see [`merge`]). A record whose content is unchanged is
    /// not rewritten and keeps its `updated` timestamp.
    ///
    /// # Errors
    ///
    /// This method can fail if:
    ///
    /// - the document is structurally invalid
    /// - an article references no books
    /// - a tag, theme or book id is unknown
    /// - the id to update is unknown, or belongs to another kind of content
    /// - a record or book file cannot be written
    pub fn upsert_content(
        &mut self,
        payload: &ContentPayload,
    ) -> Result<ContentRecord, LibraryError> {
        payload.raw_content.validate()?;
        if payload.kind.requires_book() && payload.book_ids().is_empty() {
            return Err(LibraryError::MissingBook);
        }
        self.check_references(payload)?;

        let now = Utc::now();
        let (record, unchanged) = match payload.id.as_deref().filter(|id| !id.is_empty()) {
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                (ContentRecord::from_payload(id, payload, now, now), None)
            }
            Some(id) => {
                let existing = self
                    .records
                    .get(id)
                    .ok_or_else(|| LibraryError::NotFound(id.to_owned()))?;
                if existing.kind != payload.kind {
                    return Err(LibraryError::KindMismatch {
                        id: id.to_owned(),
                        stored: existing.kind,
                        requested: payload.kind,
                    });
                }
                let record =
                    ContentRecord::from_payload(id.to_owned(), payload, existing.created, now);
                let unchanged =
                    (existing.fingerprint() == record.fingerprint()).then(|| existing.clone());
                (record, unchanged)
            }
        };

        let saved = match unchanged {
            Some(previous) => {
                tracing::debug!("{} {} is unchanged", record.kind, record.id);
                previous
            }
            None => {
                MarkdownRecord::from(record.clone()).save_to_path(&self.record_path(&record))?;
                tracing::info!("Saved {} {}: {}", record.kind, record.id, record.title);
                self.records.insert(record.id.clone(), record.clone());
                record
            }
        };

        // the record is stored before any book takes its taxonomy
        if saved.kind == ContentKind::Article {
            self.merge_into_books(&saved)?;
        }

        Ok(saved)
    }

    fn check_references(&self, payload: &ContentPayload) -> Result<(), LibraryError> {
        let known = |kind: TaxonomyKind, id: &str| {
            self.taxonomy
                .get(&kind)
                .is_some_and(|options| options.iter().any(|option| option.id == id))
        };

        if let Some(id) = payload
            .tag_ids
            .iter()
            .find(|id| !known(TaxonomyKind::Tag, id.as_str()))
        {
            return Err(LibraryError::UnknownReference {
                entity: "tag",
                id: id.clone(),
            });
        }
        if let Some(id) = payload
            .theme_ids()
            .iter()
            .find(|id| !known(TaxonomyKind::Theme, id.as_str()))
        {
            return Err(LibraryError::UnknownReference {
                entity: "theme",
                id: id.clone(),
            });
        }
        if let Some(id) = payload
            .book_ids()
            .iter()
            .find(|id| !self.books.contains_key(id.as_str()))
        {
            return Err(LibraryError::UnknownReference {
                entity: "book",
                id: id.clone(),
            });
        }
        Ok(())
    }

    /// Apply the article's taxonomy to its books, writing the books that
    /// changed.
    fn merge_into_books(&mut self, record: &ContentRecord) -> Result<(), LibraryError> {
        for book_id in record.book_ids() {
            let Some(mut book) = self.books.get(book_id).cloned() else {
                continue;
            };

            let outcome = merge::merge_into_book(&mut book, &record.tag_ids, record.theme_ids());
            if outcome.changed() {
                yaml::save_book(&book_path(&self.root, book_id), &book)?;
                tracing::info!(
                    "Merged {} tags and {} themes into book {}",
                    outcome.tags_added,
                    outcome.themes_added,
                    book.title
                );
                self.books.insert(book_id.clone(), book);
            }
        }
        Ok(())
    }

    /// The file a record is stored in.
    #[must_use]
    pub fn record_path(&self, record: &ContentRecord) -> PathBuf {
        self.root
            .join(record.kind.collection())
            .join(format!("{}.md", record.id))
    }
}

/// Errors that can occur when modifying the library.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// No record has the requested id.
    #[error("no content with id {0}")]
    NotFound(String),

    /// The record exists, but is of a different kind.
    #[error("{id} is a {stored}, not a {requested}")]
    KindMismatch {
        /// The record id.
        id: String,
        /// The kind of the stored record.
        stored: ContentKind,
        /// The kind the caller asked for.
        requested: ContentKind,
    },

    /// A payload references a tag, theme or book that does not exist.
    #[error("unknown {entity} {id}")]
    UnknownReference {
        /// What kind of entity is referenced.
        entity: &'static str,
        /// The unknown id.
        id: String,
    },

    /// An article does not reference any books.
    #[error("an article must reference at least one book")]
    MissingBook,

    /// A name or title is empty.
    #[error("name must not be empty")]
    EmptyName,

    /// The document is structurally invalid.
    #[error("invalid document: {0}")]
    InvalidDocument(#[from] DocumentError),

    /// A file could not be written.
    #[error("failed to write to the library: {0}")]
    Io(#[from] io::Error),
}

/// Errors that can occur when opening a library.
#[derive(Debug, thiserror::Error)]
pub enum LibraryLoadError {
    /// Files that could not be loaded as records or books.
    UnrecognisedFiles(Vec<PathBuf>),
    /// A taxonomy file exists but could not be loaded.
    Taxonomy {
        /// The taxonomy file.
        path: PathBuf,
        /// Why it could not be loaded.
        #[source]
        source: LoadError,
    },
    /// The library directory could not be created.
    Io(#[from] io::Error),
}

impl fmt::Display for LibraryLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_DISPLAY: usize = 5;

        match self {
            Self::UnrecognisedFiles(paths) => {
                write!(f, "Unrecognised files: ")?;
                for (i, path) in paths.iter().take(MAX_DISPLAY).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", path.display())?;
                }
                if paths.len() > MAX_DISPLAY {
                    write!(f, "... (and {} more)", paths.len() - MAX_DISPLAY)?;
                }
                Ok(())
            }
            Self::Taxonomy { path, source } => {
                write!(f, "failed to load {}: {source}", path.display())
            }
            Self::Io(e) => write!(f, "failed to create library: {e}"),
        }
    }
}

fn load_config(root: &Path) -> Config {
    let path = root.join("config.toml");
    Config::load(&path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        Config::default()
    })
}

fn taxonomy_path(root: &Path, kind: TaxonomyKind) -> PathBuf {
    root.join(format!("{}.yaml", kind.collection()))
}

fn book_path(root: &Path, id: &str) -> PathBuf {
    root.join(BOOKS_DIR).join(format!("{id}.yaml"))
}

fn collect_paths(dir: &Path, extension: &str) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension() == Some(OsStr::new(extension)))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(OsStr::to_str)
}

fn try_load_book(path: &Path) -> Result<Book, PathBuf> {
    match yaml::load_book(path) {
        Ok(book) if file_stem(path) == Some(book.id.as_str()) => Ok(book),
        Ok(book) => {
            tracing::debug!(
                "Skipping book {} stored under a different name at {}",
                book.id,
                path.display()
            );
            Err(path.to_path_buf())
        }
        Err(e) => {
            tracing::debug!("Failed to load book from {}: {:?}", path.display(), e);
            Err(path.to_path_buf())
        }
    }
}

fn try_load_record(path: &Path, kind: ContentKind) -> Result<ContentRecord, PathBuf> {
    match MarkdownRecord::load(path).map(ContentRecord::from) {
        Ok(record) if record.kind == kind && file_stem(path) == Some(record.id.as_str()) => {
            Ok(record)
        }
        Ok(record) => {
            tracing::debug!(
                "Skipping {} {} found in the wrong place at {}",
                record.kind,
                record.id,
                path.display()
            );
            Err(path.to_path_buf())
        }
        Err(e) => {
            tracing::debug!("Failed to load record from {}: {:?}", path.display(), e);
            Err(path.to_path_buf())
        }
    }
}

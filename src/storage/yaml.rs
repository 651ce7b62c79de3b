//! YAML files for books and taxonomy lists.

use std::{
    collections::BTreeSet,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    domain::{Book, TaxonomyOption},
    storage::markdown::LoadError,
};

/// A taxonomy option as stored on disk, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOption {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// The user who created the option.
    pub created_by: String,
    /// When the option was created.
    pub created: DateTime<Utc>,
}

impl StoredOption {
    /// The option as presented to editors.
    #[must_use]
    pub fn as_option(&self) -> TaxonomyOption {
        TaxonomyOption::new(self.id.clone(), self.name.clone())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum TaxonomyFile {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        options: Vec<StoredOption>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum BookFile {
    #[serde(rename = "1")]
    V1 {
        id: String,
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        author: Option<String>,
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        tags: BTreeSet<String>,
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        themes: BTreeSet<String>,
        created: DateTime<Utc>,
    },
}

impl From<BookFile> for Book {
    fn from(file: BookFile) -> Self {
        match file {
            BookFile::V1 {
                id,
                title,
                author,
                tags,
                themes,
                created,
            } => Self {
                id,
                title,
                author,
                tag_ids: tags,
                theme_ids: themes,
                created,
            },
        }
    }
}

impl From<&Book> for BookFile {
    fn from(book: &Book) -> Self {
        Self::V1 {
            id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            tags: book.tag_ids.clone(),
            themes: book.theme_ids.clone(),
            created: book.created,
        }
    }
}

/// Load a taxonomy list. A missing file is an empty list.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_taxonomy(path: &Path) -> Result<Vec<StoredOption>, LoadError> {
    match read_yaml(path) {
        Ok(TaxonomyFile::V1 { options }) => Ok(options),
        Err(LoadError::NotFound) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Write a taxonomy list, replacing the file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_taxonomy(path: &Path, options: &[StoredOption]) -> io::Result<()> {
    write_yaml(
        path,
        &TaxonomyFile::V1 {
            options: options.to_vec(),
        },
    )
}

/// Load a book.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_book(path: &Path) -> Result<Book, LoadError> {
    read_yaml::<BookFile>(path).map(Book::from)
}

/// Write a book, replacing the file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_book(path: &Path, book: &Book) -> io::Result<()> {
    write_yaml(path, &BookFile::from(book))
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let file = File::open(path).map_err(|io_error| match io_error.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound,
        _ => LoadError::Io(io_error),
    })?;
    Ok(serde_yaml::from_reader(BufReader::new(file))?)
}

fn write_yaml<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_yaml::to_writer(&mut writer, value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writer.flush()
}

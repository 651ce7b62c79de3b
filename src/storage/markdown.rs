use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BookIds, ContentKind, ContentRecord, Document, Status};

/// A content record serialized as YAML frontmatter followed by its HTML.
///
/// ```text
/// ---
/// _version: '1'
/// id: 5b0c...
/// kind: article
/// title: Dune
/// ...
/// ---
/// <h1>Dune</h1>
/// ```
#[derive(Debug, Clone)]
pub struct MarkdownRecord {
    frontmatter: FrontMatter,
    body: String,
}

impl MarkdownRecord {
    fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let frontmatter = serde_yaml::to_string(&self.frontmatter)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let result = format!("---\n{frontmatter}---\n{}\n", self.body);
        writer.write_all(result.as_bytes())?;
        writer.flush()
    }

    pub(crate) fn read<R: BufRead>(reader: &mut R) -> Result<Self, LoadError> {
        let mut lines = reader.lines();

        // Ensure frontmatter starts correctly
        let first_line = lines
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "Empty input"))?
            .map_err(LoadError::from)?;

        if first_line.trim() != "---" {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Expected frontmatter starting with '---'",
            )
            .into());
        }

        // Collect lines until the closing delimiter. Block scalars are
        // indented, so an unindented '---' always closes the frontmatter.
        let frontmatter = lines
            .by_ref()
            .map_while(|line| match line {
                Ok(content) if content.trim_end() == "---" => None,
                Ok(content) => Some(Ok(content)),
                Err(e) => Some(Err(e)),
            })
            .collect::<Result<Vec<_>, _>>()?
            .join("\n");

        // The rest of the lines are the rendered HTML
        let body = lines.collect::<Result<Vec<_>, _>>()?.join("\n");

        let frontmatter: FrontMatter = serde_yaml::from_str(&frontmatter)?;

        Ok(Self {
            frontmatter,
            body: body.trim_end().to_owned(),
        })
    }

    /// Writes the record to a specific file path.
    ///
    /// Parent directories are created automatically if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_path(&self, file_path: &Path) -> io::Result<()> {
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(file_path)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)
    }

    /// Reads a record from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be read, or has
    /// malformed frontmatter.
    pub fn load(file_path: &Path) -> Result<Self, LoadError> {
        let file = File::open(file_path).map_err(|io_error| match io_error.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound,
            _ => LoadError::Io(io_error),
        })?;

        let mut reader = BufReader::new(file);
        Self::read(&mut reader)
    }
}

/// Errors that can occur when loading a file from the library.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file was not found.
    #[error("file not found")]
    NotFound,
    /// An I/O error occurred.
    #[error("failed to read file: {0}")]
    Io(#[from] io::Error),
    /// The YAML could not be parsed.
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(from = "FrontMatterVersion")]
#[serde(into = "FrontMatterVersion")]
struct FrontMatter {
    id: String,
    kind: ContentKind,
    title: String,
    description: String,
    status: Status,
    tags: Vec<String>,
    themes: Option<Vec<String>>,
    books: Option<BookIds>,
    read_time: u32,
    user_uid: String,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    content: Document,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum FrontMatterVersion {
    #[serde(rename = "1")]
    V1 {
        id: String,
        kind: ContentKind,
        title: String,
        description: String,
        #[serde(default)]
        status: Status,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tags: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        themes: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        books: Option<BookIds>,
        read_time: u32,
        user_uid: String,
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
        content: Document,
    },
}

impl From<FrontMatterVersion> for FrontMatter {
    fn from(version: FrontMatterVersion) -> Self {
        match version {
            FrontMatterVersion::V1 {
                id,
                kind,
                title,
                description,
                status,
                tags,
                themes,
                books,
                read_time,
                user_uid,
                created,
                updated,
                content,
            } => Self {
                id,
                kind,
                title,
                description,
                status,
                tags,
                themes,
                books,
                read_time,
                user_uid,
                created,
                updated,
                content,
            },
        }
    }
}

impl From<FrontMatter> for FrontMatterVersion {
    fn from(frontmatter: FrontMatter) -> Self {
        let FrontMatter {
            id,
            kind,
            title,
            description,
            status,
            tags,
            themes,
            books,
            read_time,
            user_uid,
            created,
            updated,
            content,
        } = frontmatter;
        Self::V1 {
            id,
            kind,
            title,
            description,
            status,
            tags,
            themes,
            books,
            read_time,
            user_uid,
            created,
            updated,
            content,
        }
    }
}

impl From<ContentRecord> for MarkdownRecord {
    fn from(record: ContentRecord) -> Self {
        let ContentRecord {
            id,
            kind,
            title,
            description,
            raw_content,
            html_content,
            status,
            tag_ids,
            theme_ids,
            book_ids,
            read_time,
            user_uid,
            created,
            updated,
        } = record;

        Self {
            frontmatter: FrontMatter {
                id,
                kind,
                title,
                description,
                status,
                tags: tag_ids,
                themes: theme_ids,
                books: book_ids,
                read_time,
                user_uid,
                created,
                updated,
                content: raw_content,
            },
            body: html_content,
        }
    }
}

impl From<MarkdownRecord> for ContentRecord {
    fn from(record: MarkdownRecord) -> Self {
        let MarkdownRecord { frontmatter, body } = record;
        Self {
            id: frontmatter.id,
            kind: frontmatter.kind,
            title: frontmatter.title,
            description: frontmatter.description,
            raw_content: frontmatter.content,
            html_content: body,
            status: frontmatter.status,
            tag_ids: frontmatter.tags,
            theme_ids: frontmatter.themes,
            book_ids: frontmatter.books,
            read_time: frontmatter.read_time,
            user_uid: frontmatter.user_uid,
            created: frontmatter.created,
            updated: frontmatter.updated,
        }
    }
}

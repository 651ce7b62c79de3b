use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pagemoon::Library;
use tracing::instrument;

use super::terminal::Paint;

#[derive(Debug, Parser)]
pub struct Book {
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// List every book, with the tags and themes merged into it
    List,

    /// Add a book
    Add {
        /// The title of the book
        title: String,

        /// The book's author
        #[arg(long, short)]
        author: Option<String>,
    },
}

impl Book {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut library = Library::open(root)?;

        match self.action {
            Action::List => {
                let tags = library.taxonomy(pagemoon::TaxonomyKind::Tag);
                let themes = library.taxonomy(pagemoon::TaxonomyKind::Theme);
                let name = |options: &[pagemoon::domain::TaxonomyOption], id: &str| {
                    options
                        .iter()
                        .find(|option| option.id == id)
                        .map_or_else(|| id.to_owned(), |option| option.name.clone())
                };

                for book in library.books() {
                    match &book.author {
                        Some(author) => println!("{}  {} by {author}", book.id.muted(), book.title),
                        None => println!("{}  {}", book.id.muted(), book.title),
                    }
                    if !book.tag_ids.is_empty() {
                        let names: Vec<_> = book.tag_ids.iter().map(|id| name(&tags, id)).collect();
                        println!("    tags:   {}", names.join(", "));
                    }
                    if !book.theme_ids.is_empty() {
                        let names: Vec<_> =
                            book.theme_ids.iter().map(|id| name(&themes, id)).collect();
                        println!("    themes: {}", names.join(", "));
                    }
                }
            }
            Action::Add { title, author } => {
                let book = library.add_book(&title, author)?;
                println!("{}", format!("Added book {} ({})", book.title, book.id).saved());
            }
        }

        Ok(())
    }
}

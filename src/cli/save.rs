use std::path::PathBuf;

use clap::Parser;
use pagemoon::{
    ContentKind, EditorStore, Library, LocalBackend, User,
    domain::{Status, TaxonomyOption},
};
use tracing::instrument;

use super::terminal::Paint;

#[derive(Debug, Parser)]
pub struct Save {
    /// The kind of content (review, article or post)
    kind: ContentKind,

    /// A JSON file holding the document
    document: PathBuf,

    /// The uid of the saving user
    #[arg(long)]
    user: String,

    /// Update an existing record instead of creating one
    #[arg(long)]
    id: Option<String>,

    /// Tags to attach, by id or name (replaces the saved selection)
    #[arg(long, value_delimiter = ',')]
    tag: Vec<String>,

    /// Themes to attach, by id or name (articles only)
    #[arg(long, value_delimiter = ',')]
    theme: Vec<String>,

    /// Books to reference, by id or title
    #[arg(long, value_delimiter = ',')]
    book: Vec<String>,

    /// Publish instead of keeping the content as a draft
    #[arg(long)]
    publish: bool,
}

impl Save {
    #[instrument(level = "debug", skip(self))]
    pub async fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let library = Library::open(root)?;
        let config = library.config().clone();
        let store = EditorStore::new(LocalBackend::new(library), self.kind, config);
        store.refresh_options().await?;

        if let Some(id) = &self.id {
            store.load(id).await?;
        }

        store.set_raw_content(super::read_document(&self.document)?);

        let options = store.options();
        if !self.tag.is_empty() {
            store.set_selected_tags(select(&options.tags, &self.tag, "tag")?);
        }
        if !self.theme.is_empty() {
            store.set_selected_themes(select(&options.themes, &self.theme, "theme")?);
        }
        if !self.book.is_empty() {
            store.set_selected_books(select(&options.books, &self.book, "book")?);
        }

        let user = User::new(self.user.clone(), self.user);
        let status = self.publish.then_some(Status::Published);
        let record = store.save_content(Some(&user), status).await?;

        println!(
            "{}",
            format!("Saved {} {} ({})", record.kind, record.title, record.id).saved()
        );
        println!("  Status:    {}", record.status);
        println!("  Read time: {} min", record.read_time);
        if !record.tag_ids.is_empty() {
            let names: Vec<_> = store
                .state()
                .selected_tags()
                .iter()
                .map(|tag| tag.name.clone())
                .collect();
            println!("  Tags:      {}", names.join(", "));
        }

        Ok(())
    }
}

/// Find the options named by `wanted`, matching ids exactly and names
/// ignoring case.
fn select(
    options: &[TaxonomyOption],
    wanted: &[String],
    what: &str,
) -> anyhow::Result<Vec<TaxonomyOption>> {
    wanted
        .iter()
        .map(|wanted| {
            options
                .iter()
                .find(|option| option.id == *wanted)
                .or_else(|| {
                    options
                        .iter()
                        .find(|option| option.name.eq_ignore_ascii_case(wanted))
                })
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("unknown {what} '{wanted}'"))
        })
        .collect()
}

use std::{path::PathBuf, process};

use clap::Parser;
use pagemoon::{ContentKind, ContentRecord, Library, TaxonomyKind};
use tracing::instrument;

use super::terminal::Paint;

#[derive(Debug, Parser)]
#[command(about = "Display a saved review, article or post")]
pub struct Show {
    /// The kind of content (review, article or post)
    kind: ContentKind,

    /// The id of the record
    id: String,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Html,
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let library = Library::open(root)?;

        let Some(record) = library.record(self.kind, &self.id) else {
            eprintln!("{}", format!("No {} with id {}", self.kind, self.id).caution());
            process::exit(1);
        };

        match self.output {
            OutputFormat::Pretty => output_pretty(&library, record),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
            OutputFormat::Html => println!("{}", record.html_content),
        }

        Ok(())
    }
}

fn output_pretty(library: &Library, record: &ContentRecord) {
    println!("# {}", record.title);
    println!("{}\n", record.description);

    println!("{}", "Metadata".muted());
    println!("  Kind:      {}", record.kind);
    println!("  Id:        {}", record.id);
    println!("  Status:    {}", record.status);
    println!("  Read time: {} min", record.read_time);
    println!("  Author:    {}", record.user_uid);
    println!("  Created:   {}", record.created);
    println!("  Updated:   {}", record.updated);
    println!("  Path:      {}", library.record_path(record).display());

    let name = |kind: TaxonomyKind, id: &str| {
        library
            .taxonomy(kind)
            .into_iter()
            .find(|option| option.id == id)
            .map_or_else(|| id.to_owned(), |option| option.name)
    };

    if !record.tag_ids.is_empty() {
        println!("\n{}", "Tags".muted());
        for id in &record.tag_ids {
            println!("  • {}", name(TaxonomyKind::Tag, id));
        }
    }

    if !record.theme_ids().is_empty() {
        println!("\n{}", "Themes".muted());
        for id in record.theme_ids() {
            println!("  • {}", name(TaxonomyKind::Theme, id));
        }
    }

    if !record.book_ids().is_empty() {
        println!("\n{}", "Books".muted());
        for id in record.book_ids() {
            match library.book(id) {
                Some(book) => println!("  • {} ({id})", book.title),
                None => println!("  • {id}"),
            }
        }
    }
}

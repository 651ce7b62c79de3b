use std::path::{Path, PathBuf};

mod book;
mod inspect;
mod save;
mod show;
mod taxonomy;
mod terminal;

use book::Book;
use clap::ArgAction;
use inspect::Inspect;
use pagemoon::Library;
use save::Save;
use show::Show;
use taxonomy::Taxonomy;
use tracing::instrument;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The path to the root of the content library
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run(self.root).await
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Initialize a new content library
    Init,

    /// List or add tags, themes and categories
    Taxonomy(Taxonomy),

    /// List or add books
    Book(Book),

    /// Save a document as a review, article or post
    ///
    /// The document is the editor's JSON. It is saved the way the editor
    /// saves it: title, description, read time and HTML are derived from it,
    /// and saving an article merges its tags and themes into its books.
    Save(Save),

    /// Show a saved review, article or post
    Show(Show),

    /// Show what would be derived from a document, and whether it is valid
    Inspect(Inspect),
}

impl Command {
    async fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Init => Init::run(&root)?,
            Self::Taxonomy(command) => command.run(root)?,
            Self::Book(command) => command.run(root)?,
            Self::Save(command) => command.run(root).await?,
            Self::Show(command) => command.run(root)?,
            Self::Inspect(command) => command.run(&root)?,
        }
        Ok(())
    }
}

struct Init;

impl Init {
    #[instrument]
    fn run(root: &Path) -> anyhow::Result<()> {
        if root.join("config.toml").exists() {
            anyhow::bail!("Library already initialized (found existing config.toml)");
        }

        Library::init(root.to_path_buf())?;

        println!("Initialized content library in {}", root.display());
        println!("  Created: config.toml");
        println!("  Created: books/, reviews/, articles/, posts/");
        println!();
        println!("Next steps:");
        println!("  pagemoon book add \"Dune\" --author \"Frank Herbert\"");

        Ok(())
    }
}

/// Read the editor's JSON for a document from a file.
fn read_document(path: &Path) -> anyhow::Result<pagemoon::Document> {
    use anyhow::Context;

    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("{} is not a valid document", path.display()))
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pagemoon::{Library, TaxonomyKind};
use tracing::instrument;

use super::terminal::Paint;

#[derive(Debug, Parser)]
pub struct Taxonomy {
    /// The taxonomy to work with (tag, theme or category)
    kind: TaxonomyKind,

    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// List every option
    List,

    /// Add an option
    ///
    /// If an option with the same name already exists (ignoring case), it is
    /// reused.
    Add {
        /// The name of the option
        name: String,

        /// The uid of the user creating the option
        #[arg(long)]
        user: String,
    },
}

impl Taxonomy {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut library = Library::open(root)?;

        match self.action {
            Action::List => {
                let options = library.taxonomy(self.kind);
                if options.is_empty() {
                    println!("{}", format!("No {}", self.kind.collection()).muted());
                }
                for option in options {
                    println!("{}  {}", option.id.muted(), option.name);
                }
            }
            Action::Add { name, user } => {
                let option = library.create_taxonomy(self.kind, &name, &user)?;
                println!(
                    "{}",
                    format!("Added {} {} ({})", self.kind, option.name, option.id).saved()
                );
            }
        }

        Ok(())
    }
}

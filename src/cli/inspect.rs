use std::path::{Path, PathBuf};

use clap::Parser;
use pagemoon::Config;
use tracing::instrument;

use super::terminal::Paint;

#[derive(Debug, Parser)]
pub struct Inspect {
    /// A JSON file holding the document
    document: PathBuf,
}

impl Inspect {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = Config::load(&root.join("config.toml")).unwrap_or_else(|e| {
            tracing::debug!("Failed to load config: {e}");
            Config::default()
        });
        let document = super::read_document(&self.document)?;

        println!("Title:       {}", document.title());
        println!("Description: {}", document.description());
        println!("Words:       {}", document.word_count());
        println!(
            "Read time:   {} min",
            document.read_time(config.words_per_minute())
        );

        match document.validate() {
            Ok(()) => println!("{}", "Valid".saved()),
            Err(e) => {
                println!("{}", format!("Invalid: {e}").caution());
                anyhow::bail!("document cannot be saved");
            }
        }

        Ok(())
    }
}

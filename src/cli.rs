use clap::Parser;
use std::path::PathBuf;

use crate::config::AppConfig;

/// Collect news listings for a search phrase and category, newest first, back to a cutoff date.
///
/// Flags override `SEARCH_PHRASE`, `CATEGORY` and `MONTHS`, which in turn override the
/// configuration file.
#[derive(Parser, Debug, Default)]
#[command(name = "news-harvest", author, version, about)]
pub struct Cli {
    /// Path to the YAML configuration file (defaults to $CONFIG_PATH, then config/config.yaml)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Phrase typed into the site search
    #[arg(short, long)]
    pub search_phrase: Option<String>,

    /// Visible name of the category filter to apply
    #[arg(long)]
    pub category: Option<String>,

    /// How many months back to collect
    #[arg(short, long)]
    pub months: Option<u32>,

    /// Run Chrome with a visible window or headless
    #[arg(long)]
    pub headless: Option<bool>,

    /// Where to write the result table
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory for downloaded images
    #[arg(long)]
    pub image_dir: Option<PathBuf>,
}

impl Cli {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(search_phrase) = &self.search_phrase {
            config.search.search_phrase = search_phrase.clone();
        }
        if let Some(category) = &self.category {
            config.search.category = category.clone();
        }
        if let Some(months) = self.months {
            config.search.months = months;
        }
        if let Some(headless) = self.headless {
            config.browser.headless = headless;
        }
        if let Some(output) = &self.output {
            config.output.export_path = output.clone();
        }
        if let Some(image_dir) = &self.image_dir {
            config.output.image_dir = image_dir.clone();
        }
    }
}

use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::{ResultEntry, ResultSet};
use crate::utils::error::Result;

pub const EXPORT_HEADER: [&str; 8] = [
    "Date",
    "Title",
    "Description",
    "Picture Filename",
    "Title Search Count",
    "Description Search Count",
    "Title Contains Money",
    "Description Contains Money",
];

/// Writes the whole result set to one CSV file, replacing what was there.
#[derive(Debug, Clone)]
pub struct Exporter {
    path: PathBuf,
}

impl Exporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn export(&self, results: &ResultSet) -> Result<()> {
        export(results, &self.path)?;
        info!("{} entries saved in {}", results.len(), self.path.display());
        Ok(())
    }
}

/// Create or overwrite `path` with the header row and one row per entry.
pub fn export(results: &ResultSet, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(EXPORT_HEADER)?;

    for entry in results {
        writer.write_record(row(entry))?;
    }

    writer.flush()?;
    Ok(())
}

fn row(entry: &ResultEntry) -> [String; 8] {
    [
        entry.publication_date.format("%Y-%m-%d").to_string(),
        entry.title.clone(),
        entry.description.clone(),
        entry.image_filename.clone().unwrap_or_default(),
        entry.title_match_count.to_string(),
        entry.description_match_count.to_string(),
        entry.title_has_money.to_string(),
        entry.description_has_money.to_string(),
    ]
}

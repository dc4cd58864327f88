use futures::{Stream, StreamExt};
use reqwest::Client;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

use crate::config::FetchConfig;
use crate::utils::error::{AppError, Result};

/// Downloads listing images into a directory that is created on demand and never cleared.
pub struct AssetFetcher {
    client: Client,
    target_dir: PathBuf,
}

impl AssetFetcher {
    pub fn new(config: &FetchConfig, target_dir: impl Into<PathBuf>) -> Result<Self> {
        let target_dir = target_dir.into();
        std::fs::create_dir_all(&target_dir)?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client, target_dir })
    }

    /// Download `url` into the target directory and return the stored filename.
    ///
    /// A missing or blank URL returns `None` without a request. Transport failures, error
    /// statuses and write failures are logged and also return `None`; they never abort the
    /// caller. An existing file with the same name is replaced only by a complete download.
    #[instrument(skip(self))]
    pub async fn fetch_and_store(&self, url: Option<&str>) -> Option<String> {
        let url = url.map(str::trim).filter(|u| !u.is_empty())?;

        match self.download(url).await {
            Ok(filename) => {
                info!("Image successfully downloaded: {}", filename);
                Some(filename)
            }
            Err(e) => {
                error!("Error downloading the image {}: {}", url, e);
                None
            }
        }
    }

    async fn download(&self, url: &str) -> Result<String> {
        let filename = image_filename(url)
            .ok_or_else(|| AppError::Validation(format!("No usable filename in {}", url)))?;

        let response = self.client.get(url).send().await?.error_for_status()?;

        store_chunks(&self.target_dir.join(&filename), response.bytes_stream()).await?;
        Ok(filename)
    }
}

/// Write `chunks` to a `.part` sibling of `path` and move it into place once the stream ends.
/// On failure the partial file is removed and `path` is left as it was.
async fn store_chunks<S, B, E>(path: &Path, chunks: S) -> Result<()>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    AppError: From<E>,
{
    let partial = partial_path(path);
    match write_chunks(&partial, chunks).await {
        Ok(()) => Ok(tokio::fs::rename(&partial, path).await?),
        Err(e) => {
            tokio::fs::remove_file(&partial).await.ok();
            Err(e)
        }
    }
}

async fn write_chunks<S, B, E>(path: &Path, chunks: S) -> Result<()>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    AppError: From<E>,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut file = tokio::fs::File::create(path).await?;
    while let Some(chunk) = chunks.next().await {
        file.write_all(chunk?.as_ref()).await?;
    }
    file.flush().await?;
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Filename for an image URL: "%2F" escapes count as path separators and the last segment wins.
///
/// CDN resize URLs carry the original location in an encoded query parameter, so
/// `.../resize/?url=https%3A%2F%2Fbucket%2Fphoto.jpg` yields `photo.jpg`.
pub fn image_filename(url: &str) -> Option<String> {
    let decoded = url.replace("%2F", "/");
    decoded
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .map(str::to_string)
}

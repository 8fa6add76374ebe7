use std::path::{Path, PathBuf};

use futures::{stream, StreamExt};
use reqwest::{Client, Url};

use crate::{
    config::DEFAULT_MAX_CONCURRENT_DOWNLOADS,
    error::Result,
    models::GenerationResult,
};

const ID_LEN: usize = 8;
const FALLBACK_EXTENSION: &str = "bin";

/// A remote media file and where it should land locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub destination: PathBuf,
}

/// Local file name for a media URL: the first eight characters of the token
/// before the first underscore of the last path segment, plus its extension.
pub fn media_file_name(url: &str) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.last().map(str::to_string))
            .unwrap_or_default(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .unwrap_or_default()
            .to_string(),
    };

    let (stem, extension) = match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, ext.to_lowercase()),
        _ => (segment.as_str(), FALLBACK_EXTENSION.to_string()),
    };
    let token = stem.split('_').next().unwrap_or_default();
    let id: String = token.chars().take(ID_LEN).collect();

    format!("{}.{}", id, extension)
}

pub fn download_tasks(result: &GenerationResult, dir: &Path) -> Vec<DownloadTask> {
    result
        .images()
        .iter()
        .map(|media| DownloadTask {
            url: media.url.clone(),
            destination: dir.join(media_file_name(&media.url)),
        })
        .collect()
}

/// Fetches generated media over plain HTTP.
#[derive(Clone)]
pub struct MediaDownloader {
    client: Client,
    concurrency: usize,
}

impl Default for MediaDownloader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT_DOWNLOADS)
    }
}

impl MediaDownloader {
    pub fn new(concurrency: usize) -> Self {
        Self {
            client: Client::new(),
            concurrency: concurrency.max(1),
        }
    }

    /// Downloads one file. A failed fetch is reported as `None`; only local
    /// write failures are errors.
    pub async fn download(&self, task: &DownloadTask) -> Result<Option<PathBuf>> {
        let response = match self.client.get(&task.url).send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("⚠️  Failed to fetch {}: {}", task.url, e);
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            log::warn!("⚠️  Fetching {} returned {}", task.url, response.status());
            return Ok(None);
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("⚠️  Failed to read body of {}: {}", task.url, e);
                return Ok(None);
            }
        };

        tokio::fs::write(&task.destination, &bytes).await?;
        log::debug!("Saved {} bytes to {}", bytes.len(), task.destination.display());
        Ok(Some(task.destination.clone()))
    }

    /// Downloads every task concurrently. Outcomes line up with `tasks`.
    pub async fn download_all(&self, tasks: &[DownloadTask]) -> Result<Vec<Option<PathBuf>>> {
        stream::iter(tasks.iter().map(|task| self.download(task)))
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect()
    }

    /// Saves all media of `result` into `dir` and returns the first file written.
    pub async fn save_result(&self, result: &GenerationResult, dir: &Path) -> Result<Option<PathBuf>> {
        if result.images().is_empty() {
            return Ok(None);
        }

        tokio::fs::create_dir_all(dir).await?;
        let tasks = download_tasks(result, dir);
        let outcomes = self.download_all(&tasks).await?;

        Ok(outcomes.into_iter().flatten().next())
    }
}

use async_trait::async_trait;

use crate::{client::HttpDownloader, Result};

/// One-operation download capability.
///
/// [`HttpDownloader`] is the production implementation; tests substitute a
/// scripted fake to exercise callers without real network I/O.
#[async_trait]
pub trait Downloader {
    /// Downloads data from the given URL.
    async fn fetch(&mut self, url: &str) -> Result<String>;
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn fetch(&mut self, url: &str) -> Result<String> {
        HttpDownloader::fetch(self, url).await
    }
}

/// Lazily provides a default download engine.
///
/// The engine is constructed on the first request and reused for the
/// handle's lifetime; its transport state drops together with the handle.
#[derive(Debug, Default)]
pub struct DownloaderHandle {
    downloader: Option<HttpDownloader>,
}

impl DownloaderHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the default engine, constructing it on first use.
    pub fn downloader(&mut self) -> &mut HttpDownloader {
        self.downloader.get_or_insert_with(HttpDownloader::new)
    }
}

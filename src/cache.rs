use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::fetch::{PageFetcher, PageRequest};

/// File cache in front of another fetcher. Without a directory every request
/// goes straight through.
pub struct CachedFetcher<F> {
    inner: F,
    dir: Option<PathBuf>,
}

impl<F: PageFetcher> CachedFetcher<F> {
    pub fn new(inner: F, dir: Option<PathBuf>) -> Self {
        CachedFetcher { inner, dir }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn path_for(&self, request: &PageRequest) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("orsr-{}.html", request.cache_key())))
    }

    async fn read(path: &Path) -> Result<Option<Vec<u8>>, FetchError> {
        match tokio::fs::read(path).await {
            Ok(body) if !body.is_empty() => Ok(Some(body)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(path: &Path, body: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, body).await
    }
}

impl<F: PageFetcher> PageFetcher for CachedFetcher<F> {
    async fn fetch(&self, request: &PageRequest) -> Result<Vec<u8>, FetchError> {
        let Some(path) = self.path_for(request) else {
            return self.inner.fetch(request).await;
        };

        if let Some(body) = Self::read(&path).await? {
            debug!(path = %path.display(), "cache hit");
            return Ok(body);
        }

        let body = self.inner.fetch(request).await?;
        if let Err(e) = Self::write(&path, &body).await {
            warn!(path = %path.display(), "cache write failed: {}", e);
        }
        Ok(body)
    }
}

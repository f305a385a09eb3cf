//! Content loading from local paths and remote URLs.
//!
//! Every loader memoizes its bytes in a load-once cell: the first successful
//! load populates it, concurrent callers share one in-flight load, and a
//! failed load leaves the cell empty so a later call retries.

mod local;
mod remote;

use std::{fmt, io, path::PathBuf, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use url::Url;

pub use local::LocalLoader;
pub use remote::{RemoteLoader, http_client};

#[derive(Debug, Error)]
pub enum ContentLoadError {
    #[error("content source is empty")]
    EmptySource,
    #[error("`{path}` ends with a path separator; expected a file")]
    TrailingSeparator { path: String },
    #[error("`{path}` is a directory; expected a file")]
    Directory { path: String },
    #[error("failed to read `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to `{url}` failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("`{url}` answered with HTTP status {status}")]
    Status { url: String, status: u16 },
}

/// Where a piece of content lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    Local(PathBuf),
    Remote(Url),
}

impl ContentSource {
    /// `http://` and `https://` URLs with a host are remote; everything else
    /// is a local path.
    pub fn parse(raw: &str) -> Result<Self, ContentLoadError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ContentLoadError::EmptySource);
        }

        if let Ok(url) = Url::parse(raw)
            && matches!(url.scheme(), "http" | "https")
            && url.host_str().is_some_and(|host| !host.is_empty())
        {
            return Ok(Self::Remote(url));
        }

        if raw.ends_with(std::path::is_separator) {
            return Err(ContentLoadError::TrailingSeparator {
                path: raw.to_string(),
            });
        }
        Ok(Self::Local(PathBuf::from(raw)))
    }
}

impl fmt::Display for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url.as_str()),
        }
    }
}

#[async_trait]
pub trait ContentLoader: Send + Sync {
    fn source(&self) -> &ContentSource;

    async fn load(&self) -> Result<Bytes, ContentLoadError>;
}

/// Knobs shared by every loader built for one run.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub client: reqwest::Client,
    pub timeout: Duration,
}

/// Loader that picks the local or remote strategy from the source text.
#[derive(Debug)]
pub enum GeneralLoader {
    Local(LocalLoader),
    Remote(RemoteLoader),
}

impl GeneralLoader {
    pub fn new(raw: &str, options: &LoaderOptions) -> Result<Self, ContentLoadError> {
        Ok(match ContentSource::parse(raw)? {
            ContentSource::Local(path) => Self::Local(LocalLoader::new(path)),
            ContentSource::Remote(url) => Self::Remote(RemoteLoader::new(
                url,
                options.client.clone(),
                options.timeout,
            )),
        })
    }
}

#[async_trait]
impl ContentLoader for GeneralLoader {
    fn source(&self) -> &ContentSource {
        match self {
            Self::Local(loader) => loader.source(),
            Self::Remote(loader) => loader.source(),
        }
    }

    async fn load(&self) -> Result<Bytes, ContentLoadError> {
        match self {
            Self::Local(loader) => loader.load().await,
            Self::Remote(loader) => loader.load().await,
        }
    }
}

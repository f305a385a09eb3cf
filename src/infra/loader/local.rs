use std::{path::PathBuf, time::Instant};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{fs, sync::OnceCell};
use tracing::debug;

use super::{ContentLoadError, ContentLoader, ContentSource};

#[derive(Debug)]
pub struct LocalLoader {
    path: PathBuf,
    source: ContentSource,
    content: OnceCell<Bytes>,
}

impl LocalLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            source: ContentSource::Local(path.clone()),
            path,
            content: OnceCell::new(),
        }
    }

    async fn read(&self) -> Result<Bytes, ContentLoadError> {
        let started_at = Instant::now();
        let shown = self.path.display().to_string();

        let metadata = fs::metadata(&self.path)
            .await
            .map_err(|source| ContentLoadError::Read {
                path: shown.clone(),
                source,
            })?;
        if metadata.is_dir() {
            return Err(ContentLoadError::Directory { path: shown });
        }

        let content = fs::read(&self.path)
            .await
            .map_err(|source| ContentLoadError::Read {
                path: shown.clone(),
                source,
            })?;

        debug!(
            target = "infra::loader",
            op = "loader::local",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            path = %shown,
            bytes = content.len(),
            "Loaded local content"
        );
        Ok(Bytes::from(content))
    }
}

#[async_trait]
impl ContentLoader for LocalLoader {
    fn source(&self) -> &ContentSource {
        &self.source
    }

    async fn load(&self) -> Result<Bytes, ContentLoadError> {
        self.content
            .get_or_try_init(|| self.read())
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reads_once_and_serves_memoized_bytes() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("profile.yaml");
        std::fs::write(&path, "bio:\n  name: Jane\n").expect("write");

        let loader = LocalLoader::new(&path);
        let first = loader.load().await.expect("first load");

        std::fs::write(&path, "changed").expect("rewrite");
        let second = loader.load().await.expect("second load");

        assert_eq!(first, second);
        assert_eq!(&second[..], b"bio:\n  name: Jane\n");
    }

    #[tokio::test]
    async fn rejects_directories() {
        let dir = TempDir::new().expect("temp dir");
        let err = LocalLoader::new(dir.path())
            .load()
            .await
            .expect_err("directory");
        assert!(matches!(err, ContentLoadError::Directory { .. }));
    }

    #[tokio::test]
    async fn failed_load_can_be_retried() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("late.html");
        let loader = LocalLoader::new(&path);

        assert!(matches!(
            loader.load().await,
            Err(ContentLoadError::Read { .. })
        ));

        std::fs::write(&path, "<html></html>").expect("write");
        assert_eq!(&loader.load().await.expect("retry")[..], b"<html></html>");
    }
}

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("failed to write `{path}`: {source}")]
pub struct OutputWriteError {
    pub path: String,
    #[source]
    pub source: io::Error,
}

/// Write `bytes` to `path` through a temporary sibling file, so the target
/// either keeps its previous content or holds the complete artifact.
pub fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), OutputWriteError> {
    let wrap = |source| OutputWriteError {
        path: path.display().to_string(),
        source,
    };

    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(wrap)?;

    let mut staged = NamedTempFile::new_in(parent).map_err(wrap)?;
    staged.write_all(bytes).map_err(wrap)?;
    staged.as_file().sync_all().map_err(wrap)?;
    staged.persist(path).map_err(|err| wrap(err.error))?;

    info!(
        target = "infra::output",
        op = "output::write_artifact",
        result = "ok",
        path = %path.display(),
        bytes = bytes.len(),
        "Artifact written"
    );
    Ok(())
}

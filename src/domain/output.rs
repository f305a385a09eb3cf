use std::{fmt, path::Path};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot infer the output format of `{path}` (supported extensions: html, pdf)")]
pub struct UnsupportedOutput {
    pub path: String,
}

/// Artifact formats selectable through the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Html,
    Pdf,
}

impl OutputKind {
    pub fn detect(path: &Path) -> Result<Self, UnsupportedOutput> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("html") => Ok(Self::Html),
            Some("pdf") => Ok(Self::Pdf),
            _ => Err(UnsupportedOutput {
                path: path.display().to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

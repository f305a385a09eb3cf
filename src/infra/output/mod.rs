//! Document renderers and artifact persistence.

mod artifact;
mod chrome;

use std::{io, path::PathBuf, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::domain::{output::OutputKind, page::PageSettings};

pub use artifact::{OutputWriteError, write_artifact};
pub use chrome::ChromeRenderer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no Chrome or Chromium executable found; set `render.chrome_path` or pass --chrome-path")]
    NoBrowser,
    #[error("browser executable `{path}` is unavailable: {source}")]
    BrowserNotFound {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to stage browser files: {0}")]
    Io(#[source] io::Error),
    #[error("browser exited unsuccessfully (exit {exit_code:?}): {stderr}")]
    Browser {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("browser did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("browser produced an empty PDF")]
    EmptyPdf,
}

/// Turns finalized HTML into the bytes of an output artifact.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    fn kind(&self) -> OutputKind;

    async fn render(&self, html: &str, page: &PageSettings) -> Result<Bytes, RenderError>;
}

/// HTML output is the processed template itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

#[async_trait]
impl DocumentRenderer for HtmlRenderer {
    fn kind(&self) -> OutputKind {
        OutputKind::Html
    }

    async fn render(&self, html: &str, _page: &PageSettings) -> Result<Bytes, RenderError> {
        Ok(Bytes::copy_from_slice(html.as_bytes()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RendererOptions {
    pub chrome_path: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

/// Pick the renderer for an output kind. PDF output fails here, before any
/// content is loaded, when no browser can be found.
pub fn renderer_for(
    kind: OutputKind,
    options: &RendererOptions,
) -> Result<Box<dyn DocumentRenderer>, RenderError> {
    match kind {
        OutputKind::Html => Ok(Box::new(HtmlRenderer)),
        OutputKind::Pdf => {
            let renderer = ChromeRenderer::discover(options.chrome_path.as_deref())?;
            Ok(Box::new(renderer.with_timeout(options.timeout)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn html_renderer_passes_through() {
        let html = "<html><head></head><body>cv</body></html>";
        let bytes = HtmlRenderer
            .render(html, &PageSettings::default())
            .await
            .expect("render");
        assert_eq!(&bytes[..], html.as_bytes());
    }

    #[test]
    fn html_output_needs_no_browser() {
        let renderer = renderer_for(
            OutputKind::Html,
            &RendererOptions {
                chrome_path: Some(PathBuf::from("/nonexistent/chrome")),
                timeout: None,
            },
        )
        .expect("html renderer");
        assert_eq!(renderer.kind(), OutputKind::Html);
    }

    #[test]
    fn pdf_output_requires_an_existing_browser() {
        let err = renderer_for(
            OutputKind::Pdf,
            &RendererOptions {
                chrome_path: Some(PathBuf::from("/nonexistent/chrome")),
                timeout: None,
            },
        )
        .err()
        .expect("missing browser");
        assert!(matches!(err, RenderError::BrowserNotFound { .. }));
    }
}

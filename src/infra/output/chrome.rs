use std::{
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    process::Stdio,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{info, warn};
use url::Url;

use super::{DocumentRenderer, RenderError};
use crate::domain::{output::OutputKind, page::PageSettings};

const BROWSER_CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Prints HTML to PDF with a headless Chrome or Chromium binary.
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    browser: PathBuf,
    timeout: Option<Duration>,
}

impl ChromeRenderer {
    pub fn new(browser: impl Into<PathBuf>) -> Self {
        Self {
            browser: browser.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use `explicit` when given, otherwise the first known browser on `PATH`.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, RenderError> {
        if let Some(path) = explicit {
            std::fs::metadata(path).map_err(|source| RenderError::BrowserNotFound {
                path: path.display().to_string(),
                source,
            })?;
            return Ok(Self::new(path));
        }

        let path_env = std::env::var_os("PATH").ok_or(RenderError::NoBrowser)?;
        std::env::split_paths(&path_env)
            .flat_map(|dir| BROWSER_CANDIDATES.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file())
            .map(Self::new)
            .ok_or(RenderError::NoBrowser)
    }

    async fn print(&self, input: &Path, output: &Path) -> Result<(), RenderError> {
        let started_at = Instant::now();
        let input_url = Url::from_file_path(input).map_err(|()| {
            RenderError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("`{}` is not an absolute path", input.display()),
            ))
        })?;

        let child = Command::new(&self.browser)
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(input_url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let finished = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child)
                .await
                .map_err(|_| RenderError::TimedOut(limit))?,
            None => child.await,
        };

        let result = finished.map_err(|err| {
            warn!(
                target = "infra::output::chrome",
                op = "chrome::print_to_pdf",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                error_code = "spawn_browser",
                error = %err,
                "Failed to spawn browser"
            );
            if err.kind() == ErrorKind::NotFound {
                RenderError::BrowserNotFound {
                    path: self.browser.display().to_string(),
                    source: err,
                }
            } else {
                RenderError::Io(err)
            }
        })?;

        if !result.status.success() {
            let exit_code = result.status.code();
            let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
            warn!(
                target = "infra::output::chrome",
                op = "chrome::print_to_pdf",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                exit_code = exit_code.map(i64::from).unwrap_or(-1),
                error_code = "browser_exit",
                stderr = %stderr,
                "Browser invocation failed"
            );
            return Err(RenderError::Browser { exit_code, stderr });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentRenderer for ChromeRenderer {
    fn kind(&self) -> OutputKind {
        OutputKind::Pdf
    }

    async fn render(&self, html: &str, page: &PageSettings) -> Result<Bytes, RenderError> {
        let started_at = Instant::now();

        let mut input = tempfile::Builder::new()
            .prefix("civic-")
            .suffix(".html")
            .tempfile()
            .map_err(RenderError::Io)?;
        input
            .write_all(with_page_rule(html, page).as_bytes())
            .map_err(RenderError::Io)?;
        input.flush().map_err(RenderError::Io)?;

        let output: NamedTempFile = tempfile::Builder::new()
            .prefix("civic-")
            .suffix(".pdf")
            .tempfile()
            .map_err(RenderError::Io)?;

        self.print(input.path(), output.path()).await?;

        let pdf = tokio::fs::read(output.path())
            .await
            .map_err(RenderError::Io)?;
        if pdf.is_empty() {
            return Err(RenderError::EmptyPdf);
        }

        info!(
            target = "infra::output::chrome",
            op = "chrome::print_to_pdf",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            browser = %self.browser.display(),
            page_size = %page.size,
            pdf_bytes = pdf.len(),
            "Rendered PDF via headless browser"
        );
        Ok(Bytes::from(pdf))
    }
}

fn page_rule(page: &PageSettings) -> String {
    let margin = page.margin;
    format!(
        "@page {{ size: {}in {}in; margin: {}in {}in {}in {}in; }} \
         html {{ -webkit-print-color-adjust: exact; print-color-adjust: exact; }}",
        page.size.width_inches(),
        page.size.height_inches(),
        margin.top,
        margin.right,
        margin.bottom,
        margin.left,
    )
}

/// Place the print rule at the end of `head`, or in front of the document
/// when there is none.
fn with_page_rule(html: &str, page: &PageSettings) -> String {
    let style = format!(r#"<style type="text/css">{}</style>"#, page_rule(page));
    match html.find("</head>") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + style.len());
            out.push_str(&html[..at]);
            out.push_str(&style);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{style}{html}"),
    }
}


#[cfg(all(test, unix))]
mod process_tests {
    use super::*;
    use std::{fs, os::unix::fs::PermissionsExt};
    use tempfile::TempDir;

    fn fake_browser(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("fake-chrome");
        fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write script");
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("set perms");
        path
    }

    const PRINTING_BROWSER: &str = r#"
out=""
input=""
for arg in "$@"; do
  case "$arg" in
    --print-to-pdf=*) out="${arg#--print-to-pdf=}" ;;
    file://*) input="${arg#file://}" ;;
  esac
done
if [ -z "$out" ] || [ -z "$input" ]; then
  echo "missing arguments: $*" >&2
  exit 2
fi
grep -q "@page" "$input" || { echo "no page rule" >&2; exit 3; }
printf '%%PDF-1.4 fake' > "$out"
"#;

    #[tokio::test]
    async fn renders_pdf_with_fake_browser() {
        let dir = TempDir::new().expect("temp dir");
        let renderer = ChromeRenderer::new(fake_browser(&dir, PRINTING_BROWSER));

        let pdf = renderer
            .render("<html><head></head><body>cv</body></html>", &PageSettings::default())
            .await
            .expect("pdf rendered");
        assert_eq!(&pdf[..], b"%PDF-1.4 fake");
    }

    #[tokio::test]
    async fn surfaces_browser_failures() {
        let dir = TempDir::new().expect("temp dir");
        let renderer = ChromeRenderer::new(fake_browser(&dir, "echo boom >&2\nexit 42\n"));

        let err = renderer
            .render("<html></html>", &PageSettings::default())
            .await
            .expect_err("browser failure");
        match err {
            RenderError::Browser { exit_code, stderr } => {
                assert_eq!(exit_code, Some(42));
                assert!(stderr.contains("boom"), "stderr did not propagate: {stderr}");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_output_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let renderer = ChromeRenderer::new(fake_browser(&dir, "exit 0\n"));

        let err = renderer
            .render("<html></html>", &PageSettings::default())
            .await
            .expect_err("empty pdf");
        assert!(matches!(err, RenderError::EmptyPdf));
    }

    #[tokio::test]
    async fn slow_browser_times_out() {
        let dir = TempDir::new().expect("temp dir");
        let renderer = ChromeRenderer::new(fake_browser(&dir, "sleep 5\n"))
            .with_timeout(Some(Duration::from_millis(200)));

        let err = renderer
            .render("<html></html>", &PageSettings::default())
            .await
            .expect_err("timeout");
        assert!(matches!(err, RenderError::TimedOut(_)));
    }
}

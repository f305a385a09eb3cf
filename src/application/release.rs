//! Latest-release lookup.
//!
//! The releases endpoint answers with a list of releases, newest first; only
//! the first tag is read. The lookup is advisory: [`ReleaseChecker::report`]
//! logs its outcome and never fails the command it runs beside.

use std::{fmt, time::Instant};

use reqwest::{Client, StatusCode, header::ACCEPT};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    config::UpdateCheckSettings,
    domain::version::{SemanticVersion, VersionError},
};

const GITHUB_JSON: &str = "application/vnd.github+json";
const GITHUB_API_VERSION_HEADER: &str = "x-github-api-version";
const GITHUB_API_VERSION: &str = "2022-11-28";

#[derive(Debug, Error)]
pub enum ReleaseCheckError {
    #[error("release lookup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("release endpoint answered with HTTP status {0}")]
    Status(u16),
    #[error("no release has been published")]
    NoRelease,
    #[error("release tag `{tag}` is not a version: {source}")]
    InvalidTag {
        tag: String,
        #[source]
        source: VersionError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStatus {
    Latest,
    Outdated { latest: SemanticVersion },
    /// The running build is newer than any published release.
    Ahead { latest: SemanticVersion },
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseStatus::Latest => f.write_str("latest"),
            ReleaseStatus::Outdated { .. } => f.write_str("outdated"),
            ReleaseStatus::Ahead { .. } => f.write_str("ahead"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

#[derive(Debug, Clone)]
pub struct ReleaseChecker {
    client: Client,
    settings: UpdateCheckSettings,
}

impl ReleaseChecker {
    pub fn new(client: Client, settings: &UpdateCheckSettings) -> Self {
        Self {
            client,
            settings: settings.clone(),
        }
    }

    pub async fn latest(&self) -> Result<SemanticVersion, ReleaseCheckError> {
        let response = self
            .client
            .get(self.settings.url.clone())
            .header(ACCEPT, GITHUB_JSON)
            .header(GITHUB_API_VERSION_HEADER, GITHUB_API_VERSION)
            .timeout(self.settings.timeout)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ReleaseCheckError::Status(status.as_u16()));
        }

        let releases: Vec<Release> = response.json().await?;
        let tag = releases
            .into_iter()
            .next()
            .map(|release| release.tag_name)
            .ok_or(ReleaseCheckError::NoRelease)?;

        SemanticVersion::parse(&tag)
            .map_err(|source| ReleaseCheckError::InvalidTag { tag, source })
    }

    pub async fn check(
        &self,
        current: &SemanticVersion,
    ) -> Result<ReleaseStatus, ReleaseCheckError> {
        let latest = self.latest().await?;
        Ok(if latest.greater_than(current) {
            ReleaseStatus::Outdated { latest }
        } else if current.greater_than(&latest) {
            ReleaseStatus::Ahead { latest }
        } else {
            ReleaseStatus::Latest
        })
    }

    /// Run [`Self::check`] and log the outcome.
    pub async fn report(&self, current: &SemanticVersion) -> Option<ReleaseStatus> {
        let started_at = Instant::now();
        match self.check(current).await {
            Ok(status @ ReleaseStatus::Outdated { latest }) => {
                warn!(
                    target = "application::release",
                    op = "update_check",
                    result = %status,
                    current = %current,
                    latest = %latest,
                    "a newer civic release is available"
                );
                Some(status)
            }
            Ok(status) => {
                debug!(
                    target = "application::release",
                    op = "update_check",
                    result = %status,
                    current = %current,
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    "civic is up to date"
                );
                Some(status)
            }
            Err(err) => {
                debug!(
                    target = "application::release",
                    op = "update_check",
                    result = "error",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    error = %err,
                    "release lookup skipped"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::MockServer;
    use url::Url;

    use super::*;
    use crate::infra::loader::http_client;

    fn checker(server: &MockServer) -> ReleaseChecker {
        let settings = UpdateCheckSettings {
            enabled: true,
            url: Url::parse(&server.url("/releases?per_page=1")).expect("url"),
            timeout: Duration::from_secs(2),
        };
        ReleaseChecker::new(http_client().expect("client"), &settings)
    }

    async fn serve_tag(server: &MockServer, body: &str) {
        server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/releases")
                    .query_param("per_page", "1")
                    .header("accept", "application/vnd.github+json");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(body);
            })
            .await;
    }

    #[tokio::test]
    async fn newer_release_is_reported_as_outdated() {
        let server = MockServer::start_async().await;
        serve_tag(&server, r#"[{"tag_name":"v1.4.0","name":"civic 1.4"}]"#).await;

        let status = checker(&server)
            .check(&SemanticVersion::new(1, 2, 0))
            .await
            .expect("checked");
        assert_eq!(
            status,
            ReleaseStatus::Outdated {
                latest: SemanticVersion::new(1, 4, 0)
            }
        );
    }

    #[tokio::test]
    async fn equal_and_older_releases() {
        let server = MockServer::start_async().await;
        serve_tag(&server, r#"[{"tag_name":"v1.2.0"}]"#).await;
        let checker = checker(&server);

        assert_eq!(
            checker.check(&SemanticVersion::new(1, 2, 0)).await.expect("checked"),
            ReleaseStatus::Latest
        );
        assert_eq!(
            checker.check(&SemanticVersion::new(2, 0, 0)).await.expect("checked"),
            ReleaseStatus::Ahead {
                latest: SemanticVersion::new(1, 2, 0)
            }
        );
    }

    #[tokio::test]
    async fn lookup_failures_are_errors_not_panics() {
        let server = MockServer::start_async().await;
        serve_tag(&server, "[]").await;
        let err = checker(&server).latest().await.expect_err("no release");
        assert!(matches!(err, ReleaseCheckError::NoRelease));

        let server = MockServer::start_async().await;
        serve_tag(&server, r#"[{"tag_name":"nightly"}]"#).await;
        let err = checker(&server).latest().await.expect_err("bad tag");
        assert!(matches!(err, ReleaseCheckError::InvalidTag { .. }));

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/releases");
                then.status(403);
            })
            .await;
        let checker = checker(&server);
        let err = checker.latest().await.expect_err("forbidden");
        assert!(matches!(err, ReleaseCheckError::Status(403)));
        assert_eq!(checker.report(&SemanticVersion::new(1, 2, 0)).await, None);
    }
}

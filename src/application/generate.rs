//! End-to-end generation: load the profile and its template, run the template
//! pipeline, render the requested format and write the artifact.
//!
//! Everything up to rendering runs inside one cancellable operation. The
//! artifact is written only after that operation completed, so a timeout or an
//! interrupt never leaves a partial file behind.

use std::{
    future::Future,
    path::PathBuf,
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::Client;
use tracing::{info, warn};

use crate::{
    application::{
        error::{CancelReason, ContentRole, GenerateError},
        template::{PipelineWarning, TemplatePipeline},
    },
    config::Settings,
    domain::{output::OutputKind, profile::Profile, version::SemanticVersion},
    infra::{
        loader::{ContentLoadError, ContentLoader, GeneralLoader, LoaderOptions, http_client},
        output::{RendererOptions, renderer_for, write_artifact},
    },
};

/// Version templates are checked against.
pub fn app_version() -> SemanticVersion {
    SemanticVersion::new(
        parse_component(env!("CARGO_PKG_VERSION_MAJOR")),
        parse_component(env!("CARGO_PKG_VERSION_MINOR")),
        parse_component(env!("CARGO_PKG_VERSION_PATCH")),
    )
}

fn parse_component(value: &str) -> u64 {
    value.parse().unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Profile location: a local path or an http(s) URL.
    pub profile: String,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub output: PathBuf,
    pub kind: OutputKind,
    pub bytes: usize,
    pub warnings: Vec<PipelineWarning>,
}

pub struct Generator {
    loader: LoaderOptions,
    renderer: RendererOptions,
    pipeline: TemplatePipeline,
    app_version: SemanticVersion,
    timeout: Duration,
}

impl Generator {
    pub fn new(settings: &Settings) -> Result<Self, GenerateError> {
        let client = http_client().map_err(GenerateError::load(ContentRole::Profile))?;
        Ok(Self::with_client(settings, client))
    }

    /// Build a generator that fetches remote documents through `client`.
    pub fn with_client(settings: &Settings, client: Client) -> Self {
        Self {
            loader: LoaderOptions {
                client,
                timeout: settings.loader.timeout,
            },
            renderer: RendererOptions {
                chrome_path: settings.render.chrome_path.clone(),
                timeout: Some(settings.render.timeout),
            },
            pipeline: TemplatePipeline::default(),
            app_version: app_version(),
            timeout: settings.generate.timeout,
        }
    }

    pub fn with_app_version(mut self, version: SemanticVersion) -> Self {
        self.app_version = version;
        self
    }

    /// Generate, aborting on the configured timeout or on Ctrl-C.
    pub async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateReport, GenerateError> {
        self.generate_until(request, interrupt()).await
    }

    /// Generate, aborting on the configured timeout or when `shutdown` resolves.
    pub async fn generate_until<S>(
        &self,
        request: &GenerateRequest,
        shutdown: S,
    ) -> Result<GenerateReport, GenerateError>
    where
        S: Future<Output = ()>,
    {
        let started_at = Instant::now();
        let kind = OutputKind::detect(&request.output)?;

        let (artifact, warnings) =
            with_cancellation(self.produce(request, kind), self.timeout, shutdown).await?;

        write_artifact(&request.output, &artifact)?;

        info!(
            target = "application::generate",
            op = "generate",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            output = %request.output.display(),
            kind = %kind,
            bytes = artifact.len(),
            warnings = warnings.len(),
            "Artifact generated"
        );

        Ok(GenerateReport {
            output: request.output.clone(),
            kind,
            bytes: artifact.len(),
            warnings,
        })
    }

    async fn produce(
        &self,
        request: &GenerateRequest,
        kind: OutputKind,
    ) -> Result<(Bytes, Vec<PipelineWarning>), GenerateError> {
        let renderer = renderer_for(kind, &self.renderer)?;

        let profile_bytes = load(&request.profile, &self.loader)
            .await
            .map_err(GenerateError::load(ContentRole::Profile))?;
        let profile = Profile::parse(&profile_bytes)?;
        profile.validate()?;

        let template_bytes = load(&profile.template.path, &self.loader)
            .await
            .map_err(GenerateError::load(ContentRole::Template))?;

        let processed = self
            .pipeline
            .process(&template_bytes, &profile, &self.app_version)?;
        for warning in &processed.warnings {
            warn!(
                target = "application::generate",
                op = "generate",
                warning = %warning,
                "Template processed with a warning"
            );
        }

        let artifact = renderer.render(&processed.html, &profile.page).await?;
        Ok((artifact, processed.warnings))
    }
}

async fn load(source: &str, options: &LoaderOptions) -> Result<Bytes, ContentLoadError> {
    GeneralLoader::new(source, options)?.load().await
}

/// Run `operation` until it finishes, `timeout` elapses or `shutdown`
/// resolves. Losing the race drops the operation and everything it owns.
pub async fn with_cancellation<T, F, S>(
    operation: F,
    timeout: Duration,
    shutdown: S,
) -> Result<T, GenerateError>
where
    F: Future<Output = Result<T, GenerateError>>,
    S: Future<Output = ()>,
{
    tokio::select! {
        outcome = tokio::time::timeout(timeout, operation) => match outcome {
            Ok(result) => result,
            Err(_) => Err(GenerateError::Cancelled(CancelReason::Timeout(timeout))),
        },
        () = shutdown => Err(GenerateError::Cancelled(CancelReason::Interrupted)),
    }
}

async fn interrupt() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_version_matches_the_package() {
        assert_eq!(
            app_version().to_string(),
            format!("v{}", env!("CARGO_PKG_VERSION"))
        );
    }

    #[tokio::test]
    async fn completed_operations_pass_through() {
        let value = with_cancellation(
            async { Ok::<_, GenerateError>(7) },
            Duration::from_secs(1),
            std::future::pending(),
        )
        .await
        .expect("completes");
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn slow_operations_time_out() {
        let err = with_cancellation(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, GenerateError>(())
            },
            Duration::from_millis(20),
            std::future::pending(),
        )
        .await
        .expect_err("times out");
        assert!(matches!(
            err,
            GenerateError::Cancelled(CancelReason::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn shutdown_interrupts_the_operation() {
        let err = with_cancellation(
            std::future::pending::<Result<(), GenerateError>>(),
            Duration::from_secs(5),
            async {},
        )
        .await
        .expect_err("interrupted");
        assert!(matches!(
            err,
            GenerateError::Cancelled(CancelReason::Interrupted)
        ));
    }
}

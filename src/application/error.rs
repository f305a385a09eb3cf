use std::{fmt, time::Duration};

use thiserror::Error;

use crate::{
    application::{init::InitError, schema::SchemaError, template::StageError},
    config::LoadError,
    domain::{output::UnsupportedOutput, profile::ProfileFormatError, validation::ValidationError},
    infra::{
        error::InfraError,
        loader::ContentLoadError,
        output::{OutputWriteError, RenderError},
    },
};

/// Which document a loader was fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRole {
    Profile,
    Template,
}

impl fmt::Display for ContentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentRole::Profile => f.write_str("profile"),
            ContentRole::Template => f.write_str("template"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Timeout(Duration),
    Interrupted,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Timeout(limit) => write!(f, "timed out after {}s", limit.as_secs_f64()),
            CancelReason::Interrupted => f.write_str("interrupted"),
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    UnsupportedOutput(#[from] UnsupportedOutput),
    #[error("failed to load {role}: {source}")]
    ContentLoad {
        role: ContentRole,
        #[source]
        source: ContentLoadError,
    },
    #[error(transparent)]
    ProfileFormat(#[from] ProfileFormatError),
    #[error(transparent)]
    ProfileValidation(#[from] ValidationError),
    #[error(transparent)]
    Template(#[from] StageError),
    #[error("failed to render output: {0}")]
    Render(#[from] RenderError),
    #[error(transparent)]
    OutputWrite(#[from] OutputWriteError),
    #[error("generation cancelled: {0}")]
    Cancelled(CancelReason),
}

impl GenerateError {
    pub fn load(role: ContentRole) -> impl FnOnce(ContentLoadError) -> Self {
        move |source| Self::ContentLoad { role, source }
    }

    /// Short name of the step that failed, for structured logs.
    pub fn stage(&self) -> &'static str {
        match self {
            GenerateError::UnsupportedOutput(_) => "output",
            GenerateError::ContentLoad { .. } => "load",
            GenerateError::ProfileFormat(_) => "profile-parse",
            GenerateError::ProfileValidation(_) => "profile-validate",
            GenerateError::Template(err) => err.stage.as_str(),
            GenerateError::Render(_) => "render",
            GenerateError::OutputWrite(_) => "write",
            GenerateError::Cancelled(_) => "cancelled",
        }
    }
}

/// Top-level error reported by the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Init(#[from] InitError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("failed to build the HTTP client: {0}")]
    Client(#[source] ContentLoadError),
}

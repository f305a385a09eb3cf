//! Template pipeline: substitute profile data, parse, gate, customize and
//! serialize a résumé template.
//!
//! Stages run in a fixed order and the first failing gate short-circuits the
//! run with the stage named in the error. The only non-fatal findings are
//! collected as [`PipelineWarning`]s on the result.

pub mod compat;
pub mod customize;
pub mod directives;
pub mod policy;
mod sink;
pub mod tree;

use std::{fmt, io, str::Utf8Error};

use thiserror::Error;
use tracing::debug;

use crate::domain::{profile::Profile, version::SemanticVersion};

use self::{
    compat::{CompatibilityError, VersionDrift},
    customize::{Customization, UnsafeStyle},
    directives::{DirectiveContext, DirectiveEngine},
    policy::{ForbiddenTagError, TagPolicy},
    tree::{NodeTree, TreeParseError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Substitute,
    Parse,
    TagCheck,
    VersionCheck,
    Customize,
    Serialize,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Substitute => "substitute",
            Stage::Parse => "parse",
            Stage::TagCheck => "tag-check",
            Stage::VersionCheck => "version-check",
            Stage::Customize => "customize",
            Stage::Serialize => "serialize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template is not valid UTF-8")]
    Encoding(#[source] Utf8Error),
    #[error("template directive failed: {0}")]
    Directive(#[source] Box<handlebars::RenderError>),
    #[error("template is not parsable HTML: {0}")]
    NonParsable(#[from] TreeParseError),
    #[error(transparent)]
    ForbiddenTag(#[from] ForbiddenTagError),
    #[error(transparent)]
    Compatibility(#[from] CompatibilityError),
    #[error(transparent)]
    UnsafeStyle(#[from] UnsafeStyle),
    #[error("failed to serialize template: {0}")]
    Serialize(#[source] io::Error),
}

/// A [`TemplateError`] tagged with the stage that raised it.
#[derive(Debug, Error)]
#[error("template {stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: TemplateError,
}

impl StageError {
    fn at(stage: Stage) -> impl FnOnce(TemplateError) -> Self {
        move |source| Self { stage, source }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    VersionDrift(VersionDrift),
    MissingHead,
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::VersionDrift(drift) => write!(
                f,
                "template targets {} while the application is {}",
                drift.template, drift.app
            ),
            PipelineWarning::MissingHead => {
                f.write_str("template has no <head>; customizer style was not applied")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedTemplate {
    pub html: String,
    pub warnings: Vec<PipelineWarning>,
}

#[derive(Default)]
pub struct TemplatePipeline {
    engine: DirectiveEngine,
    policy: TagPolicy,
}

impl TemplatePipeline {
    pub fn new(policy: TagPolicy) -> Self {
        Self {
            engine: DirectiveEngine::new(),
            policy,
        }
    }

    pub fn process(
        &self,
        template: &[u8],
        profile: &Profile,
        app_version: &SemanticVersion,
    ) -> Result<ProcessedTemplate, StageError> {
        let mut warnings = Vec::new();

        let substituted = substitute_stage(&self.engine, template, profile, app_version)
            .map_err(StageError::at(Stage::Substitute))?;

        let mut tree = parse_stage(&substituted).map_err(StageError::at(Stage::Parse))?;

        self.policy
            .check(&tree)
            .map_err(TemplateError::from)
            .map_err(StageError::at(Stage::TagCheck))?;

        let drift = compat::check(&tree, app_version)
            .map_err(TemplateError::from)
            .map_err(StageError::at(Stage::VersionCheck))?;
        warnings.extend(drift.map(PipelineWarning::VersionDrift));

        let customization = customize::apply(&mut tree, profile.customizer_style())
            .map_err(TemplateError::from)
            .map_err(StageError::at(Stage::Customize))?;
        if customization == Customization::MissingHead {
            warnings.push(PipelineWarning::MissingHead);
        }

        let html = serialize_stage(&tree).map_err(StageError::at(Stage::Serialize))?;

        debug!(
            target = "application::template",
            bytes = html.len(),
            warnings = warnings.len(),
            "template processed"
        );
        Ok(ProcessedTemplate { html, warnings })
    }
}

fn substitute_stage(
    engine: &DirectiveEngine,
    template: &[u8],
    profile: &Profile,
    app_version: &SemanticVersion,
) -> Result<String, TemplateError> {
    let text = std::str::from_utf8(template).map_err(TemplateError::Encoding)?;
    let context = DirectiveContext::new(profile, &app_version.to_string());
    engine
        .render(text, &context)
        .map_err(|err| TemplateError::Directive(Box::new(err)))
}

fn parse_stage(html: &str) -> Result<NodeTree, TemplateError> {
    Ok(NodeTree::parse(html)?)
}

fn serialize_stage(tree: &NodeTree) -> Result<String, TemplateError> {
    tree.to_html().map_err(TemplateError::Serialize)
}

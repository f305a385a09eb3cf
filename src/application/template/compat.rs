//! Compatibility gate between a template and the running application version.

use thiserror::Error;
use tracing::warn;

use super::tree::NodeTree;
use crate::domain::version::{SemanticVersion, VersionError};

pub const VERSION_META_NAME: &str = "app-version";

#[derive(Debug, Error)]
pub enum CompatibilityError {
    #[error("template declares no `<meta name=\"app-version\">` element")]
    MissingMeta,
    #[error("template declares {count} `<meta name=\"app-version\">` elements, expected exactly one")]
    DuplicateMeta { count: usize },
    #[error("template `app-version` meta has no content")]
    EmptyVersion,
    #[error("template `app-version` meta content `{value}` is not a version")]
    InvalidVersion {
        value: String,
        #[source]
        source: VersionError,
    },
    #[error("template targets {template} but the application is {app}; major versions must match")]
    MajorMismatch {
        app: SemanticVersion,
        template: SemanticVersion,
    },
}

/// Same major version, different minor or patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDrift {
    pub app: SemanticVersion,
    pub template: SemanticVersion,
}

/// Read the template's declared version and compare it against `app`.
pub fn check(
    tree: &NodeTree,
    app: &SemanticVersion,
) -> Result<Option<VersionDrift>, CompatibilityError> {
    let metas = tree.select("meta").filter_attr("name", VERSION_META_NAME);
    let meta = match metas.len() {
        0 => return Err(CompatibilityError::MissingMeta),
        1 => metas.first().ok_or(CompatibilityError::MissingMeta)?,
        count => return Err(CompatibilityError::DuplicateMeta { count }),
    };

    let value = meta.attr("content").map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(CompatibilityError::EmptyVersion);
    }

    let template =
        SemanticVersion::parse(value).map_err(|source| CompatibilityError::InvalidVersion {
            value: value.to_string(),
            source,
        })?;

    if !template.same_major(app) {
        return Err(CompatibilityError::MajorMismatch {
            app: *app,
            template,
        });
    }

    if template.equal(app) {
        return Ok(None);
    }

    warn!(
        target = "application::template::compat",
        app_version = %app,
        template_version = %template,
        "template was written for a different minor or patch version"
    );
    Ok(Some(VersionDrift {
        app: *app,
        template,
    }))
}

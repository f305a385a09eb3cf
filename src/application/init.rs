//! `init`: write the bundled sample profile and its template so that
//! `civic generate` works straight away.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::infra::output::{OutputWriteError, write_artifact};

/// Sample profile shipped with the binary. It references `./template.html`.
pub const SAMPLE_PROFILE: &str = include_str!("../../assets/sample-profile.yaml");

/// Sample template matching [`SAMPLE_PROFILE`].
pub const SAMPLE_TEMPLATE: &str = include_str!("../../assets/template.html");

const SAMPLE_TEMPLATE_FILE: &str = "template.html";
const SAMPLE_TEMPLATE_REF: &str = "path: ./template.html";

#[derive(Debug, Error)]
pub enum InitError {
    #[error("`{path}` already exists; pass --force to replace it")]
    AlreadyExists { path: PathBuf },
    #[error("failed to inspect `{path}`: {source}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode template path: {0}")]
    Encode(#[from] serde_yaml::Error),
    #[error(transparent)]
    Write(#[from] OutputWriteError),
}

/// Files written by [`init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub profile: PathBuf,
    pub template: PathBuf,
}

/// Write [`SAMPLE_PROFILE`] to `path` and [`SAMPLE_TEMPLATE`] next to it, with
/// the profile pointing at that template. Nothing is written if either file
/// exists, unless `force`.
pub fn init(path: &Path, force: bool) -> Result<InitReport, InitError> {
    let template = path.with_file_name(SAMPLE_TEMPLATE_FILE);

    let mut replaced = false;
    for target in [path, template.as_path()] {
        let exists = target.try_exists().map_err(|source| InitError::Inspect {
            path: target.to_path_buf(),
            source,
        })?;
        if exists && !force {
            return Err(InitError::AlreadyExists {
                path: target.to_path_buf(),
            });
        }
        replaced |= exists;
    }

    let profile = sample_profile_for(&template)?;
    write_artifact(&template, SAMPLE_TEMPLATE.as_bytes())?;
    write_artifact(path, profile.as_bytes())?;

    info!(
        target = "application::init",
        op = "init",
        result = "ok",
        profile = %path.display(),
        template = %template.display(),
        replaced,
        "Sample profile written"
    );
    Ok(InitReport {
        profile: path.to_path_buf(),
        template,
    })
}

/// The sample profile with its template reference pointing at `template`.
fn sample_profile_for(template: &Path) -> Result<String, InitError> {
    let encoded = serde_yaml::to_string(&template.display().to_string())?;
    Ok(SAMPLE_PROFILE.replacen(
        SAMPLE_TEMPLATE_REF,
        &format!("path: {}", encoded.trim_end()),
        1,
    ))
}

//! JSON schema of the profile document, for editor completion and validation.

use std::path::Path;

use schemars::{schema::RootSchema, schema_for};
use thiserror::Error;
use tracing::info;

use crate::{
    domain::profile::Profile,
    infra::output::{OutputWriteError, write_artifact},
};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to encode the profile schema: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Write(#[from] OutputWriteError),
}

pub fn profile_schema() -> RootSchema {
    schema_for!(Profile)
}

/// Write the pretty-printed schema to `path`, replacing any previous export.
pub fn export(path: &Path) -> Result<usize, SchemaError> {
    let encoded = serde_json::to_string_pretty(&profile_schema())?;
    write_artifact(path, encoded.as_bytes())?;

    info!(
        target = "application::schema",
        op = "schema",
        result = "ok",
        path = %path.display(),
        bytes = encoded.len(),
        "Profile schema written"
    );
    Ok(encoded.len())
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn schema_json() -> Value {
        serde_json::to_value(profile_schema()).expect("schema encodes")
    }

    #[test]
    fn exposes_profile_keys_in_camel_case() {
        let schema = schema_json();
        let properties = schema["properties"].as_object().expect("properties");

        for key in ["template", "page", "bio", "workExperiences", "customSections"] {
            assert!(properties.contains_key(key), "missing `{key}`");
        }
        assert!(!properties.contains_key("work_experiences"));
    }

    #[test]
    fn page_sizes_are_enumerated() {
        let schema = schema_json();
        let sizes = schema["definitions"]["PageSize"]["enum"]
            .as_array()
            .expect("page size enum");
        assert!(sizes.contains(&Value::from("Arch-A")));
        assert_eq!(schema["definitions"]["PageSize"]["default"], "A4");
    }

    #[test]
    fn export_writes_parsable_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("civic-jsonschema.json");

        let bytes = export(&path).expect("exported");
        let written = std::fs::read(&path).expect("read");
        assert_eq!(written.len(), bytes);

        let parsed: Value = serde_json::from_slice(&written).expect("valid json");
        assert_eq!(parsed["title"], "Profile");
    }
}

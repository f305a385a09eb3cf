//! Printed page geometry.

use std::{fmt, str::FromStr};

use schemars::{
    JsonSchema,
    r#gen::SchemaGenerator,
    schema::{InstanceType, Metadata, Schema, SchemaObject},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown page size `{0}` (expected one of A4, B4, A, Arch-A, Letter)")]
pub struct UnknownPageSize(pub String);

/// Supported paper sizes. Parsed case-insensitively; a profile naming any
/// other size gets A4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PageSize {
    #[default]
    A4,
    B4,
    A,
    ArchA,
    Letter,
}

impl PageSize {
    pub const ALL: [PageSize; 5] = [Self::A4, Self::B4, Self::A, Self::ArchA, Self::Letter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::B4 => "B4",
            Self::A => "A",
            Self::ArchA => "Arch-A",
            Self::Letter => "Letter",
        }
    }

    pub fn width_inches(&self) -> f64 {
        match self {
            Self::A4 => 8.27,
            Self::B4 => 10.12,
            Self::A | Self::Letter => 8.5,
            Self::ArchA => 9.0,
        }
    }

    pub fn height_inches(&self) -> f64 {
        match self {
            Self::A4 => 11.69,
            Self::B4 => 14.33,
            Self::A | Self::Letter => 11.0,
            Self::ArchA => 12.0,
        }
    }
}

impl FromStr for PageSize {
    type Err = UnknownPageSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "b4" => Ok(Self::B4),
            "a" => Ok(Self::A),
            "arch-a" => Ok(Self::ArchA),
            "letter" => Ok(Self::Letter),
            _ => Err(UnknownPageSize(s.to_string())),
        }
    }
}

impl From<String> for PageSize {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|err: UnknownPageSize| {
            warn!(
                target = "domain::page",
                error = %err,
                fallback = %PageSize::A4,
                "unknown page size; using the default"
            );
            PageSize::A4
        })
    }
}

impl From<PageSize> for String {
    fn from(value: PageSize) -> Self {
        value.as_str().to_string()
    }
}

impl JsonSchema for PageSize {
    fn schema_name() -> String {
        "PageSize".to_string()
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            metadata: Some(Box::new(Metadata {
                description: Some(
                    "Paper size, case-insensitive. Unknown sizes fall back to A4.".to_string(),
                ),
                default: Some(PageSize::A4.as_str().into()),
                ..Default::default()
            })),
            instance_type: Some(InstanceType::String.into()),
            enum_values: Some(
                Self::ALL
                    .iter()
                    .map(|size| size.as_str().into())
                    .collect(),
            ),
            ..Default::default()
        }
        .into()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page margins in inches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PageMargin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl PageMargin {
    pub(crate) fn sides(&self) -> [(&'static str, f64); 4] {
        [
            ("top", self.top),
            ("right", self.right),
            ("bottom", self.bottom),
            ("left", self.left),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PageSettings {
    pub size: PageSize,
    pub margin: PageMargin,
}

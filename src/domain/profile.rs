//! The résumé profile: a typed view of the user's YAML document.
//!
//! Every field deserializes with a default so that a sparse document still
//! parses; required-ness is enforced afterwards by [`crate::domain::validation`]
//! so that all problems can be reported in a single pass. Declared defaults
//! (section headers, open-ended end dates) are applied during [`Profile::parse`],
//! before validation sees the value.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    page::PageSettings,
    validation::{self, ValidationError},
};

const OPEN_END_DATE: &str = "present";

/// The profile document could not be decoded.
#[derive(Debug, Error)]
#[error("profile is not a valid YAML document: {0}")]
pub struct ProfileFormatError(#[from] serde_yaml::Error);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub template: TemplateRef,
    pub page: PageSettings,
    pub bio: Bio,
    pub work_experiences: Option<Section<WorkExperience>>,
    pub educations: Option<Section<Education>>,
    pub certificates: Option<Section<Certificate>>,
    pub publications: Option<Section<Publication>>,
    pub skills: Option<Section<SkillCategory>>,
    pub projects: Option<Section<Project>>,
    pub custom_sections: Vec<CustomSection>,
}

impl Profile {
    /// Decode a YAML profile and apply declared defaults.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProfileFormatError> {
        let mut profile: Profile = serde_yaml::from_slice(bytes)?;
        profile.apply_defaults();
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }

    /// Customizer style text, when there is any to inject.
    pub fn customizer_style(&self) -> Option<&str> {
        self.template
            .customizer
            .as_ref()
            .map(|customizer| customizer.style.trim())
            .filter(|style| !style.is_empty())
    }

    pub fn socials(&self) -> &[String] {
        self.bio
            .contact
            .as_ref()
            .map(|contact| contact.socials.as_slice())
            .unwrap_or_default()
    }

    fn apply_defaults(&mut self) {
        fill_section(&mut self.work_experiences);
        fill_section(&mut self.educations);
        fill_section(&mut self.certificates);
        fill_section(&mut self.publications);
        fill_section(&mut self.skills);
        fill_section(&mut self.projects);
    }
}

fn fill_section<T: SectionEntity>(section: &mut Option<Section<T>>) {
    if let Some(section) = section.as_mut() {
        section.apply_defaults();
    }
}

fn fill_if_blank(value: &mut String, default: &str) {
    if value.trim().is_empty() {
        *value = default.to_string();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateRef {
    /// Local path or http(s) URL of the HTML template.
    pub path: String,
    /// Extra CSS appended to the template's `<head>`.
    pub customizer: Option<Customizer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Customizer {
    pub style: String,
}

/// Whether `style` would end the `<style>` element it is injected into.
/// Style text is serialized raw, so anything after `</style` becomes markup.
pub fn closes_style_element(style: &str) -> bool {
    style.to_ascii_lowercase().contains("</style")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Bio {
    pub name: String,
    pub title: String,
    pub about: String,
    pub contact: Option<Contact>,
    pub custom_data: Vec<CustomData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Contact {
    pub location: String,
    pub website: String,
    pub email: String,
    pub phone: String,
    /// Profile URLs; known platforms get a short username in templates.
    pub socials: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CustomData {
    pub label: String,
    pub value: String,
}

/// Entity types that live inside a titled [`Section`].
pub trait SectionEntity {
    const DEFAULT_HEADER: &'static str;

    fn apply_defaults(&mut self) {}
}

/// A titled, ordered list of entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Section<T> {
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub entities: Vec<T>,
}

impl<T: SectionEntity> Section<T> {
    pub fn new(entities: Vec<T>) -> Self {
        Self {
            header: T::DEFAULT_HEADER.to_string(),
            entities,
        }
    }

    fn apply_defaults(&mut self) {
        fill_if_blank(&mut self.header, T::DEFAULT_HEADER);
        self.entities.iter_mut().for_each(T::apply_defaults);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkExperience {
    pub title: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub details: Vec<String>,
    pub technologies: Vec<String>,
}

impl SectionEntity for WorkExperience {
    const DEFAULT_HEADER: &'static str = "Work Experiences";

    fn apply_defaults(&mut self) {
        fill_if_blank(&mut self.end_date, OPEN_END_DATE);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub degree: String,
    pub field: String,
    pub university: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub details: Vec<String>,
    pub technologies: Vec<String>,
}

impl SectionEntity for Education {
    const DEFAULT_HEADER: &'static str = "Educations";

    fn apply_defaults(&mut self) {
        fill_if_blank(&mut self.end_date, OPEN_END_DATE);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Certificate {
    pub title: String,
    pub issuer: String,
    pub issue_date: String,
    pub expiration_date: String,
}

impl SectionEntity for Certificate {
    const DEFAULT_HEADER: &'static str = "Certificates";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Publication {
    pub title: String,
    pub publisher: String,
    pub publish_date: String,
    pub link: String,
    pub details: Vec<String>,
}

impl SectionEntity for Publication {
    const DEFAULT_HEADER: &'static str = "Publications";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SkillCategory {
    pub category: String,
    pub items: Vec<SkillItem>,
}

impl SectionEntity for SkillCategory {
    const DEFAULT_HEADER: &'static str = "Skills";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SkillItem {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Project {
    pub title: String,
    pub link: String,
    pub details: Vec<String>,
}

impl SectionEntity for Project {
    const DEFAULT_HEADER: &'static str = "Projects";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CustomSection {
    pub header: String,
    pub details: Vec<String>,
}

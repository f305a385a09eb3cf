//! Profile validation.
//!
//! Validation walks the profile through [`PROFILE_VALIDATORS`], an ordered
//! list of plain functions sharing one signature. Each one records every rule
//! it sees violated into a [`Report`] instead of stopping at the first
//! problem, so a single run names every offending field.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use url::Url;

use super::profile::{
    Bio, Certificate, Contact, CustomSection, Education, Profile, Project, Publication, Section,
    SkillCategory, WorkExperience, closes_style_element,
};

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;
const TITLE_MIN_CHARS: usize = 2;
const DETAIL_MIN_CHARS: usize = 2;
const PROJECT_DETAIL_MIN_CHARS: usize = 1;
const TECHNOLOGY_MIN_CHARS: usize = 1;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

/// The rule a field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    MinItems(usize),
    Url,
    Email,
    NonNegative,
    NoClosingStyleTag,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Required => f.write_str("is required"),
            Rule::MinLength(min) => write!(f, "must be at least {min} characters"),
            Rule::MaxLength(max) => write!(f, "must be at most {max} characters"),
            Rule::MinItems(min) => write!(f, "must contain at least {min} item(s)"),
            Rule::Url => f.write_str("must be a valid URL"),
            Rule::Email => f.write_str("must be a valid email address"),
            Rule::NonNegative => f.write_str("must not be negative"),
            Rule::NoClosingStyleTag => f.write_str("must not contain a closing `</style` tag"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub rule: Rule,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.field, self.rule)
    }
}

/// Every violation found in a profile.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("profile validation failed: {}", join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Offending field paths in report order.
    pub fn fields(&self) -> Vec<&str> {
        self.violations
            .iter()
            .map(|violation| violation.field.as_str())
            .collect()
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Collects violations for one validation run.
#[derive(Debug, Default)]
pub struct Report {
    violations: Vec<FieldViolation>,
}

impl Report {
    fn push(&mut self, field: impl Into<String>, rule: Rule) {
        self.violations.push(FieldViolation {
            field: field.into(),
            rule,
        });
    }

    /// Records `Required` for blank values; returns whether a value is present.
    fn required(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.push(field, Rule::Required);
            false
        } else {
            true
        }
    }

    fn length(&mut self, field: &str, value: &str, min: usize, max: Option<usize>) {
        let count = value.chars().count();
        if count < min {
            self.push(field, Rule::MinLength(min));
        } else if let Some(max) = max.filter(|max| count > *max) {
            self.push(field, Rule::MaxLength(max));
        }
    }

    fn required_text(&mut self, field: &str, value: &str, min: usize, max: Option<usize>) {
        if self.required(field, value) {
            self.length(field, value, min, max);
        }
    }

    fn url(&mut self, field: &str, value: &str) {
        if Url::parse(value.trim()).is_err() {
            self.push(field, Rule::Url);
        }
    }

    fn required_url(&mut self, field: &str, value: &str) {
        if self.required(field, value) {
            self.url(field, value);
        }
    }

    fn min_items<T>(&mut self, field: &str, items: &[T], min: usize) -> bool {
        if items.len() < min {
            self.push(field, Rule::MinItems(min));
            false
        } else {
            true
        }
    }

    fn each_min_length(&mut self, field: &str, items: &[String], min: usize) {
        for (index, item) in items.iter().enumerate() {
            self.length(&format!("{field}[{index}]"), item, min, None);
        }
    }

    fn into_result(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                violations: self.violations,
            })
        }
    }
}

/// Shared contract for section entities: record violations under `path`.
pub trait Validate {
    fn validate(&self, path: &str, report: &mut Report);
}

pub type ProfileValidator = fn(&Profile, &mut Report);

/// Validators run in this order; violations are reported in the same order.
pub const PROFILE_VALIDATORS: &[ProfileValidator] = &[
    validate_template,
    validate_page,
    validate_bio,
    validate_work_experiences,
    validate_educations,
    validate_certificates,
    validate_publications,
    validate_skills,
    validate_projects,
    validate_custom_sections,
];

/// Run every validator and aggregate the violations.
pub fn validate(profile: &Profile) -> Result<(), ValidationError> {
    let mut report = Report::default();
    for validator in PROFILE_VALIDATORS {
        validator(profile, &mut report);
    }
    report.into_result()
}

fn validate_template(profile: &Profile, report: &mut Report) {
    report.required("template.path", &profile.template.path);

    if profile.customizer_style().is_some_and(closes_style_element) {
        report.push("template.customizer.style", Rule::NoClosingStyleTag);
    }
}

fn validate_page(profile: &Profile, report: &mut Report) {
    for (side, value) in profile.page.margin.sides() {
        if !value.is_finite() || value < 0.0 {
            report.push(format!("page.margin.{side}"), Rule::NonNegative);
        }
    }
}

fn validate_bio(profile: &Profile, report: &mut Report) {
    let Bio {
        name,
        title,
        contact,
        custom_data,
        ..
    } = &profile.bio;

    report.required_text("bio.name", name, NAME_MIN_CHARS, Some(NAME_MAX_CHARS));
    report.required_text("bio.title", title, TITLE_MIN_CHARS, None);

    if let Some(contact) = contact {
        validate_contact(contact, report);
    }

    for (index, data) in custom_data.iter().enumerate() {
        report.required(&format!("bio.customData[{index}].value"), &data.value);
    }
}

fn validate_contact(contact: &Contact, report: &mut Report) {
    if !contact.website.trim().is_empty() {
        report.url("bio.contact.website", &contact.website);
    }

    if report.required("bio.contact.email", &contact.email)
        && !EMAIL_PATTERN.is_match(contact.email.trim())
    {
        report.push("bio.contact.email", Rule::Email);
    }

    for (index, social) in contact.socials.iter().enumerate() {
        report.url(&format!("bio.contact.socials[{index}]"), social);
    }
}

fn validate_section<T: Validate>(name: &str, section: Option<&Section<T>>, report: &mut Report) {
    let Some(section) = section else {
        return;
    };

    let entities_path = format!("{name}.entities");
    if !report.min_items(&entities_path, &section.entities, 1) {
        return;
    }

    for (index, entity) in section.entities.iter().enumerate() {
        entity.validate(&format!("{entities_path}[{index}]"), report);
    }
}

fn validate_work_experiences(profile: &Profile, report: &mut Report) {
    validate_section("workExperiences", profile.work_experiences.as_ref(), report);
}

fn validate_educations(profile: &Profile, report: &mut Report) {
    validate_section("educations", profile.educations.as_ref(), report);
}

fn validate_certificates(profile: &Profile, report: &mut Report) {
    validate_section("certificates", profile.certificates.as_ref(), report);
}

fn validate_publications(profile: &Profile, report: &mut Report) {
    validate_section("publications", profile.publications.as_ref(), report);
}

fn validate_skills(profile: &Profile, report: &mut Report) {
    validate_section("skills", profile.skills.as_ref(), report);
}

fn validate_projects(profile: &Profile, report: &mut Report) {
    validate_section("projects", profile.projects.as_ref(), report);
}

fn validate_custom_sections(profile: &Profile, report: &mut Report) {
    for (index, section) in profile.custom_sections.iter().enumerate() {
        section.validate(&format!("customSections[{index}]"), report);
    }
}

impl Validate for WorkExperience {
    fn validate(&self, path: &str, report: &mut Report) {
        report.required(&format!("{path}.title"), &self.title);
        report.required(&format!("{path}.company"), &self.company);
        report.required(&format!("{path}.startDate"), &self.start_date);
        report.each_min_length(&format!("{path}.details"), &self.details, DETAIL_MIN_CHARS);
        report.each_min_length(
            &format!("{path}.technologies"),
            &self.technologies,
            TECHNOLOGY_MIN_CHARS,
        );
    }
}

impl Validate for Education {
    fn validate(&self, path: &str, report: &mut Report) {
        report.required(&format!("{path}.degree"), &self.degree);
        report.required(&format!("{path}.field"), &self.field);
        report.required(&format!("{path}.university"), &self.university);
        report.required(&format!("{path}.startDate"), &self.start_date);
        report.each_min_length(&format!("{path}.details"), &self.details, DETAIL_MIN_CHARS);
        report.each_min_length(
            &format!("{path}.technologies"),
            &self.technologies,
            TECHNOLOGY_MIN_CHARS,
        );
    }
}

impl Validate for Certificate {
    fn validate(&self, path: &str, report: &mut Report) {
        report.required(&format!("{path}.title"), &self.title);
        report.required(&format!("{path}.issuer"), &self.issuer);
        report.required(&format!("{path}.issueDate"), &self.issue_date);
    }
}

impl Validate for Publication {
    fn validate(&self, path: &str, report: &mut Report) {
        report.required(&format!("{path}.title"), &self.title);
        report.required(&format!("{path}.publisher"), &self.publisher);
        report.required(&format!("{path}.publishDate"), &self.publish_date);
        report.required_url(&format!("{path}.link"), &self.link);
        report.each_min_length(&format!("{path}.details"), &self.details, DETAIL_MIN_CHARS);
    }
}

impl Validate for SkillCategory {
    fn validate(&self, path: &str, report: &mut Report) {
        report.required(&format!("{path}.category"), &self.category);
        let items_path = format!("{path}.items");
        if report.min_items(&items_path, &self.items, 1) {
            for (index, item) in self.items.iter().enumerate() {
                report.required(&format!("{items_path}[{index}].name"), &item.name);
            }
        }
    }
}

impl Validate for Project {
    fn validate(&self, path: &str, report: &mut Report) {
        report.required(&format!("{path}.title"), &self.title);
        report.required_url(&format!("{path}.link"), &self.link);
        report.each_min_length(
            &format!("{path}.details"),
            &self.details,
            PROJECT_DETAIL_MIN_CHARS,
        );
    }
}

impl Validate for CustomSection {
    fn validate(&self, path: &str, report: &mut Report) {
        report.required(&format!("{path}.header"), &self.header);
        let details_path = format!("{path}.details");
        if report.min_items(&details_path, &self.details, 1) {
            report.each_min_length(&details_path, &self.details, DETAIL_MIN_CHARS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{Customizer, SkillItem};

    fn valid_profile() -> Profile {
        let mut profile = Profile::default();
        profile.template.path = "./template.html".to_string();
        profile.template.customizer = Some(Customizer::default());
        profile.bio.name = "Jane Doe".to_string();
        profile.bio.title = "Engineer".to_string();
        profile
    }

    #[test]
    fn minimal_profile_is_valid() {
        valid_profile().validate().expect("valid profile");
    }

    #[test]
    fn missing_name_and_title_are_reported_together() {
        let mut profile = valid_profile();
        profile.bio.name.clear();
        profile.bio.title.clear();

        let err = profile.validate().expect_err("invalid profile");
        assert_eq!(err.fields(), vec!["bio.name", "bio.title"]);
        assert!(
            err.violations
                .iter()
                .all(|violation| violation.rule == Rule::Required)
        );
    }

    #[test]
    fn customizer_style_must_stay_inside_its_element() {
        let mut profile = valid_profile();
        profile.template.customizer = Some(Customizer {
            style: "h1{}</STYLE ><script>alert(1)</script><style>".to_string(),
        });

        let err = profile.validate().expect_err("escaping style");
        assert_eq!(err.fields(), vec!["template.customizer.style"]);
        assert_eq!(err.violations[0].rule, Rule::NoClosingStyleTag);

        profile.template.customizer = Some(Customizer {
            style: "a::after { content: \"</b>\"; }".to_string(),
        });
        profile.validate().expect("other closing tags are plain text");
    }

    #[test]
    fn name_length_bounds_are_enforced() {
        let mut profile = valid_profile();
        profile.bio.name = "J".to_string();
        let err = profile.validate().expect_err("too short");
        assert_eq!(err.violations[0].rule, Rule::MinLength(2));

        profile.bio.name = "x".repeat(101);
        let err = profile.validate().expect_err("too long");
        assert_eq!(err.violations[0].rule, Rule::MaxLength(100));
    }

    #[test]
    fn empty_section_fails_minimum_length_rule() {
        let mut profile = valid_profile();
        profile.work_experiences = Some(Section::new(Vec::new()));

        let err = profile.validate().expect_err("empty section");
        assert_eq!(
            err.violations,
            vec![FieldViolation {
                field: "workExperiences.entities".to_string(),
                rule: Rule::MinItems(1),
            }]
        );
    }

    #[test]
    fn entity_violations_carry_indexed_paths() {
        let mut profile = valid_profile();
        profile.work_experiences = Some(Section::new(vec![WorkExperience {
            title: "Engineer".to_string(),
            start_date: "2020".to_string(),
            details: vec!["Shipped things".to_string(), "x".to_string()],
            ..WorkExperience::default()
        }]));
        profile.projects = Some(Section::new(vec![Project {
            title: "civic".to_string(),
            link: "not a url".to_string(),
            details: Vec::new(),
        }]));

        let err = profile.validate().expect_err("invalid entities");
        assert_eq!(
            err.fields(),
            vec![
                "workExperiences.entities[0].company",
                "workExperiences.entities[0].details[1]",
                "projects.entities[0].link",
            ]
        );
        assert_eq!(err.violations[2].rule, Rule::Url);
    }

    #[test]
    fn contact_rules_cover_email_website_and_socials() {
        let mut profile = valid_profile();
        profile.bio.contact = Some(Contact {
            website: "example.com".to_string(),
            email: "jane-at-example.com".to_string(),
            socials: vec![
                "https://github.com/jane".to_string(),
                "github/jane".to_string(),
            ],
            ..Contact::default()
        });

        let err = profile.validate().expect_err("invalid contact");
        assert_eq!(
            err.violations,
            vec![
                FieldViolation {
                    field: "bio.contact.website".to_string(),
                    rule: Rule::Url,
                },
                FieldViolation {
                    field: "bio.contact.email".to_string(),
                    rule: Rule::Email,
                },
                FieldViolation {
                    field: "bio.contact.socials[1]".to_string(),
                    rule: Rule::Url,
                },
            ]
        );
    }

    #[test]
    fn skills_and_custom_sections_require_items() {
        let mut profile = valid_profile();
        profile.skills = Some(Section::new(vec![
            SkillCategory {
                category: "Languages".to_string(),
                items: vec![SkillItem {
                    name: "Rust".to_string(),
                    description: String::new(),
                }],
            },
            SkillCategory {
                category: "Tools".to_string(),
                items: Vec::new(),
            },
        ]));
        profile.custom_sections = vec![CustomSection {
            header: String::new(),
            details: vec!["ok".to_string()],
        }];

        let err = profile.validate().expect_err("invalid sections");
        assert_eq!(
            err.fields(),
            vec!["skills.entities[1].items", "customSections[0].header"]
        );
    }

    #[test]
    fn negative_margins_are_rejected() {
        let mut profile = valid_profile();
        profile.page.margin.left = -0.5;
        let err = profile.validate().expect_err("negative margin");
        assert_eq!(err.fields(), vec!["page.margin.left"]);
        assert!(err.to_string().contains("`page.margin.left` must not be negative"));
    }
}

//! Forbidden-tag policy for parsed templates.

use std::fmt;

use thiserror::Error;

use super::tree::{ElementRef, NodeTree};

/// One element that failed the policy, captured with its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offender {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
}

impl Offender {
    fn capture(element: &ElementRef<'_>) -> Self {
        Self {
            tag: element.tag().to_string(),
            attributes: element
                .attributes()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl fmt::Display for Offender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.tag)?;
        for (index, (name, value)) in self.attributes.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}=\"{value}\"")?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("template contains forbidden `{tag}` element(s): {}", join_offenders(.offenders))]
pub struct ForbiddenTagError {
    pub tag: String,
    pub offenders: Vec<Offender>,
}

fn join_offenders(offenders: &[Offender]) -> String {
    offenders
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A denied tag, optionally admitted when an attribute carries an allowed value.
#[derive(Debug, Clone, Copy)]
pub struct DeniedTag {
    pub name: &'static str,
    pub exception: Option<AttributeException>,
}

#[derive(Debug, Clone, Copy)]
pub struct AttributeException {
    pub attribute: &'static str,
    pub allowed: &'static [&'static str],
}

impl AttributeException {
    fn admits(&self, element: &ElementRef<'_>) -> bool {
        element.attr(self.attribute).is_some_and(|value| {
            let value = value.trim();
            self.allowed
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(value))
        })
    }
}

pub const DEFAULT_DENIED_TAGS: &[DeniedTag] = &[
    DeniedTag {
        name: "script",
        exception: None,
    },
    DeniedTag {
        name: "iframe",
        exception: None,
    },
    DeniedTag {
        name: "link",
        exception: Some(AttributeException {
            attribute: "rel",
            allowed: &["stylesheet"],
        }),
    },
];

#[derive(Debug, Clone, Copy)]
pub struct TagPolicy {
    denied: &'static [DeniedTag],
}

impl Default for TagPolicy {
    fn default() -> Self {
        Self {
            denied: DEFAULT_DENIED_TAGS,
        }
    }
}

impl TagPolicy {
    pub fn new(denied: &'static [DeniedTag]) -> Self {
        Self { denied }
    }

    /// Check denied tags in declaration order. A tag without exceptions fails
    /// on its first occurrence; a tag with an exception collects every element
    /// the exception does not admit.
    pub fn check(&self, tree: &NodeTree) -> Result<(), ForbiddenTagError> {
        for denied in self.denied {
            let selection = tree.select(denied.name);

            let offenders: Vec<Offender> = match denied.exception {
                None => selection.first().map(|e| Offender::capture(&e)).into_iter().collect(),
                Some(exception) => selection
                    .iter()
                    .filter(|element| !exception.admits(element))
                    .map(|element| Offender::capture(&element))
                    .collect(),
            };

            if !offenders.is_empty() {
                return Err(ForbiddenTagError {
                    tag: denied.name.to_string(),
                    offenders,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(html: &str) -> Result<(), ForbiddenTagError> {
        let tree = NodeTree::parse(html).expect("parse");
        TagPolicy::default().check(&tree)
    }

    #[test]
    fn stylesheet_links_pass() {
        check(r#"<html><head><link rel="StyleSheet" href="a.css"></head><body></body></html>"#)
            .expect("stylesheet allowed");
    }

    #[test]
    fn script_and_iframe_fail_naming_the_tag() {
        let err = check("<html><head><script>alert(1)</script></head></html>")
            .expect_err("script denied");
        assert_eq!(err.tag, "script");

        let err = check(r#"<html><body><iframe src="x"></iframe></body></html>"#)
            .expect_err("iframe denied");
        assert_eq!(err.tag, "iframe");
        assert!(err.to_string().contains(r#"iframe(src="x")"#));
    }

    #[test]
    fn every_disallowed_link_is_reported_together() {
        let err = check(concat!(
            r#"<html><head><link rel="stylesheet" href="ok.css">"#,
            r#"<link rel="preload" href="a.js"><link href="b.css"></head></html>"#,
        ))
        .expect_err("links denied");

        assert_eq!(err.tag, "link");
        assert_eq!(err.offenders.len(), 2);
        assert_eq!(
            err.offenders[0].to_string(),
            r#"link(rel="preload", href="a.js")"#
        );
        assert_eq!(err.offenders[1].to_string(), r#"link(href="b.css")"#);
    }
}

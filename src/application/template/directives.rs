//! Handlebars substitution of profile data into the raw template text.

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError, html_escape,
};
use serde::Serialize;

use crate::domain::{
    profile::Profile,
    social::{self, SocialLink},
};

const DEFAULT_SEPARATOR: &str = ", ";

/// Data exposed to template directives: every profile field at the top
/// level, plus derived values.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveContext<'a> {
    #[serde(flatten)]
    profile: &'a Profile,
    social_links: Vec<SocialLink>,
    app_version: String,
}

impl<'a> DirectiveContext<'a> {
    pub fn new(profile: &'a Profile, app_version: &str) -> Self {
        Self {
            profile,
            social_links: social::classify_all(profile.socials()),
            app_version: app_version.to_string(),
        }
    }
}

/// Strict-mode handlebars registry: a reference to a field the profile does
/// not declare is an error rather than an empty string.
pub struct DirectiveEngine {
    registry: Handlebars<'static>,
}

impl Default for DirectiveEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectiveEngine {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_helper("join", Box::new(join_helper));
        Self { registry }
    }

    pub fn render(
        &self,
        template: &str,
        context: &DirectiveContext<'_>,
    ) -> Result<String, RenderError> {
        self.registry.render_template(template, context)
    }
}

/// `{{join list ", "}}` renders the string items of `list` separated by the
/// optional second argument.
fn join_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let separator = h
        .param(1)
        .and_then(|v| v.value().as_str())
        .unwrap_or(DEFAULT_SEPARATOR);

    let joined = h
        .param(0)
        .and_then(|v| v.value().as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .collect::<Vec<_>>()
                .join(separator)
        })
        .unwrap_or_default();

    out.write(&html_escape(&joined))?;
    Ok(())
}

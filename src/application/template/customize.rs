//! Customizer injection: the profile's own CSS, appended to the template head.

use thiserror::Error;
use tracing::warn;

use crate::domain::profile::closes_style_element;

use super::tree::NodeTree;

pub const CUSTOMIZER_MARKER: (&str, &str) = ("data-source", "civic-customizer");

/// Result of applying a customizer style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Customization {
    Applied,
    Skipped,
    MissingHead,
}

/// Style text that would close its element and leak markup into the page.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("customizer style must not contain a closing `</style` tag")]
pub struct UnsafeStyle;

/// Append the style block as the last child of `head`.
pub fn apply(tree: &mut NodeTree, style: Option<&str>) -> Result<Customization, UnsafeStyle> {
    let Some(style) = style else {
        return Ok(Customization::Skipped);
    };

    // Text inside <style> is serialized raw.
    if closes_style_element(style) {
        return Err(UnsafeStyle);
    }

    // The parser synthesizes <head> for any parsed document, so this only
    // triggers for trees edited after parsing.
    let Some(head) = tree.select("head").first().map(|head| head.id()) else {
        warn!(
            target = "application::template::customize",
            "template has no <head>; customizer style not applied"
        );
        return Ok(Customization::MissingHead);
    };

    tree.append_element(
        head,
        "style",
        &[("type", "text/css"), CUSTOMIZER_MARKER],
        Some(style),
    );
    Ok(Customization::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str =
        r#"<html><head><meta name="app-version" content="v1.0.0"></head><body></body></html>"#;

    #[test]
    fn appends_marked_style_to_head() {
        let mut tree = NodeTree::parse(DOCUMENT).expect("parse");
        assert_eq!(
            apply(&mut tree, Some("h1 { color: navy; }")),
            Ok(Customization::Applied)
        );

        let styles = tree.select("style").filter_attr("data-source", "civic-customizer");
        assert_eq!(styles.len(), 1);
        assert_eq!(
            styles.first().map(|s| s.text()).as_deref(),
            Some("h1 { color: navy; }")
        );
        let html = tree.to_html().expect("serialize");
        assert!(html.contains(
            r#"<style type="text/css" data-source="civic-customizer">h1 { color: navy; }</style></head>"#
        ));
    }

    #[test]
    fn no_style_leaves_tree_untouched() {
        let mut tree = NodeTree::parse(DOCUMENT).expect("parse");
        let before = tree.to_html().expect("serialize");
        assert_eq!(apply(&mut tree, None), Ok(Customization::Skipped));
        assert_eq!(before, tree.to_html().expect("serialize"));
    }

    #[test]
    fn missing_head_is_reported_not_fatal() {
        let mut tree = NodeTree::parse(DOCUMENT).expect("parse");
        let head = tree.select("head").first().map(|h| h.id()).expect("head");
        tree.detach(head);

        assert_eq!(
            apply(&mut tree, Some("body { margin: 0; }")),
            Ok(Customization::MissingHead)
        );
        assert!(tree.select("style").is_empty());
    }

    #[test]
    fn style_closing_its_element_is_refused() {
        let mut tree = NodeTree::parse(DOCUMENT).expect("parse");
        let before = tree.to_html().expect("serialize");

        assert_eq!(
            apply(
                &mut tree,
                Some("h1{}</Style><script>alert(1)</script><style>")
            ),
            Err(UnsafeStyle)
        );
        assert_eq!(before, tree.to_html().expect("serialize"));
    }
}

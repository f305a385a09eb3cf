//! Classification of contact links by social platform.
//!
//! Templates render contact links with platform icons and a short handle, so
//! every URL in `bio.contact.socials` is mapped to a [`Platform`] and a display
//! username. Links are classified on every render and never stored.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:http://|https://)?(?:www\.)?([\w-]+)\.\w+(.*)$")
        .expect("domain pattern is valid")
});
static LEADING_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/([\w.-]+)").expect("segment pattern is valid"));
static LINKEDIN_PROFILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/([\w-]+/[\w.-]+)").expect("linkedin pattern is valid"));
static REDDIT_USER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/user/([\w.-]+)").expect("reddit pattern is valid"));
static STACKOVERFLOW_USER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/users/\d+/([\w.-]+)").expect("stackoverflow pattern is valid"));
static AT_HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/@([\w.-]+)").expect("handle pattern is valid"));

/// Platforms with a dedicated username extraction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Facebook,
    Github,
    Gitlab,
    Linkedin,
    Mastodon,
    Reddit,
    Stackoverflow,
    XTwitter,
    Youtube,
    Other,
}

impl Platform {
    /// Map a second-level domain label to a platform, case-insensitively.
    pub fn from_domain_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "facebook" => Self::Facebook,
            "github" => Self::Github,
            "gitlab" => Self::Gitlab,
            "linkedin" => Self::Linkedin,
            "mastodon" => Self::Mastodon,
            "reddit" => Self::Reddit,
            "stackoverflow" => Self::Stackoverflow,
            "x" | "twitter" | "x-twitter" => Self::XTwitter,
            "youtube" => Self::Youtube,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Github => "github",
            Self::Gitlab => "gitlab",
            Self::Linkedin => "linkedin",
            Self::Mastodon => "mastodon",
            Self::Reddit => "reddit",
            Self::Stackoverflow => "stackoverflow",
            Self::XTwitter => "x-twitter",
            Self::Youtube => "youtube",
            Self::Other => "other",
        }
    }

    fn username_pattern(&self) -> Option<&'static Regex> {
        match self {
            Self::Facebook | Self::Github | Self::Gitlab | Self::XTwitter => {
                Some(&*LEADING_SEGMENT)
            }
            Self::Linkedin => Some(&*LINKEDIN_PROFILE),
            Self::Reddit => Some(&*REDDIT_USER),
            Self::Stackoverflow => Some(&*STACKOVERFLOW_USER),
            Self::Mastodon | Self::Youtube => Some(&*AT_HANDLE),
            Self::Other => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contact link annotated with its platform and display username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocialLink {
    pub platform: Platform,
    pub link: String,
    pub username: String,
}

/// Classify a URL. Unknown domains, or paths the platform rule does not
/// recognise, fall back to the full URL as the username.
pub fn classify(link: &str) -> SocialLink {
    let fallback = |platform| SocialLink {
        platform,
        link: link.to_string(),
        username: link.to_string(),
    };

    let Some(captures) = DOMAIN_PATTERN.captures(link) else {
        return fallback(Platform::Other);
    };

    let platform = captures
        .get(1)
        .map(|label| Platform::from_domain_label(label.as_str()))
        .unwrap_or(Platform::Other);
    let remainder = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

    let username = platform
        .username_pattern()
        .and_then(|pattern| pattern.captures(remainder))
        .and_then(|found| found.get(1))
        .map(|m| m.as_str().to_string());

    match username {
        Some(username) => SocialLink {
            platform,
            link: link.to_string(),
            username,
        },
        None => fallback(platform),
    }
}

/// Classify every link, preserving input order.
pub fn classify_all(links: &[String]) -> Vec<SocialLink> {
    links.iter().map(|link| classify(link)).collect()
}

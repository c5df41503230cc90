use std::fmt;

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::dom::{Document, Selector};

/// Where the readable part of a page usually lives, most specific first
pub const MAIN_CONTENT_SELECTORS: [&str; 9] = [
    "article",
    "main",
    r#"[role="main"]"#,
    ".content",
    ".post-content",
    ".entry-content",
    ".article-content",
    "#content",
    ".main-content",
];

/// Heading count and main-content text volume of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStats {
    pub headings_count: usize,
    pub text_length: usize,
}

/// Why the overlay is not shown. None of these is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InactiveReason {
    Disabled,
    SiteExcluded { pattern: String },
    TooFewHeadings { found: usize, required: usize },
    NotEnoughText { found: usize, required: usize },
}

impl fmt::Display for InactiveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InactiveReason::Disabled => write!(f, "disabled"),
            InactiveReason::SiteExcluded { pattern } => {
                write!(f, "site excluded (matches {})", pattern)
            }
            InactiveReason::TooFewHeadings { found, required } => {
                write!(f, "too few headings ({} < {})", found, required)
            }
            InactiveReason::NotEnoughText { found, required } => {
                write!(f, "not enough content ({} < {} characters)", found, required)
            }
        }
    }
}

/// Outcome of the activation heuristics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Active(ContentStats),
    Inactive {
        reason: InactiveReason,
        stats: Option<ContentStats>,
    },
}

impl GateDecision {
    pub fn is_active(&self) -> bool {
        matches!(self, GateDecision::Active(_))
    }

    pub fn stats(&self) -> Option<ContentStats> {
        match self {
            GateDecision::Active(stats) => Some(*stats),
            GateDecision::Inactive { stats, .. } => *stats,
        }
    }

    pub fn reason(&self) -> Option<&InactiveReason> {
        match self {
            GateDecision::Active(_) => None,
            GateDecision::Inactive { reason, .. } => Some(reason),
        }
    }
}

/// Translate an exclusion pattern into a regex.
///
/// Regex metacharacters are escaped and each `*` becomes `.*`. The result is
/// not anchored: it is searched anywhere in the URL, so `/admin` also
/// excludes `https://example.com/?next=/admin` and `https://example.com/administer`.
pub fn pattern_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    Regex::new(&escaped)
}

/// First exclusion pattern matching `url`, if any
pub fn matching_exclusion<'a>(url: &str, patterns: &'a [String]) -> Option<&'a str> {
    patterns
        .iter()
        .find(|pattern| match pattern_to_regex(pattern) {
            Ok(regex) => regex.is_match(url),
            Err(e) => {
                warn!("Invalid exclusion pattern '{}': {}", pattern, e);
                false
            }
        })
        .map(String::as_str)
}

/// Site-level gate, evaluated before the document is scanned
pub fn check_site(url: &str, settings: &Settings) -> Option<InactiveReason> {
    if !settings.enabled {
        return Some(InactiveReason::Disabled);
    }

    matching_exclusion(url, &settings.excluded_sites).map(|pattern| {
        debug!("{} excluded by pattern {}", url, pattern);
        InactiveReason::SiteExcluded {
            pattern: pattern.to_string(),
        }
    })
}

/// Trimmed text length of the page's main content container.
///
/// Only the first matching container is measured so navigation and other
/// page chrome are not counted; `body` is the fallback.
pub fn main_content_text_length<D: Document + ?Sized>(doc: &D) -> usize {
    let container = MAIN_CONTENT_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| doc.query_selector(&selector))
        .or_else(|| doc.body());

    container
        .and_then(|node| doc.text_content(node))
        .map(|text| text.trim().chars().count())
        .unwrap_or(0)
}

/// Content gate: both thresholds must be met
pub fn evaluate_content(stats: ContentStats, settings: &Settings) -> GateDecision {
    let reason = if stats.headings_count < settings.min_headings {
        Some(InactiveReason::TooFewHeadings {
            found: stats.headings_count,
            required: settings.min_headings,
        })
    } else if stats.text_length < settings.min_text_length {
        Some(InactiveReason::NotEnoughText {
            found: stats.text_length,
            required: settings.min_text_length,
        })
    } else {
        None
    };

    match reason {
        Some(reason) => GateDecision::Inactive {
            reason,
            stats: Some(stats),
        },
        None => GateDecision::Active(stats),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{PageSnapshot, Size, SnapshotDocument, SnapshotNode};

    fn excluded(url: &str) -> bool {
        check_site(url, &Settings::default()).is_some()
    }

    #[test]
    fn test_default_exclusions() {
        assert!(excluded("https://example.com/wp-admin/edit"));
        assert!(excluded("chrome://extensions"));
        assert!(excluded("about:blank"));
        assert!(excluded("https://example.com/login?next=/"));
        assert!(!excluded("https://example.com/blog/post"));
    }

    #[test]
    fn test_patterns_are_substring_matches() {
        let patterns = vec!["/admin".to_string()];
        assert!(matching_exclusion("https://example.com/admin", &patterns).is_some());
        // not anchored to a path segment
        assert!(matching_exclusion("https://example.com/administrator-guide", &patterns).is_some());
        assert!(matching_exclusion("https://example.com/?return=/admin", &patterns).is_some());
    }

    #[test]
    fn test_wildcard_and_literal_dots() {
        let patterns = vec!["*.internal.example.com*".to_string()];
        assert!(matching_exclusion("https://wiki.internal.example.com/page", &patterns).is_some());
        assert!(matching_exclusion("https://wikiXinternalXexampleXcom/", &patterns).is_none());
    }

    #[test]
    fn test_disabled_wins() {
        let settings = Settings {
            enabled: false,
            ..Settings::default()
        };
        assert_eq!(check_site("https://example.com/", &settings), Some(InactiveReason::Disabled));
    }

    #[test]
    fn test_content_thresholds() {
        let settings = Settings {
            min_headings: 3,
            min_text_length: 1000,
            ..Settings::default()
        };

        let ok = evaluate_content(ContentStats { headings_count: 4, text_length: 1500 }, &settings);
        assert!(ok.is_active());

        let few = evaluate_content(ContentStats { headings_count: 2, text_length: 1500 }, &settings);
        assert!(matches!(few.reason(), Some(InactiveReason::TooFewHeadings { found: 2, required: 3 })));

        let short = evaluate_content(ContentStats { headings_count: 4, text_length: 999 }, &settings);
        assert!(matches!(short.reason(), Some(InactiveReason::NotEnoughText { .. })));
        assert_eq!(short.stats().unwrap().text_length, 999);
    }

    #[test]
    fn test_main_content_preferred_over_body() {
        let body = SnapshotNode::element("body")
            .with_child(SnapshotNode::element("nav").with_text(&"menu ".repeat(400)))
            .with_child(SnapshotNode::element("div").with_attr("class", "post-content").with_text("  short body  "));

        let doc = SnapshotDocument::new(PageSnapshot {
            url: "https://example.com/".to_string(),
            viewport: Size::new(1280.0, 800.0),
            scroll_top: 0.0,
            overlay_size: None,
            root: SnapshotNode::element("html").with_child(body),
        });

        assert_eq!(main_content_text_length(&doc), "short body".len());
    }

    #[test]
    fn test_body_fallback() {
        let doc = SnapshotDocument::new(PageSnapshot {
            url: "https://example.com/".to_string(),
            viewport: Size::new(1280.0, 800.0),
            scroll_top: 0.0,
            overlay_size: None,
            root: SnapshotNode::element("html")
                .with_child(SnapshotNode::element("body").with_text(" hello world ")),
        });

        assert_eq!(main_content_text_length(&doc), 11);
    }
}

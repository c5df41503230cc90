use std::collections::HashSet;

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dom::{Document, NodeId};

lazy_static! {
    static ref LEVEL_REGEX: Regex = Regex::new(r"^[hH]([1-6])$").unwrap();
}

/// Prefix of identifiers synthesized for headings without one
pub const ID_PREFIX: &str = "toc-heading-";

/// Shortest heading text worth listing, in characters
const MIN_TEXT_CHARS: usize = 2;
/// Longest heading text worth listing; longer "headings" are usually layout abuse
const MAX_TEXT_CHARS: usize = 200;

/// A single qualifying heading of the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Non-owning handle into the live document
    pub node: NodeId,
    pub text: String,
    /// 1 for h1 through 6 for h6
    pub level: u8,
    /// Anchor identifier, unique across the extracted set
    pub id: String,
    /// Position in the extracted set (document order)
    pub index: usize,
}

/// Parse a heading level from its tag name
pub fn heading_level(tag: &str) -> Option<u8> {
    LEVEL_REGEX
        .captures(tag)
        .and_then(|cap| cap[1].parse().ok())
}

/// Collect the visible headings of a document, in document order.
///
/// Headings without an `id` get `toc-heading-<n>` written back onto the
/// element, where `n` is the element's position among all candidate
/// elements, so the identifier is the same on every extraction of an
/// unchanged page. A synthesized id never reuses one already present
/// anywhere in the document, including on later headings.
pub fn extract_headings<D: Document + ?Sized>(doc: &mut D, supported: &[String]) -> Vec<Heading> {
    let candidates = doc.elements_by_tags(supported);
    let mut headings = Vec::new();
    let mut seen_ids: HashSet<String> = candidates
        .iter()
        .filter_map(|node| doc.element_id(*node))
        .collect();

    for (position, node) in candidates.into_iter().enumerate() {
        let Some(text) = visible_heading_text(doc, node) else {
            continue;
        };

        let Some(level) = doc.tag_name(node).as_deref().and_then(heading_level) else {
            continue;
        };

        let id = match doc.element_id(node) {
            Some(existing) => existing,
            None => {
                let id = unique_id(format!("{}{}", ID_PREFIX, position), |candidate| {
                    seen_ids.contains(candidate) || doc.element_by_id(candidate).is_some()
                });
                if let Err(e) = doc.set_element_id(node, &id) {
                    warn!("Could not assign id {} to heading: {}", id, e);
                    continue;
                }
                id
            }
        };

        seen_ids.insert(id.clone());
        headings.push(Heading {
            node,
            text,
            level,
            id,
            index: headings.len(),
        });
    }

    debug!("Extracted {} headings", headings.len());
    headings
}

/// Trimmed text of a heading that passes the visibility filter
fn visible_heading_text<D: Document + ?Sized>(doc: &D, node: NodeId) -> Option<String> {
    let style = doc.computed_style(node)?;
    if style.is_hidden() {
        return None;
    }

    let text = doc.text_content(node)?.trim().to_string();
    let chars = text.chars().count();
    if !(MIN_TEXT_CHARS..=MAX_TEXT_CHARS).contains(&chars) {
        return None;
    }

    let rect = doc.bounding_rect(node)?;
    if rect.is_empty() {
        return None;
    }

    Some(text)
}

/// Suffix a synthesized id until it is no longer taken
fn unique_id<F: Fn(&str) -> bool>(base: String, taken: F) -> String {
    if !taken(&base) {
        return base;
    }

    (1..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ComputedStyle, PageSnapshot, Size, SnapshotDocument, SnapshotNode};

    fn heading(tag: &str, text: &str, y: f64) -> SnapshotNode {
        SnapshotNode::element(tag).with_text(text).with_rect(40.0, y, 600.0, 32.0)
    }

    fn doc_with(children: Vec<SnapshotNode>) -> SnapshotDocument {
        SnapshotDocument::new(PageSnapshot {
            url: "https://example.com/".to_string(),
            viewport: Size::new(1280.0, 800.0),
            scroll_top: 0.0,
            overlay_size: None,
            root: SnapshotNode::element("html")
                .with_child(SnapshotNode::element("body").with_children(children)),
        })
    }

    fn all_tags() -> Vec<String> {
        crate::config::HEADING_TAGS.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(heading_level("h1"), Some(1));
        assert_eq!(heading_level("H6"), Some(6));
        assert_eq!(heading_level("h7"), None);
        assert_eq!(heading_level("header"), None);
    }

    #[test]
    fn test_extract_in_document_order() {
        let mut doc = doc_with(vec![
            heading("h1", "Intro", 10.0).with_attr("id", "intro"),
            heading("h2", "Details", 400.0),
            heading("h2", "More", 800.0),
            heading("h3", "Edge", 1200.0),
        ]);

        let headings = extract_headings(&mut doc, &all_tags());
        let levels: Vec<u8> = headings.iter().map(|h| h.level).collect();
        let texts: Vec<&str> = headings.iter().map(|h| h.text.as_str()).collect();

        assert_eq!(levels, vec![1, 2, 2, 3]);
        assert_eq!(texts, vec!["Intro", "Details", "More", "Edge"]);
        assert_eq!(headings[0].id, "intro");
        assert_eq!(headings[3].index, 3);
    }

    #[test]
    fn test_synthesized_ids_are_written_back_and_stable() {
        let mut doc = doc_with(vec![
            heading("h2", "First", 10.0),
            heading("h2", "Second", 300.0),
        ]);

        let first = extract_headings(&mut doc, &all_tags());
        assert_eq!(first[0].id, "toc-heading-0");
        assert_eq!(first[1].id, "toc-heading-1");

        for h in &first {
            assert_eq!(doc.element_by_id(&h.id), Some(h.node));
        }

        let second = extract_headings(&mut doc, &all_tags());
        assert_eq!(first, second);
    }

    #[test]
    fn test_visibility_filter() {
        let hidden = ComputedStyle {
            display: "none".to_string(),
            ..ComputedStyle::default()
        };
        let invisible = ComputedStyle {
            visibility: "hidden".to_string(),
            ..ComputedStyle::default()
        };

        let mut doc = doc_with(vec![
            heading("h2", "Hidden", 10.0).with_style(hidden),
            heading("h2", "Invisible", 50.0).with_style(invisible),
            heading("h2", " x ", 90.0),
            heading("h2", &"long ".repeat(60), 130.0),
            SnapshotNode::element("h2").with_text("Collapsed").with_rect(0.0, 170.0, 600.0, 0.0),
            heading("h2", "Kept", 210.0),
        ]);

        let headings = extract_headings(&mut doc, &all_tags());
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].text, "Kept");
        // positional index counts rejected candidates too
        assert_eq!(headings[0].id, "toc-heading-5");
    }

    #[test]
    fn test_supported_subset_only() {
        let mut doc = doc_with(vec![
            heading("h1", "Title", 10.0),
            heading("h2", "Section", 100.0),
            heading("h4", "Minor", 200.0),
        ]);

        let headings = extract_headings(&mut doc, &["h2".to_string()]);
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].text, "Section");
    }

    #[test]
    fn test_synthesized_id_avoids_collision() {
        let mut doc = doc_with(vec![
            heading("h2", "Squatter", 10.0).with_attr("id", "toc-heading-1"),
            heading("h2", "Victim", 100.0),
        ]);

        let headings = extract_headings(&mut doc, &all_tags());
        assert_eq!(headings[0].id, "toc-heading-1");
        assert_eq!(headings[1].id, "toc-heading-1-1");
    }

    #[test]
    fn test_synthesized_id_skips_later_explicit_id() {
        let mut doc = doc_with(vec![
            heading("h2", "First", 10.0),
            heading("h2", "Second", 100.0).with_attr("id", "toc-heading-0"),
            heading("h2", "Third", 200.0),
        ]);

        let headings = extract_headings(&mut doc, &all_tags());
        let ids: Vec<&str> = headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["toc-heading-0-1", "toc-heading-0", "toc-heading-2"]);
        assert_eq!(doc.element_by_id("toc-heading-0"), Some(headings[1].node));
        assert_eq!(doc.element_by_id("toc-heading-0-1"), Some(headings[0].node));

        // Stable on the next pass
        let again = extract_headings(&mut doc, &all_tags());
        assert_eq!(again, headings);
    }

    #[test]
    fn test_synthesized_id_skips_non_heading_element() {
        let mut doc = doc_with(vec![
            SnapshotNode::element("div").with_attr("id", "toc-heading-0"),
            heading("h2", "Only", 100.0),
        ]);

        let headings = extract_headings(&mut doc, &all_tags());
        assert_eq!(headings[0].id, "toc-heading-0-1");
    }
}

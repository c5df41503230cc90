//! Page fixtures shared by unit tests.

use crate::dom::{PageSnapshot, Size, SnapshotDocument, SnapshotNode};

/// Four headings with levels 1,2,2,3 spread down a 1500-character article
pub fn example_page(url: &str) -> SnapshotDocument {
    let filler = "x".repeat(1500 - "IntroDetailsMoreEdge".len());
    let article = SnapshotNode::element("article")
        .with_child(SnapshotNode::element("h1").with_text("Intro").with_rect(40.0, 100.0, 700.0, 40.0))
        .with_child(SnapshotNode::element("h2").with_text("Details").with_rect(40.0, 900.0, 700.0, 32.0))
        .with_child(SnapshotNode::element("p").with_text(&filler))
        .with_child(SnapshotNode::element("h2").with_text("More").with_rect(40.0, 1800.0, 700.0, 32.0))
        .with_child(SnapshotNode::element("h3").with_text("Edge").with_rect(40.0, 2600.0, 700.0, 28.0));

    SnapshotDocument::new(PageSnapshot {
        url: url.to_string(),
        viewport: Size::new(1280.0, 800.0),
        scroll_top: 0.0,
        overlay_size: None,
        root: SnapshotNode::element("html")
            .with_child(SnapshotNode::element("body").with_child(article)),
    })
}

/// Settings with the given thresholds, defaults otherwise
pub fn thresholds(min_headings: usize, min_text_length: usize) -> crate::config::Settings {
    crate::config::Settings {
        min_headings,
        min_text_length,
        ..Default::default()
    }
}

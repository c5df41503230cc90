use crate::dom::{MutationRecord, NodeSummary};

/// Whether a batch of document changes can alter the heading set: some
/// inserted or removed subtree is a supported heading or contains one.
pub fn is_relevant(record: &MutationRecord, supported: &[String]) -> bool {
    record
        .added
        .iter()
        .chain(record.removed.iter())
        .any(|node| touches_headings(node, supported))
}

fn touches_headings(node: &NodeSummary, supported: &[String]) -> bool {
    let is_supported = |tag: &str| supported.iter().any(|s| s.eq_ignore_ascii_case(tag));
    is_supported(&node.tag) || node.descendant_tags.iter().any(|t| is_supported(t))
}

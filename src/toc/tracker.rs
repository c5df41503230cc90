use crate::dom::Document;
use crate::toc::extractor::Heading;

/// Fraction of the viewport height below the top edge where a heading counts as "being read"
const ACTIVE_THRESHOLD: f64 = 0.3;

/// Maps the scroll position to the heading currently being read
#[derive(Debug, Clone, Default)]
pub struct ScrollTracker {
    active_index: usize,
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Force the active entry, e.g. after a click on the list
    pub fn set_active(&mut self, index: usize) {
        self.active_index = index;
    }

    /// Recompute from the current layout; returns the new index when it changed
    pub fn update<D: Document + ?Sized>(&mut self, doc: &D, headings: &[Heading]) -> Option<usize> {
        let scroll_top = doc.scroll_top();
        let tops: Vec<f64> = headings
            .iter()
            .map(|h| {
                doc.bounding_rect(h.node)
                    .map_or(f64::INFINITY, |rect| rect.top() + scroll_top)
            })
            .collect();

        let next = active_index_for(&tops, scroll_top, doc.viewport().height);
        if next == self.active_index {
            return None;
        }

        self.active_index = next;
        Some(next)
    }
}

/// Index of the last heading whose absolute top is at or above
/// `scroll_top + 30% of the viewport`; 0 when none is.
///
/// Headings that no longer resolve should carry `f64::INFINITY`.
pub fn active_index_for(absolute_tops: &[f64], scroll_top: f64, viewport_height: f64) -> usize {
    let line = scroll_top + viewport_height * ACTIVE_THRESHOLD;
    absolute_tops
        .iter()
        .rposition(|top| *top <= line)
        .unwrap_or(0)
}

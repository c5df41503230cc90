use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::dom::{Document, Point, ScrollBehavior};
use crate::toc::extractor::{self, Heading};
use crate::toc::gate::{self, ContentStats, GateDecision};
use crate::toc::overlay::OverlayView;
use crate::toc::tracker::ScrollTracker;
use crate::utils::error::{TocError, TocResult};

/// Status report, as answered to `GET_TOC_STATUS`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocStatus {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ContentStats>,
}

/// The table of contents of one page.
///
/// Owns the heading set, the overlay and the scroll tracker. Every
/// rebuild tears the previous overlay down first and starts from a
/// fresh extraction; nothing is diffed.
pub struct SmartToc {
    settings: Settings,
    headings: Vec<Heading>,
    overlay: Option<OverlayView>,
    tracker: ScrollTracker,
    decision: Option<GateDecision>,
}

impl SmartToc {
    pub fn new(settings: Settings) -> Self {
        SmartToc {
            settings,
            headings: Vec::new(),
            overlay: None,
            tracker: ScrollTracker::new(),
            decision: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings; takes effect on the next rebuild
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    pub fn overlay(&self) -> Option<&OverlayView> {
        self.overlay.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn active_index(&self) -> usize {
        self.tracker.active_index()
    }

    pub fn decision(&self) -> Option<&GateDecision> {
        self.decision.as_ref()
    }

    /// Run the site gate, content analysis and, when warranted, build the overlay.
    ///
    /// An excluded site is rejected from its URL alone, before the document
    /// is scanned. A build failure leaves no overlay behind.
    pub fn rebuild<D: Document + ?Sized>(&mut self, doc: &mut D) -> TocResult<&GateDecision> {
        self.teardown(doc);

        let url = doc.url();
        if let Some(reason) = gate::check_site(&url, &self.settings) {
            info!("Table of contents inactive on {}: {}", url, reason);
            return Ok(self.decision.insert(GateDecision::Inactive { reason, stats: None }));
        }

        let headings = extractor::extract_headings(doc, &self.settings.supported_headings);
        let stats = ContentStats {
            headings_count: headings.len(),
            text_length: gate::main_content_text_length(doc),
        };

        let decision = gate::evaluate_content(stats, &self.settings);
        if let Some(reason) = decision.reason() {
            info!("Table of contents inactive on {}: {}", url, reason);
            return Ok(self.decision.insert(decision));
        }

        let overlay = OverlayView::build(doc, &headings, &self.settings)?;
        self.headings = headings;
        self.overlay = Some(overlay);
        if let Err(e) = self.update_active(doc) {
            self.teardown(doc);
            return Err(e);
        }

        info!(
            "Table of contents active with {} headings ({} characters)",
            stats.headings_count, stats.text_length
        );
        Ok(self.decision.insert(decision))
    }

    /// Remove the overlay and forget the heading set
    pub fn teardown<D: Document + ?Sized>(&mut self, doc: &mut D) {
        if let Some(overlay) = self.overlay.take() {
            overlay.destroy(doc);
        }
        self.headings.clear();
        self.tracker = ScrollTracker::new();
    }

    pub fn status(&self) -> TocStatus {
        match &self.decision {
            Some(decision) => TocStatus {
                active: decision.is_active() && self.overlay.is_some(),
                reason: decision.reason().map(|r| r.to_string()),
                stats: decision.stats(),
            },
            None => TocStatus {
                active: false,
                reason: Some("not analyzed".to_string()),
                stats: None,
            },
        }
    }

    /// Recompute the active heading from the scroll position
    pub fn update_active<D: Document + ?Sized>(&mut self, doc: &mut D) -> TocResult<()> {
        let Some(overlay) = self.overlay.as_mut() else {
            return Ok(());
        };

        if let Some(index) = self.tracker.update(doc, &self.headings) {
            debug!("Active heading is now {}", index);
            overlay.highlight(doc, index)?;
        }
        Ok(())
    }

    /// A list entry was clicked: scroll its heading to the top and mark it active
    pub fn select_entry<D: Document + ?Sized>(&mut self, doc: &mut D, index: usize) -> TocResult<()> {
        let Some(overlay) = self.overlay.as_mut() else {
            return Ok(());
        };

        let heading = self
            .headings
            .get(index)
            .ok_or_else(|| TocError::Document(format!("No heading at index {}", index)))?;

        doc.scroll_into_view(heading.node, ScrollBehavior::Smooth)?;

        self.tracker.set_active(index);
        overlay.highlight(doc, index)
    }

    pub fn toggle_collapse<D: Document + ?Sized>(&mut self, doc: &mut D) -> TocResult<Option<bool>> {
        match self.overlay.as_mut() {
            Some(overlay) => overlay.toggle_collapse(doc, &self.headings).map(Some),
            None => Ok(None),
        }
    }

    /// Viewport changed size: move the overlay without re-extracting headings
    pub fn reposition<D: Document + ?Sized>(&mut self, doc: &mut D) -> TocResult<()> {
        match self.overlay.as_mut() {
            Some(overlay) => overlay.reposition(doc),
            None => Ok(()),
        }
    }

    pub fn begin_drag<D: Document + ?Sized>(&mut self, doc: &mut D, pointer: Point) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.begin_drag(doc, pointer);
        }
    }

    pub fn drag_to<D: Document + ?Sized>(&mut self, doc: &mut D, pointer: Point) -> TocResult<()> {
        match self.overlay.as_mut() {
            Some(overlay) => overlay.drag_to(doc, pointer),
            None => Ok(()),
        }
    }

    /// End a drag; returns the position to persist after a completed release
    pub fn end_drag(&mut self, completed: bool) -> Option<Point> {
        self.overlay.as_mut()?.end_drag(completed)
    }
}

use log::debug;

use crate::config::{PositionMode, Settings, Theme};
use crate::dom::{Document, Point, RenderedOverlay, Size};
use crate::toc::drag::DragSession;
use crate::toc::extractor::Heading;
use crate::toc::layout::{self, Placement};
use crate::utils::error::TocResult;

/// Element id of the overlay container
pub const OVERLAY_ID: &str = "smart-toc";

const TITLE: &str = "Table of Contents";

/// Per-overlay UI state; recreated on every rebuild
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    pub position: Point,
    pub is_collapsed: bool,
    pub is_dragging: bool,
    pub active_index: usize,
}

/// Render the overlay markup for a heading set.
///
/// Heading text and ids are page-authored, so both are escaped.
pub fn render_overlay(headings: &[Heading], state: &OverlayState, theme: Theme) -> RenderedOverlay {
    let mut classes = format!("smart-toc smart-toc--{}", theme);
    if state.is_collapsed {
        classes.push_str(" smart-toc--collapsed");
    }

    let mut html = format!(
        "<div id=\"{}\" class=\"{}\" role=\"navigation\" aria-label=\"{}\">\n",
        OVERLAY_ID, classes, TITLE
    );
    html.push_str(&format!(
        "<div class=\"smart-toc__header\" data-drag-handle=\"true\">\
         <span class=\"smart-toc__title\">{}</span>\
         <button class=\"smart-toc__toggle\" aria-expanded=\"{}\">{}</button></div>\n",
        TITLE,
        !state.is_collapsed,
        if state.is_collapsed { "+" } else { "\u{2212}" }
    ));

    if state.is_collapsed {
        html.push_str("<ul class=\"smart-toc__list\" hidden>\n");
    } else {
        html.push_str("<ul class=\"smart-toc__list\">\n");
    }

    for heading in headings {
        html.push_str(&render_entry(heading, heading.index == state.active_index));
    }

    html.push_str("</ul>\n</div>");

    RenderedOverlay {
        html,
        entries: headings.len(),
        collapsed: state.is_collapsed,
        active_entry: (!headings.is_empty()).then_some(state.active_index),
    }
}

fn render_entry(heading: &Heading, active: bool) -> String {
    let active_class = if active { " smart-toc__item--active" } else { "" };
    format!(
        "<li class=\"smart-toc__item smart-toc__item--level-{}{}\" data-index=\"{}\">\
         <a href=\"#{}\">{}</a></li>\n",
        heading.level,
        active_class,
        heading.index,
        html_escape::encode_double_quoted_attribute(&heading.id),
        html_escape::encode_text(&heading.text)
    )
}

/// The mounted overlay: measured size, placement and interaction state
pub struct OverlayView {
    state: OverlayState,
    size: Size,
    placement: Placement,
    theme: Theme,
    position_mode: PositionMode,
    drag: Option<DragSession>,
}

impl OverlayView {
    /// Render, mount and place a fresh overlay.
    ///
    /// Any previously mounted overlay is replaced by the host.
    pub fn build<D: Document + ?Sized>(
        doc: &mut D,
        headings: &[Heading],
        settings: &Settings,
    ) -> TocResult<Self> {
        let mut state = OverlayState {
            position: Point::default(),
            is_collapsed: settings.auto_collapse,
            is_dragging: false,
            active_index: 0,
        };

        let rendered = render_overlay(headings, &state, settings.theme);
        let size = doc.mount_overlay(&rendered)?;

        let obstacles = layout::collect_obstacles(doc);
        let placement = layout::compute_placement(size, doc.viewport(), &obstacles, settings.position);
        doc.place_overlay(placement.position, placement.floating)?;
        state.position = placement.position;

        debug!("Overlay built with {} entries at {:?}", headings.len(), placement.position);

        Ok(OverlayView {
            state,
            size,
            placement,
            theme: settings.theme,
            position_mode: settings.position,
            drag: None,
        })
    }

    /// Detach the overlay; an in-flight drag is released without committing
    pub fn destroy<D: Document + ?Sized>(mut self, doc: &mut D) {
        self.drag.take();
        doc.unmount_overlay();
        debug!("Overlay destroyed");
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Flip between collapsed and expanded; returns the new collapsed flag
    pub fn toggle_collapse<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        headings: &[Heading],
    ) -> TocResult<bool> {
        self.state.is_collapsed = !self.state.is_collapsed;

        let rendered = render_overlay(headings, &self.state, self.theme);
        self.size = doc.mount_overlay(&rendered)?;
        doc.place_overlay(self.state.position, self.placement.floating)?;

        Ok(self.state.is_collapsed)
    }

    /// Move the highlight to another entry
    pub fn highlight<D: Document + ?Sized>(&mut self, doc: &mut D, index: usize) -> TocResult<()> {
        self.state.active_index = index;
        doc.highlight_entry(index)
    }

    /// Recompute the placement for the current viewport, keeping the heading list
    pub fn reposition<D: Document + ?Sized>(&mut self, doc: &mut D) -> TocResult<()> {
        if self.drag.is_some() {
            return Ok(());
        }

        let obstacles = layout::collect_obstacles(doc);
        self.placement =
            layout::compute_placement(self.size, doc.viewport(), &obstacles, self.position_mode);
        self.state.position = self.placement.position;
        doc.place_overlay(self.placement.position, self.placement.floating)
    }

    /// Pointer went down on the header: start tracking the pointer
    pub fn begin_drag<D: Document + ?Sized>(&mut self, doc: &mut D, pointer: Point) {
        // a stale session (missed release) is dropped before a new one is acquired
        self.drag.take();
        self.drag = Some(DragSession::start(doc, pointer, self.state.position));
        self.state.is_dragging = true;
    }

    /// Pointer moved while dragging
    pub fn drag_to<D: Document + ?Sized>(&mut self, doc: &mut D, pointer: Point) -> TocResult<()> {
        let Some(session) = &self.drag else {
            return Ok(());
        };

        let target = session.target_for(pointer);
        self.state.position = layout::clamp_to_viewport(target, self.size, doc.viewport());
        doc.place_overlay(self.state.position, self.placement.floating)
    }

    /// Pointer released or lost. Listeners are removed either way; only a
    /// completed release yields the position to persist.
    pub fn end_drag(&mut self, completed: bool) -> Option<Point> {
        let session = self.drag.take()?;
        self.state.is_dragging = false;
        drop(session);

        completed.then_some(self.state.position)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}

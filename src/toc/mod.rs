//! Heading detection, activation heuristics, placement and scroll tracking
//! for the table of contents overlay.

pub mod drag;
pub mod engine;
pub mod extractor;
pub mod gate;
pub mod layout;
pub mod overlay;
pub mod tracker;

pub use engine::{SmartToc, TocStatus};
pub use extractor::{extract_headings, Heading};
pub use gate::{check_site, ContentStats, GateDecision, InactiveReason};
pub use layout::{compute_placement, Placement, Side};
pub use overlay::{OverlayState, OverlayView};
pub use tracker::ScrollTracker;

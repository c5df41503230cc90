pub mod selector;
pub mod snapshot;

use serde::{Deserialize, Serialize};

use crate::utils::error::TocResult;

pub use selector::Selector;
pub use snapshot::{SnapshotDocument, SnapshotNode, PageSnapshot};

/// Handle to an element in the host document.
///
/// Handles are non-owning: once the host removes the element, every
/// lookup through the handle reports the element as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// A point in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a box or of the viewport
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Bounding box of an element, as reported by the host layout
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Same box shifted vertically
    pub fn offset_y(&self, dy: f64) -> Self {
        Self { y: self.y + dy, ..*self }
    }
}

/// The subset of computed CSS the engine inspects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub position: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            position: "static".to_string(),
        }
    }
}

impl ComputedStyle {
    /// Hidden from rendering by `display: none` or `visibility: hidden`
    pub fn is_hidden(&self) -> bool {
        self.display == "none" || self.visibility == "hidden"
    }

    /// Pinned to the viewport (`fixed` or `sticky`)
    pub fn is_pinned(&self) -> bool {
        self.position == "fixed" || self.position == "sticky"
    }
}

/// How `scroll_into_view` should move the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// What the overlay looks like once rendered, handed to the host for mounting
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedOverlay {
    /// Complete markup of the overlay container
    pub html: String,
    /// Number of list entries in the markup
    pub entries: usize,
    pub collapsed: bool,
    /// Entry rendered with the active highlight
    pub active_entry: Option<usize>,
}

/// Summary of a node that was added to or removed from the document,
/// captured at mutation time so removed subtrees can still be inspected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeSummary {
    pub tag: String,
    /// Tags of every descendant element
    pub descendant_tags: Vec<String>,
}

/// One batch of subtree insertions and removals
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MutationRecord {
    pub added: Vec<NodeSummary>,
    pub removed: Vec<NodeSummary>,
}

/// Active pointer-tracking listeners. Dropping the capture removes them.
pub trait PointerCapture {}

/// The live page, as seen by the engine.
///
/// Everything the engine reads or writes in the host page goes through
/// this trait. A browser host backs it with the real DOM; the crate ships
/// [`SnapshotDocument`], an in-memory page built from a captured snapshot.
pub trait Document {
    /// Full URL of the page
    fn url(&self) -> String;

    fn viewport(&self) -> Size;

    /// Current vertical scroll offset of the page
    fn scroll_top(&self) -> f64;

    /// Every element whose tag is in `tags`, in document order
    fn elements_by_tags(&self, tags: &[String]) -> Vec<NodeId>;

    /// First element in document order matching `selector`
    fn query_selector(&self, selector: &Selector) -> Option<NodeId>;

    fn body(&self) -> Option<NodeId>;

    /// Every element whose computed position is `fixed` or `sticky`
    fn pinned_elements(&self) -> Vec<NodeId>;

    fn tag_name(&self, node: NodeId) -> Option<String>;

    /// Concatenated text of the element and all of its descendants
    fn text_content(&self, node: NodeId) -> Option<String>;

    fn computed_style(&self, node: NodeId) -> Option<ComputedStyle>;

    /// Bounding box relative to the viewport
    fn bounding_rect(&self, node: NodeId) -> Option<Rect>;

    fn element_id(&self, node: NodeId) -> Option<String>;

    fn set_element_id(&mut self, node: NodeId, id: &str) -> TocResult<()>;

    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Scroll so the element is aligned with the top of the viewport
    fn scroll_into_view(&mut self, node: NodeId, behavior: ScrollBehavior) -> TocResult<()>;

    /// Attach the overlay (replacing any previous one) and report its measured size
    fn mount_overlay(&mut self, overlay: &RenderedOverlay) -> TocResult<Size>;

    /// Move the mounted overlay to a viewport position
    fn place_overlay(&mut self, position: Point, floating: bool) -> TocResult<()>;

    /// Mark one list entry of the mounted overlay as the active one
    fn highlight_entry(&mut self, index: usize) -> TocResult<()>;

    fn unmount_overlay(&mut self);

    /// Install document-level pointer move/release listeners
    fn capture_pointer(&mut self) -> Box<dyn PointerCapture>;
}

use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::dom::{
    ComputedStyle, Document, MutationRecord, NodeId, NodeSummary, Point, PointerCapture, Rect,
    RenderedOverlay, ScrollBehavior, Selector, Size,
};
use crate::utils::error::{TocError, TocResult};

/// Default overlay width when the snapshot does not pin one
const OVERLAY_WIDTH: f64 = 280.0;
/// Header strip height of a rendered overlay
const OVERLAY_HEADER_HEIGHT: f64 = 48.0;
/// Height of one list entry
const OVERLAY_ENTRY_HEIGHT: f64 = 28.0;

/// One element of a captured page.
///
/// `rect` is the bounding box as captured at the snapshot's scroll offset:
/// viewport-relative, like `getBoundingClientRect()`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNode {
    pub tag: String,
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    /// Text directly inside this element
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    pub fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = Rect::new(x, y, width, height);
        self
    }

    pub fn with_style(mut self, style: ComputedStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_position(mut self, position: &str) -> Self {
        self.style.position = position.to_string();
        self
    }

    pub fn with_child(mut self, child: SnapshotNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = SnapshotNode>) -> Self {
        self.children.extend(children);
        self
    }

    fn summary(&self) -> NodeSummary {
        let mut descendant_tags = Vec::new();
        let mut stack: Vec<&SnapshotNode> = self.children.iter().collect();
        while let Some(node) = stack.pop() {
            descendant_tags.push(node.tag.clone());
            stack.extend(node.children.iter());
        }
        NodeSummary {
            tag: self.tag.clone(),
            descendant_tags,
        }
    }
}

/// A captured page: location, viewport and element tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub url: String,
    pub viewport: Size,
    #[serde(default)]
    pub scroll_top: f64,
    /// Measured overlay size, when the capturing host knows it
    #[serde(default)]
    pub overlay_size: Option<Size>,
    pub root: SnapshotNode,
}

impl PageSnapshot {
    /// Load a snapshot from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> TocResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TocError::Snapshot(format!("Failed to read snapshot {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            TocError::Snapshot(format!("Failed to parse snapshot {}: {}", path.display(), e))
        })
    }
}

/// Overlay as currently attached to a [`SnapshotDocument`]
#[derive(Debug, Clone, PartialEq)]
pub struct MountedOverlay {
    pub rendered: RenderedOverlay,
    pub size: Size,
    pub position: Point,
    pub floating: bool,
    pub active_entry: Option<usize>,
}

#[derive(Debug, Clone)]
struct ArenaNode {
    tag: String,
    attrs: HashMap<String, String>,
    text: String,
    style: ComputedStyle,
    rect: Rect,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
}

struct SnapshotCapture {
    active: Rc<Cell<usize>>,
}

impl PointerCapture for SnapshotCapture {}

impl Drop for SnapshotCapture {
    fn drop(&mut self) {
        self.active.set(self.active.get().saturating_sub(1));
    }
}

/// In-memory page backed by an arena of elements.
///
/// Supports the subtree insertions and removals a live page goes through,
/// reporting each one as a [`MutationRecord`].
pub struct SnapshotDocument {
    url: String,
    viewport: Size,
    scroll_top: f64,
    captured_scroll_top: f64,
    overlay_size: Option<Size>,
    nodes: Vec<ArenaNode>,
    root: NodeId,
    overlay: Option<MountedOverlay>,
    pointer_listeners: Rc<Cell<usize>>,
    last_scroll_target: Option<NodeId>,
}

impl SnapshotDocument {
    pub fn new(snapshot: PageSnapshot) -> Self {
        let mut doc = SnapshotDocument {
            url: snapshot.url,
            viewport: snapshot.viewport,
            scroll_top: snapshot.scroll_top,
            captured_scroll_top: snapshot.scroll_top,
            overlay_size: snapshot.overlay_size,
            nodes: Vec::new(),
            root: NodeId(0),
            overlay: None,
            pointer_listeners: Rc::new(Cell::new(0)),
            last_scroll_target: None,
        };
        doc.root = doc.insert_tree(snapshot.root, None);
        doc
    }

    /// Load a snapshot file into a document
    pub fn load<P: AsRef<Path>>(path: P) -> TocResult<Self> {
        Ok(Self::new(PageSnapshot::load(path)?))
    }

    fn insert_tree(&mut self, node: SnapshotNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ArenaNode {
            tag: node.tag.to_lowercase(),
            attrs: node.attrs,
            text: node.text,
            style: node.style,
            rect: node.rect,
            parent,
            children: Vec::new(),
            attached: true,
        });

        for child in node.children {
            let child_id = self.insert_tree(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }

        id
    }

    fn live(&self, node: NodeId) -> Option<&ArenaNode> {
        self.nodes.get(node.0).filter(|n| n.attached)
    }

    /// Attached elements in document order
    fn document_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.live(id) else { continue };
            order.push(id);
            stack.extend(node.children.iter().rev());
        }
        order
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        if let Some(n) = self.live(node) {
            out.push_str(&n.text);
            for child in &n.children {
                self.collect_text(*child, out);
            }
        }
    }

    fn summarize(&self, node: NodeId) -> NodeSummary {
        let mut descendant_tags = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node.0].children.clone();
        while let Some(id) = stack.pop() {
            descendant_tags.push(self.nodes[id.0].tag.clone());
            stack.extend(self.nodes[id.0].children.iter().copied());
        }
        NodeSummary {
            tag: self.nodes[node.0].tag.clone(),
            descendant_tags,
        }
    }

    /// Append a subtree under `parent`
    pub fn append_child(
        &mut self,
        parent: NodeId,
        node: SnapshotNode,
    ) -> TocResult<(NodeId, MutationRecord)> {
        if self.live(parent).is_none() {
            return Err(TocError::Document(format!("Parent {:?} is not attached", parent)));
        }

        let summary = node.summary();
        let id = self.insert_tree(node, Some(parent));
        self.nodes[parent.0].children.push(id);
        debug!("Inserted <{}> under {:?}", summary.tag, parent);

        Ok((
            id,
            MutationRecord {
                added: vec![summary],
                removed: Vec::new(),
            },
        ))
    }

    /// Detach an element and its subtree. Handles into it go stale.
    pub fn remove(&mut self, node: NodeId) -> TocResult<MutationRecord> {
        if node == self.root {
            return Err(TocError::Document("Cannot remove the document root".to_string()));
        }
        if self.live(node).is_none() {
            return Err(TocError::Document(format!("Node {:?} is not attached", node)));
        }

        let summary = self.summarize(node);
        if let Some(parent) = self.nodes[node.0].parent {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }

        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            self.nodes[id.0].attached = false;
            stack.extend(self.nodes[id.0].children.iter().copied());
        }

        Ok(MutationRecord {
            added: Vec::new(),
            removed: vec![summary],
        })
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    pub fn set_scroll_top(&mut self, scroll_top: f64) {
        self.scroll_top = scroll_top.max(0.0);
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn overlay(&self) -> Option<&MountedOverlay> {
        self.overlay.as_ref()
    }

    /// Number of pointer-tracking listener sets currently installed
    pub fn active_pointer_listeners(&self) -> usize {
        self.pointer_listeners.get()
    }

    pub fn last_scroll_target(&self) -> Option<NodeId> {
        self.last_scroll_target
    }

    pub fn root(&self) -> NodeId {
        self.root
    }
}

impl Document for SnapshotDocument {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn viewport(&self) -> Size {
        self.viewport
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn elements_by_tags(&self, tags: &[String]) -> Vec<NodeId> {
        self.document_order()
            .into_iter()
            .filter(|id| tags.iter().any(|t| t.eq_ignore_ascii_case(&self.nodes[id.0].tag)))
            .collect()
    }

    fn query_selector(&self, selector: &Selector) -> Option<NodeId> {
        self.document_order()
            .into_iter()
            .find(|id| {
                let node = &self.nodes[id.0];
                selector.matches(&node.tag, &node.attrs)
            })
    }

    fn body(&self) -> Option<NodeId> {
        self.document_order()
            .into_iter()
            .find(|id| self.nodes[id.0].tag == "body")
    }

    fn pinned_elements(&self) -> Vec<NodeId> {
        self.document_order()
            .into_iter()
            .filter(|id| self.nodes[id.0].style.is_pinned())
            .collect()
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.live(node).map(|n| n.tag.clone())
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        self.live(node)?;
        let mut text = String::new();
        self.collect_text(node, &mut text);
        Some(text)
    }

    fn computed_style(&self, node: NodeId) -> Option<ComputedStyle> {
        self.live(node).map(|n| n.style.clone())
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        let n = self.live(node)?;
        if n.style.is_pinned() {
            Some(n.rect)
        } else {
            Some(n.rect.offset_y(self.captured_scroll_top - self.scroll_top))
        }
    }

    fn element_id(&self, node: NodeId) -> Option<String> {
        self.live(node)?
            .attrs
            .get("id")
            .filter(|id| !id.is_empty())
            .cloned()
    }

    fn set_element_id(&mut self, node: NodeId, id: &str) -> TocResult<()> {
        if self.live(node).is_none() {
            return Err(TocError::Document(format!("Node {:?} is not attached", node)));
        }
        self.nodes[node.0].attrs.insert("id".to_string(), id.to_string());
        Ok(())
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.document_order()
            .into_iter()
            .find(|n| self.nodes[n.0].attrs.get("id").map(String::as_str) == Some(id))
    }

    fn scroll_into_view(&mut self, node: NodeId, behavior: ScrollBehavior) -> TocResult<()> {
        let rect = self
            .bounding_rect(node)
            .ok_or_else(|| TocError::Document(format!("Node {:?} is not attached", node)))?;

        // Smooth scrolling settles on the same offset as an instant jump
        debug!("Scrolling {:?} into view ({:?})", node, behavior);
        self.set_scroll_top(self.scroll_top + rect.top());
        self.last_scroll_target = Some(node);
        Ok(())
    }

    fn mount_overlay(&mut self, overlay: &RenderedOverlay) -> TocResult<Size> {
        let size = match self.overlay_size {
            Some(size) => size,
            None if overlay.collapsed => Size::new(OVERLAY_WIDTH, OVERLAY_HEADER_HEIGHT),
            None => {
                let list = overlay.entries as f64 * OVERLAY_ENTRY_HEIGHT;
                let height = (OVERLAY_HEADER_HEIGHT + list).min(self.viewport.height * 0.7);
                Size::new(OVERLAY_WIDTH, height)
            }
        };

        let (position, floating) = self
            .overlay
            .as_ref()
            .map(|o| (o.position, o.floating))
            .unwrap_or_default();

        self.overlay = Some(MountedOverlay {
            rendered: overlay.clone(),
            size,
            position,
            floating,
            active_entry: overlay.active_entry,
        });
        Ok(size)
    }

    fn place_overlay(&mut self, position: Point, floating: bool) -> TocResult<()> {
        let overlay = self
            .overlay
            .as_mut()
            .ok_or_else(|| TocError::Document("No overlay is mounted".to_string()))?;
        overlay.position = position;
        overlay.floating = floating;
        Ok(())
    }

    fn highlight_entry(&mut self, index: usize) -> TocResult<()> {
        let overlay = self
            .overlay
            .as_mut()
            .ok_or_else(|| TocError::Document("No overlay is mounted".to_string()))?;
        if index >= overlay.rendered.entries {
            return Err(TocError::Document(format!("No overlay entry {}", index)));
        }
        overlay.active_entry = Some(index);
        Ok(())
    }

    fn unmount_overlay(&mut self) {
        self.overlay = None;
    }

    fn capture_pointer(&mut self) -> Box<dyn PointerCapture> {
        self.pointer_listeners.set(self.pointer_listeners.get() + 1);
        Box::new(SnapshotCapture {
            active: Rc::clone(&self.pointer_listeners),
        })
    }
}

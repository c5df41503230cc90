use serde::{Deserialize, Serialize};

use crate::dom::{MutationRecord, Point};

/// Page activity delivered to a [`ContentScript`](super::ContentScript)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PageEvent {
    Scroll,
    Resize,
    /// Subtrees were inserted into or removed from the document
    Mutation { record: MutationRecord },
    /// A list entry was clicked
    EntryClicked { index: usize },
    /// The header toggle was clicked
    ToggleCollapse,
    /// Primary button pressed on the overlay header
    PointerDown { at: Point },
    PointerMove { at: Point },
    PointerUp { at: Point },
    /// Pointer tracking lost without a release
    PointerCancel,
    /// The page is going away
    Unload,
}

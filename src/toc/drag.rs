use log::debug;

use crate::dom::{Document, Point, PointerCapture};

/// A drag of the overlay in progress.
///
/// Holds the host's pointer-tracking listeners for exactly as long as the
/// session lives: release, pointer loss and overlay teardown all end in
/// the session being dropped, which removes them.
pub struct DragSession {
    _capture: Box<dyn PointerCapture>,
    /// Pointer position relative to the overlay's top-left corner at grab time
    grab_offset: Point,
}

impl DragSession {
    pub fn start<D: Document + ?Sized>(doc: &mut D, pointer: Point, overlay_origin: Point) -> Self {
        debug!("Drag started at ({}, {})", pointer.x, pointer.y);
        DragSession {
            _capture: doc.capture_pointer(),
            grab_offset: Point::new(pointer.x - overlay_origin.x, pointer.y - overlay_origin.y),
        }
    }

    /// Where the overlay's top-left corner goes for a pointer position (unclamped)
    pub fn target_for(&self, pointer: Point) -> Point {
        Point::new(pointer.x - self.grab_offset.x, pointer.y - self.grab_offset.y)
    }
}

impl Drop for DragSession {
    fn drop(&mut self) {
        debug!("Drag session released");
    }
}

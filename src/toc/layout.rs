use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::PositionMode;
use crate::dom::{Document, Point, Rect, Size};

/// Width of the band along each viewport edge where obstacles matter
const EDGE_BAND: f64 = 350.0;
/// Clear width a side needs before the overlay docks there
const MIN_DOCK_WIDTH: f64 = 250.0;
/// Gap between the overlay and the viewport edge
const EDGE_INSET: f64 = 20.0;
/// Default distance from the top of the viewport
const DEFAULT_TOP: f64 = 100.0;
/// Pinned elements at or below this size in either dimension are ignored
const MIN_OBSTACLE_SIZE: f64 = 50.0;

/// Which edge the overlay is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Computed position of the overlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Point,
    pub side: Side,
    /// No side had enough clear space; the overlay may cover content
    pub floating: bool,
}

/// Boxes of the fixed/sticky elements large enough to collide with the overlay
pub fn collect_obstacles<D: Document + ?Sized>(doc: &D) -> Vec<Rect> {
    doc.pinned_elements()
        .into_iter()
        .filter(|node| doc.computed_style(*node).map_or(false, |s| !s.is_hidden()))
        .filter_map(|node| doc.bounding_rect(node))
        .filter(|rect| rect.width > MIN_OBSTACLE_SIZE && rect.height > MIN_OBSTACLE_SIZE)
        .collect()
}

/// Place the overlay given its measured size, the viewport and the obstacles.
///
/// Heuristic: dock right when the right edge has enough clear width,
/// else left, else right in floating mode. Output depends only on the
/// inputs, so an unchanged page always yields the same placement.
pub fn compute_placement(
    container: Size,
    viewport: Size,
    obstacles: &[Rect],
    mode: PositionMode,
) -> Placement {
    let right_obstacles: Vec<&Rect> = obstacles
        .iter()
        .filter(|r| r.right() > viewport.width - EDGE_BAND)
        .collect();
    let left_obstacles: Vec<&Rect> = obstacles
        .iter()
        .filter(|r| r.left() < EDGE_BAND)
        .collect();

    let right_space = right_obstacles
        .iter()
        .map(|r| viewport.width - r.right())
        .fold(viewport.width, f64::min);
    let left_space = left_obstacles
        .iter()
        .map(|r| r.left())
        .fold(viewport.width, f64::min);

    let (side, floating) = match mode {
        PositionMode::Left => (Side::Left, false),
        PositionMode::Right => (Side::Right, false),
        PositionMode::Smart if right_space >= MIN_DOCK_WIDTH => (Side::Right, false),
        PositionMode::Smart if left_space >= MIN_DOCK_WIDTH => (Side::Left, false),
        PositionMode::Smart => (Side::Right, true),
    };

    let x = match side {
        Side::Right => viewport.width - container.width - EDGE_INSET,
        Side::Left => EDGE_INSET,
    };

    let side_obstacles = match side {
        Side::Right => &right_obstacles,
        Side::Left => &left_obstacles,
    };
    let y = side_obstacles
        .first()
        .map_or(DEFAULT_TOP, |r| DEFAULT_TOP.max(r.top()));

    debug!(
        "Placement: side={:?} floating={} right_space={} left_space={} at ({}, {})",
        side, floating, right_space, left_space, x, y
    );

    Placement {
        position: Point::new(x, y),
        side,
        floating,
    }
}

/// Clamp an overlay position so the whole container stays inside the viewport
pub fn clamp_to_viewport(position: Point, container: Size, viewport: Size) -> Point {
    let max_x = (viewport.width - container.width).max(0.0);
    let max_y = (viewport.height - container.height).max(0.0);
    Point::new(position.x.clamp(0.0, max_x), position.y.clamp(0.0, max_y))
}

//! Placement of the activation strip on a screen edge.

use edgelaunch_types::{Rect, Side};

/// Compute the activation strip inside `screen`.
///
/// Width is the sensitivity and height the offset height, both clamped to the
/// screen. Negative offsets count as zero and the strip is pushed up when the
/// offset would move it past the bottom edge. The result is always contained
/// in a non-degenerate `screen` and touches the requested edge.
#[must_use]
pub fn compute_strip(
    sensitivity_px: i32,
    offset_position_px: i32,
    offset_height_px: i32,
    side: Side,
    screen: Rect,
) -> Rect {
    let screen_width = screen.width().max(0);
    let screen_height = screen.height().max(0);

    let width = sensitivity_px.clamp(0, screen_width);
    let height = offset_height_px.clamp(0, screen_height);
    let top = screen.top + offset_position_px.clamp(0, screen_height - height);

    let (left, right) = match side {
        Side::Left => (screen.left, screen.left + width),
        Side::Right => (screen.left + screen_width - width, screen.left + screen_width),
    };

    Rect::new(left, top, right, top + height)
}

/// Full-height column on `side` that hosts the strip's touch target.
#[must_use]
pub fn strip_container(strip: Rect, screen: Rect) -> Rect {
    Rect::new(strip.left, screen.top, strip.right, screen.top + screen.height().max(0))
}

//! Pixel geometry and tweening for whatever draws the board.
//!
//! Pure functions only: callers own the clock and pass elapsed time in.

use serde::Serialize;

use crate::engine::{Cell, TileMotion, SIZE};

/// Outer border around the grid, in pixels.
pub const BORDER: f32 = 5.0;
/// Edge length of a tile sprite.
pub const TILE: f32 = 64.0;
/// Gap between neighbouring tiles.
pub const SPACING: f32 = 3.0;
/// Distance between the origins of neighbouring cells.
pub const PITCH: f32 = TILE + SPACING;
/// Square window edge that fits the grid plus border.
pub const WINDOW: f32 = 2.0 * BORDER + SIZE as f32 * PITCH - SPACING;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Bottom-left corner of `cell` in a y-up window, with row 0 drawn at the top.
pub fn cell_origin(cell: Cell) -> Point {
    let flipped_row = (SIZE - 1 - cell.row() as usize) as f32;
    Point { x: BORDER + PITCH * cell.col() as f32, y: BORDER + PITCH * flipped_row }
}

/// Linear position at `elapsed` seconds into a `duration`-second tween.
///
/// Clamped to `start` before the tween begins and to `end` once it finishes;
/// a non-positive duration jumps straight to `end`.
pub fn interpolate(elapsed: f32, start: Point, end: Point, duration: f32) -> Point {
    if duration <= 0.0 || elapsed >= duration {
        return end;
    }
    if elapsed <= 0.0 {
        return start;
    }
    let t = elapsed / duration;
    Point { x: start.x + (end.x - start.x) * t, y: start.y + (end.y - start.y) * t }
}

/// Start and end pixel positions for a tile motion.
pub fn motion_endpoints(motion: &TileMotion) -> (Point, Point) {
    (cell_origin(motion.from()), cell_origin(motion.to()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(col: u8, row: u8) -> Cell { Cell::new(col, row).unwrap() }

    #[test]
    fn test_window_fits_grid() {
        assert_eq!(WINDOW, 275.0);
        let top_right = cell_origin(cell(3, 0));
        assert_eq!(top_right, Point { x: 206.0, y: 206.0 });
        assert_eq!(top_right.x + TILE + BORDER, WINDOW);
        assert_eq!(cell_origin(cell(0, 3)), Point { x: 5.0, y: 5.0 });
    }

    #[test]
    fn test_interpolate() {
        let a = Point { x: 5.0, y: 5.0 };
        let b = Point { x: 139.0, y: 5.0 };
        assert_eq!(interpolate(-1.0, a, b, 0.2), a);
        assert_eq!(interpolate(0.1, a, b, 0.2), Point { x: 72.0, y: 5.0 });
        assert_eq!(interpolate(0.5, a, b, 0.2), b);
        assert_eq!(interpolate(0.0, a, b, 0.0), b);
    }

    #[test]
    fn test_motion_endpoints() {
        let motion = TileMotion::Slide { from: cell(1, 0), to: cell(0, 0), value: 2 };
        let (start, end) = motion_endpoints(&motion);
        assert_eq!(start.x - end.x, PITCH);
        assert_eq!(start.y, end.y);
    }
}

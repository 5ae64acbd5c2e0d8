use serde::{Deserialize, Serialize};

use crate::pathfinding::Point;

/// Walkable-area mask of a room
/// Cell values: 0=walkable, 1=blocked
/// Each cell covers `cell_width` x `cell_height` room units.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalkableMask {
    pub rows: i32,
    pub cols: i32,
    pub cell_width: i32,
    pub cell_height: i32,
    pub cells: Vec<i32>,
    /// Revision number - incremented whenever mask cells change
    pub revision: u64,
}

impl WalkableMask {
    /// Create a new mask with all cells walkable
    pub fn new(rows: i32, cols: i32, cell_width: i32, cell_height: i32) -> Self {
        WalkableMask {
            rows,
            cols,
            cell_width: cell_width.max(1),
            cell_height: cell_height.max(1),
            cells: vec![0; (rows.max(0) * cols.max(0)) as usize],
            revision: 0,
        }
    }

    /// Create a mask with specific blocked cells
    pub fn with_blocked(rows: i32, cols: i32, cell_width: i32, cell_height: i32, blocked: &[i32]) -> Self {
        let mut mask = Self::new(rows, cols, cell_width, cell_height);
        for &cell_id in blocked {
            if cell_id >= 0 && cell_id < (rows * cols) {
                mask.cells[cell_id as usize] = 1;
            }
        }
        mask
    }

    /// Room width in room units
    pub fn width(&self) -> i32 {
        self.cols * self.cell_width
    }

    /// Room height in room units
    pub fn height(&self) -> i32 {
        self.rows * self.cell_height
    }

    /// Check if a cell at (x, y) is blocked
    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= self.cols || y < 0 || y >= self.rows {
            return true; // Out of bounds is considered blocked
        }
        // Missing cells count as blocked too
        self.cells.get(self.get_id(x, y) as usize).map_or(true, |&value| value == 1)
    }

    /// Convert (x, y) cell coordinates to cell ID
    pub fn get_id(&self, x: i32, y: i32) -> i32 {
        x + y * self.cols
    }

    /// Set cell value at (x, y)
    pub fn set_cell(&mut self, x: i32, y: i32, value: i32) {
        if x >= 0 && x < self.cols && y >= 0 && y < self.rows {
            let id = self.get_id(x, y);
            if let Some(cell) = self.cells.get_mut(id as usize) {
                if *cell != value {
                    *cell = value;
                    self.revision += 1;
                }
            }
        }
    }

    /// Block every cell that overlaps a room-space rectangle.
    /// `right` and `bottom` are exclusive.
    pub fn block_area(&mut self, left: i32, right: i32, top: i32, bottom: i32) {
        if right <= left || bottom <= top {
            return;
        }
        let (x0, y0) = self.cell_of(Point::new(left, top));
        let (x1, y1) = self.cell_of(Point::new(right - 1, bottom - 1));
        for y in y0.max(0)..=y1.min(self.rows - 1) {
            for x in x0.max(0)..=x1.min(self.cols - 1) {
                self.set_cell(x, y, 1);
            }
        }
    }

    /// Whether the cell values describe a `rows` x `cols` grid of non-empty cells
    pub fn is_consistent(&self) -> bool {
        self.rows >= 0
            && self.cols >= 0
            && self.cell_width > 0
            && self.cell_height > 0
            && self.cells.len() == self.rows as usize * self.cols as usize
    }

    /// Get current mask revision number
    pub fn get_revision(&self) -> u64 {
        self.revision
    }

    /// Cell containing a room-space point
    pub fn cell_of(&self, point: Point) -> (i32, i32) {
        (point.x.div_euclid(self.cell_width), point.y.div_euclid(self.cell_height))
    }

    /// Room-space center of a cell
    pub fn cell_center(&self, x: i32, y: i32) -> Point {
        Point::new(x * self.cell_width + self.cell_width / 2, y * self.cell_height + self.cell_height / 2)
    }

    /// Whether a room-space point lies on walkable ground
    pub fn is_walkable(&self, point: Point) -> bool {
        let (cx, cy) = self.cell_of(point);
        !self.is_blocked(cx, cy)
    }

    /// Nearest walkable point to `point`, or the point itself if already walkable.
    /// Returns None when the room has no walkable cell at all.
    pub fn nearest_walkable_point(&self, point: Point) -> Option<Point> {
        if self.is_walkable(point) {
            return Some(point);
        }

        let mut best: Option<(i64, Point)> = None;
        for y in 0..self.rows {
            for x in 0..self.cols {
                if self.is_blocked(x, y) {
                    continue;
                }
                // Closest point of this cell to the requested point
                let left = x * self.cell_width;
                let top = y * self.cell_height;
                let candidate = Point::new(
                    point.x.clamp(left, left + self.cell_width - 1),
                    point.y.clamp(top, top + self.cell_height - 1),
                );
                let dist = candidate.distance_squared(&point);
                // Strict comparison keeps the first cell in row-major order on ties
                if best.map_or(true, |(d, _)| dist < d) {
                    best = Some((dist, candidate));
                }
            }
        }
        best.map(|(_, p)| p)
    }

    /// Whether every point on the straight line between two points is walkable
    pub fn line_of_sight(&self, from: Point, to: Point) -> bool {
        self.trace_line(from, to).1
    }

    /// Last walkable point on the straight line from `from` towards `to`.
    /// Returns `from` when it is not walkable itself.
    pub fn last_walkable_point(&self, from: Point, to: Point) -> Point {
        self.trace_line(from, to).0
    }

    /// Bresenham walk from `from` to `to`, stopping at the first blocked point.
    /// Returns the last walkable point and whether `to` was reached.
    fn trace_line(&self, from: Point, to: Point) -> (Point, bool) {
        let dx = (to.x - from.x).abs();
        let dy = -(to.y - from.y).abs();
        let sx = if from.x < to.x { 1 } else { -1 };
        let sy = if from.y < to.y { 1 } else { -1 };
        let mut err = dx + dy;
        let mut current = from;
        let mut last = from;

        loop {
            if !self.is_walkable(current) {
                return (last, false);
            }
            last = current;
            if current == to {
                return (last, true);
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                current.x += sx;
            }
            if e2 <= dx {
                err += dx;
                current.y += sy;
            }
        }
    }
}

use crate::plan::{MovementPlan, WalkSpeed};
use crate::walkable::WalkableMask;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// A position in room space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    /// Calculate Euclidean distance squared (avoid sqrt for performance)
    pub fn distance_squared(&self, other: &Point) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }
}

/// Everything a pathfinder needs to build a plan
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest {
    pub start: Point,
    pub end: Point,
    pub speed: WalkSpeed,
    /// Build the route without consulting the walkable-area mask
    pub ignore_walls: bool,
}

/// Turns two points and a walkable-area mask into a movement plan
pub trait Pathfinder {
    /// Returns None when no route exists
    fn find_route(&self, mask: &WalkableMask, request: &RouteRequest) -> Option<MovementPlan>;
}

/// A node in the cell search
#[derive(Debug, Clone, Copy)]
struct PathNode {
    cell: (i32, i32),
    /// Cost so far plus heuristic, in tenths of a cell
    estimate: i32,
    cost: i32,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.estimate == other.estimate && self.cell == other.cell
    }
}

impl Eq for PathNode {}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other.estimate.cmp(&self.estimate)
            // Tie-breaker: use position for deterministic ordering
            .then_with(|| other.cell.1.cmp(&self.cell.1))
            .then_with(|| other.cell.0.cmp(&self.cell.0))
    }
}

const STRAIGHT_COST: i32 = 10;
const DIAGONAL_COST: i32 = 14;

/// A* over the cells of the walkable mask, smoothed with line-of-sight checks
#[derive(Debug, Clone, Copy, Default)]
pub struct GridPathfinder;

impl GridPathfinder {
    pub fn new() -> Self {
        GridPathfinder
    }

    /// Cell path from start to destination cell (both included)
    fn search_cells(&self, mask: &WalkableMask, start: (i32, i32), dest: (i32, i32)) -> Option<Vec<(i32, i32)>> {
        let heuristic = |cell: (i32, i32)| {
            let dx = (cell.0 - dest.0).abs();
            let dy = (cell.1 - dest.1).abs();
            STRAIGHT_COST * (dx + dy) + (DIAGONAL_COST - 2 * STRAIGHT_COST) * dx.min(dy)
        };

        let mut queue = BinaryHeap::new();
        let mut best_cost: HashMap<(i32, i32), i32> = HashMap::new();
        let mut came_from: HashMap<(i32, i32), (i32, i32)> = HashMap::new();

        best_cost.insert(start, 0);
        queue.push(PathNode {
            cell: start,
            estimate: heuristic(start),
            cost: 0,
        });

        while let Some(node) = queue.pop() {
            if node.cell == dest {
                let mut cells = vec![dest];
                let mut current = dest;
                while let Some(&prev) = came_from.get(&current) {
                    cells.push(prev);
                    current = prev;
                }
                cells.reverse();
                return Some(cells);
            }

            // Skip if already processed with better cost
            if best_cost.get(&node.cell).is_some_and(|&c| node.cost > c) {
                continue;
            }

            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let next = (node.cell.0 + dx, node.cell.1 + dy);
                    if mask.is_blocked(next.0, next.1) {
                        continue;
                    }
                    // No corner cutting on diagonal moves
                    if dx != 0 && dy != 0
                        && (mask.is_blocked(node.cell.0 + dx, node.cell.1) || mask.is_blocked(node.cell.0, node.cell.1 + dy))
                    {
                        continue;
                    }
                    let step = if dx != 0 && dy != 0 { DIAGONAL_COST } else { STRAIGHT_COST };
                    let cost = node.cost + step;
                    if best_cost.get(&next).map_or(true, |&c| cost < c) {
                        best_cost.insert(next, cost);
                        came_from.insert(next, node.cell);
                        queue.push(PathNode {
                            cell: next,
                            estimate: cost + heuristic(next),
                            cost,
                        });
                    }
                }
            }
        }

        None
    }

    /// Drop waypoints that can be skipped with a straight walk
    fn smooth(mask: &WalkableMask, points: Vec<Point>) -> Vec<Point> {
        if points.len() <= 2 {
            return points;
        }
        let mut result = vec![points[0]];
        let mut anchor = 0;
        while anchor < points.len() - 1 {
            // Furthest point visible from the anchor, at least the next one
            let mut next = anchor + 1;
            for candidate in (anchor + 2..points.len()).rev() {
                if mask.line_of_sight(points[anchor], points[candidate]) {
                    next = candidate;
                    break;
                }
            }
            result.push(points[next]);
            anchor = next;
        }
        result
    }
}

impl Pathfinder for GridPathfinder {
    fn find_route(&self, mask: &WalkableMask, request: &RouteRequest) -> Option<MovementPlan> {
        let RouteRequest { start, end, speed, ignore_walls } = *request;

        if ignore_walls || mask.line_of_sight(start, end) {
            return Some(MovementPlan::new(vec![start, end], speed, ignore_walls));
        }

        if !mask.is_walkable(end) {
            debug!("[find_route] destination ({},{}) is not walkable", end.x, end.y);
            return None;
        }

        let start_cell = mask.cell_of(start);
        let dest_cell = mask.cell_of(end);
        let cells = self.search_cells(mask, start_cell, dest_cell)?;

        // Walk through cell centers between the exact endpoints
        let mut points = Vec::with_capacity(cells.len() + 1);
        points.push(start);
        for &(cx, cy) in cells.iter().skip(1).take(cells.len().saturating_sub(2)) {
            points.push(mask.cell_center(cx, cy));
        }
        points.push(end);

        let points = Self::smooth(mask, points);
        debug!(
            "[find_route] ({},{}) -> ({},{}): {} waypoints",
            start.x, start.y, end.x, end.y, points.len()
        );
        Some(MovementPlan::new(points, speed, false))
    }
}

/// Format path for display
pub fn format_path(path: &[Point]) -> String {
    if path.is_empty() {
        return "No path".to_string();
    }

    let mut result = String::new();
    for (i, pos) in path.iter().enumerate() {
        if i > 0 {
            result.push_str(" -> ");
        }
        result.push_str(&format!("({},{})", pos.x, pos.y));
    }
    result
}

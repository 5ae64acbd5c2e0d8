//! Turn sequencing around the ring of eight directions.
//!
//! Loops are numbered down, left, right, up, then the diagonals, but turning
//! walks them in the order they appear around a compass so a character
//! rotates through its neighbouring directions.

use serde::{Deserialize, Serialize};

use crate::catalog::View;

/// Loop numbers in ring order: down, down-left, left, up-left, up, up-right, right, down-right
pub const TURN_ORDER: [usize; 8] = [0, 6, 1, 7, 3, 5, 2, 4];

/// Position of a loop on the ring, None for loops past the eight directions
pub fn ring_index(loop_index: usize) -> Option<usize> {
    TURN_ORDER.iter().position(|&l| l == loop_index)
}

/// Direction of travel around the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnDirection {
    /// Down towards left towards up, increasing ring index
    CounterClockwise,
    /// Down towards right towards up, decreasing ring index
    Clockwise,
}

impl TurnDirection {
    fn next_slot(self, slot: usize) -> usize {
        match self {
            TurnDirection::CounterClockwise => (slot + 1) % TURN_ORDER.len(),
            TurnDirection::Clockwise => (slot + TURN_ORDER.len() - 1) % TURN_ORDER.len(),
        }
    }
}

/// A rotation from one loop to another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnPlan {
    pub direction: TurnDirection,
    /// Loops to show including the target
    pub steps: u32,
}

/// Whether a ring slot can be shown as an intermediate turning step
fn is_turn_stop(loop_index: usize, view: &View, allow_diagonal: bool) -> bool {
    if loop_index >= 4 && !allow_diagonal {
        return false;
    }
    view.has_frames(loop_index)
}

/// Shortest rotation from `from` to `to`. Equal distances go counter-clockwise.
/// Returns None when no turn is needed or either loop is not on the ring.
pub fn plan_turn(from: usize, to: usize, view: &View, allow_diagonal: bool) -> Option<TurnPlan> {
    if from == to {
        return None;
    }
    let start = ring_index(from)?;
    let end = ring_index(to)?;

    let distance = (end + TURN_ORDER.len() - start) % TURN_ORDER.len();
    let direction = if distance <= TURN_ORDER.len() / 2 {
        TurnDirection::CounterClockwise
    } else {
        TurnDirection::Clockwise
    };

    let mut steps = 1;
    let mut slot = direction.next_slot(start);
    while slot != end {
        if is_turn_stop(TURN_ORDER[slot], view, allow_diagonal) {
            steps += 1;
        }
        slot = direction.next_slot(slot);
    }

    Some(TurnPlan { direction, steps })
}

/// Next loop shown while turning from `current` towards `target`
pub fn next_turn_loop(current: usize, target: usize, direction: TurnDirection, view: &View, allow_diagonal: bool) -> usize {
    let Some(mut slot) = ring_index(current) else {
        return target;
    };
    for _ in 0..TURN_ORDER.len() {
        slot = direction.next_slot(slot);
        let loop_index = TURN_ORDER[slot];
        if loop_index == target || is_turn_stop(loop_index, view, allow_diagonal) {
            return loop_index;
        }
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Loop, LOOP_DOWN, LOOP_DOWN_LEFT, LOOP_DOWN_RIGHT, LOOP_LEFT, LOOP_RIGHT, LOOP_UP};

    fn walk(from: usize, to: usize, view: &View, allow_diagonal: bool) -> Vec<usize> {
        let Some(plan) = plan_turn(from, to, view, allow_diagonal) else {
            return Vec::new();
        };
        let mut shown = Vec::new();
        let mut current = from;
        for step in 0..plan.steps {
            current = if step + 1 == plan.steps {
                to
            } else {
                next_turn_loop(current, to, plan.direction, view, allow_diagonal)
            };
            shown.push(current);
        }
        shown
    }

    #[test]
    fn test_ring_index() {
        assert_eq!(ring_index(LOOP_DOWN), Some(0));
        assert_eq!(ring_index(LOOP_DOWN_RIGHT), Some(7));
        assert_eq!(ring_index(8), None);
    }

    #[test]
    fn test_no_turn_needed() {
        let view = View::walking(8, 3, 0);
        assert_eq!(plan_turn(LOOP_LEFT, LOOP_LEFT, &view, true), None);
        assert_eq!(plan_turn(LOOP_LEFT, 9, &view, true), None);
    }

    #[test]
    fn test_cardinal_turns_skip_diagonals() {
        let view = View::walking(8, 3, 0);
        assert_eq!(walk(LOOP_DOWN, LOOP_LEFT, &view, false), vec![LOOP_LEFT]);
        assert_eq!(walk(LOOP_DOWN, LOOP_LEFT, &view, true), vec![LOOP_DOWN_LEFT, LOOP_LEFT]);
        assert_eq!(walk(LOOP_DOWN, LOOP_RIGHT, &view, true), vec![LOOP_DOWN_RIGHT, LOOP_RIGHT]);
    }

    #[test]
    fn test_opposite_turn_goes_counter_clockwise() {
        let view = View::walking(8, 3, 0);
        let plan = plan_turn(LOOP_DOWN, LOOP_UP, &view, false).unwrap();
        assert_eq!(plan.direction, TurnDirection::CounterClockwise);
        assert_eq!(walk(LOOP_DOWN, LOOP_UP, &view, false), vec![LOOP_LEFT, LOOP_UP]);

        let plan = plan_turn(LOOP_LEFT, LOOP_RIGHT, &view, true).unwrap();
        assert_eq!(plan.direction, TurnDirection::CounterClockwise);
        assert_eq!(plan.steps, 4);
    }

    #[test]
    fn test_empty_loops_are_skipped() {
        let mut view = View::walking(8, 3, 0);
        view.loops[LOOP_DOWN_LEFT] = Loop::default();
        assert_eq!(walk(LOOP_DOWN, LOOP_LEFT, &view, true), vec![LOOP_LEFT]);
    }

    #[test]
    fn test_turns_never_exceed_half_the_ring() {
        let view = View::walking(8, 3, 0);
        for from in 0..8 {
            for to in 0..8 {
                if let Some(plan) = plan_turn(from, to, &view, true) {
                    assert!(plan.steps <= 4, "{from} -> {to} took {} steps", plan.steps);
                    let shown = walk(from, to, &view, true);
                    assert_eq!(shown.last(), Some(&to));
                }
            }
        }
    }
}

//! Direction selection: maps a movement vector to the loop a character should show.
//!
//! Two strategies exist because older game data picks loops differently. The
//! strategy is chosen once per game-data load with [`DirectionStrategy::for_data_version`]
//! and both are pure functions of their inputs.

use serde::{Deserialize, Serialize};

use crate::catalog::{
    View, LOOP_DOWN, LOOP_DOWN_LEFT, LOOP_DOWN_RIGHT, LOOP_LEFT, LOOP_RIGHT, LOOP_UP, LOOP_UP_LEFT, LOOP_UP_RIGHT,
};

/// Last game-data version that uses the legacy selection rules
pub const LAST_LEGACY_DATA_VERSION: u32 = 32;

/// How far a character may use the diagonal loops of its view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagonalSupport {
    /// No diagonal loops (fewer than 8 loops, or disabled)
    None,
    /// Diagonal loops only hold standing frames: usable while turning, not while walking
    TurningOnly,
    /// Diagonal loops are fully animated
    Full,
}

impl DiagonalSupport {
    /// Diagonal support of a view for a character
    pub fn of_view(view: &View, diagonal_disabled: bool) -> Self {
        if view.loop_count() < 8 || diagonal_disabled {
            DiagonalSupport::None
        } else if view.frame_count(LOOP_DOWN_RIGHT) < 2 {
            DiagonalSupport::TurningOnly
        } else {
            DiagonalSupport::Full
        }
    }

    /// Diagonal loops may be picked as a walking or facing direction
    pub fn for_walking(self) -> bool {
        self == DiagonalSupport::Full
    }

    /// Diagonal loops may be shown as intermediate turning steps
    pub fn for_turning(self) -> bool {
        self != DiagonalSupport::None
    }
}

/// Whether the view has both a down and an up loop with frames
pub fn has_up_down_loops(view: &View) -> bool {
    view.loop_count() >= 4 && view.has_frames(LOOP_DOWN) && view.has_frames(LOOP_UP)
}

/// Loop selection rules, fixed for the lifetime of the loaded game data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionStrategy {
    Modern,
    Legacy,
}

impl DirectionStrategy {
    pub fn for_data_version(data_version: u32) -> Self {
        if data_version <= LAST_LEGACY_DATA_VERSION {
            DirectionStrategy::Legacy
        } else {
            DirectionStrategy::Modern
        }
    }

    /// Loop for a movement vector or a target-relative offset.
    /// Returns None for a zero vector.
    pub fn select(self, dx: i32, dy: i32, view: &View, diagonals: DiagonalSupport) -> Option<usize> {
        if dx == 0 && dy == 0 {
            return None;
        }
        let use_diagonal = diagonals.for_walking();
        Some(match self {
            DirectionStrategy::Modern => select_modern(dx, dy, view, use_diagonal),
            DirectionStrategy::Legacy => select_legacy(dx, dy, view, use_diagonal),
        })
    }
}

/// Replace a cardinal loop with a diagonal one when the secondary axis is
/// more than half of the primary axis
fn diagonal_or(cardinal: usize, secondary: i32, primary: i32, negative: usize, positive: usize, use_diagonal: bool) -> usize {
    if !use_diagonal {
        return cardinal;
    }
    if secondary.unsigned_abs() > primary.unsigned_abs() / 2 {
        if secondary < 0 { negative } else { positive }
    } else {
        cardinal
    }
}

/// Current rules: vertical only wins when strictly larger; views without
/// up/down loops always face horizontally
pub fn select_modern(dx: i32, dy: i32, view: &View, use_diagonal: bool) -> usize {
    let horizontal = !has_up_down_loops(view) || dy.unsigned_abs() <= dx.unsigned_abs();

    if horizontal && dx > 0 {
        diagonal_or(LOOP_RIGHT, dy, dx, LOOP_UP_RIGHT, LOOP_DOWN_RIGHT, use_diagonal)
    } else if horizontal {
        diagonal_or(LOOP_LEFT, dy, dx, LOOP_UP_LEFT, LOOP_DOWN_LEFT, use_diagonal)
    } else if dy < 0 {
        diagonal_or(LOOP_UP, dx, dy, LOOP_UP_LEFT, LOOP_UP_RIGHT, use_diagonal)
    } else {
        diagonal_or(LOOP_DOWN, dx, dy, LOOP_DOWN_LEFT, LOOP_DOWN_RIGHT, use_diagonal)
    }
}

/// Rules of older game data: availability is driven by the left/right loops
pub fn select_legacy(dx: i32, dy: i32, view: &View, use_diagonal: bool) -> usize {
    let can_right = view.loop_count() >= 3 && view.has_frames(LOOP_RIGHT);
    let can_left = view.loop_count() >= 2 && view.has_frames(LOOP_LEFT);

    if dy.unsigned_abs() < dx.unsigned_abs() {
        if !can_left && !can_right {
            LOOP_DOWN
        } else if can_right && dx >= 0 {
            diagonal_or(LOOP_RIGHT, dy, dx, LOOP_UP_RIGHT, LOOP_DOWN_RIGHT, use_diagonal)
        } else if can_left && dx < 0 {
            diagonal_or(LOOP_LEFT, dy, dx, LOOP_UP_LEFT, LOOP_DOWN_LEFT, use_diagonal)
        } else {
            LOOP_LEFT
        }
    } else if dy >= 0 {
        diagonal_or(LOOP_DOWN, dx, dy, LOOP_DOWN_LEFT, LOOP_DOWN_RIGHT, use_diagonal)
    } else {
        diagonal_or(LOOP_UP, dx, dy, LOOP_UP_LEFT, LOOP_UP_RIGHT, use_diagonal)
    }
}

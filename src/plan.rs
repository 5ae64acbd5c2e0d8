use serde::{Deserialize, Serialize};

use crate::pathfinding::Point;

/// Fixed-point shift used for per-tick velocities (16.16)
pub const FIXED_SHIFT: u32 = 16;
/// 1.0 in fixed point
pub const FIXED_ONE: i32 = 1 << FIXED_SHIFT;
/// Maximum number of waypoints a plan can hold
pub const MAX_STAGES: usize = 256;

/// Convert a walk speed to fixed-point units per tick.
/// Negative speeds are fractions: -2 means one unit every two ticks.
pub fn speed_to_fixed(speed: i32) -> i32 {
    if speed < 0 {
        FIXED_ONE / speed.saturating_neg()
    } else {
        speed.saturating_mul(FIXED_ONE)
    }
}

/// Walking speed of a character in room units per tick
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkSpeed {
    pub x: i32,
    /// None when the vertical speed follows the horizontal one
    pub y: Option<i32>,
}

impl WalkSpeed {
    pub fn uniform(speed: i32) -> Self {
        WalkSpeed { x: speed, y: None }
    }

    /// Separate horizontal and vertical speeds; equal values collapse to uniform
    pub fn new(x: i32, y: i32) -> Self {
        if x == y {
            Self::uniform(x)
        } else {
            WalkSpeed { x, y: Some(y) }
        }
    }

    pub fn y(&self) -> i32 {
        self.y.unwrap_or(self.x)
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0 && self.y() == 0
    }
}

/// Per-tick displacement of one stage, in fixed-point room units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Velocity {
    pub dx: i32,
    pub dy: i32,
}

impl Velocity {
    pub fn new(dx: i32, dy: i32) -> Self {
        Velocity { dx, dy }
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Velocity that covers the stage `from -> to` at the given speed.
///
/// The axis that needs more ticks at its own speed moves at full speed, the
/// other one proportionally (rounded up so it never lags behind).
pub fn stage_velocity(from: Point, to: Point, speed: WalkSpeed) -> Velocity {
    if from == to {
        return Velocity::default();
    }

    let sx = i64::from(speed_to_fixed(speed.x).max(1));
    let sy = i64::from(speed_to_fixed(speed.y()).max(1));
    let xdist = i64::from((to.x - from.x).abs());
    let ydist = i64::from((to.y - from.y).abs());

    let (vx, vy) = if xdist == 0 {
        (0, sy)
    } else if ydist == 0 {
        (sx, 0)
    } else if xdist * sy >= ydist * sx {
        (sx, (ydist * sx + xdist - 1) / xdist)
    } else {
        ((xdist * sy + ydist - 1) / ydist, sy)
    };

    let dx = if to.x < from.x { -vx } else { vx };
    let dy = if to.y < from.y { -vy } else { vy };
    Velocity::new(dx as i32, dy as i32)
}

/// Result of advancing a plan by one tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanStep {
    /// Still inside the current stage
    Moved(Point),
    /// Reached a waypoint and started the next stage
    StageChanged(Point),
    /// Reached the final waypoint
    Arrived(Point),
}

impl PlanStep {
    pub fn position(&self) -> Point {
        match *self {
            PlanStep::Moved(p) | PlanStep::StageChanged(p) | PlanStep::Arrived(p) => p,
        }
    }
}

/// Waypoint list with precomputed per-stage velocities, consumed tick by tick
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementPlan {
    waypoints: Vec<Point>,
    velocities: Vec<Velocity>,
    /// Index of the stage being walked (waypoint it started from)
    stage: usize,
    /// Ticks spent on the current stage
    onpart: i32,
    /// Start point of the current stage
    from: Point,
    /// Built without the walkable-area mask
    direct: bool,
    done: bool,
}

impl MovementPlan {
    /// Build a plan through `waypoints`; the first waypoint is the start position
    pub fn new(mut waypoints: Vec<Point>, speed: WalkSpeed, direct: bool) -> Self {
        if waypoints.len() == 1 {
            waypoints.push(waypoints[0]);
        }
        let velocities = waypoints
            .windows(2)
            .map(|pair| stage_velocity(pair[0], pair[1], speed))
            .collect();
        let from = waypoints.first().copied().unwrap_or_default();
        let done = waypoints.is_empty();

        MovementPlan {
            waypoints,
            velocities,
            stage: 0,
            onpart: 0,
            from,
            direct,
            done,
        }
    }

    pub fn waypoints(&self) -> &[Point] {
        &self.waypoints
    }

    /// Number of stages (segments between waypoints)
    pub fn stage_count(&self) -> usize {
        self.velocities.len()
    }

    pub fn current_stage(&self) -> usize {
        self.stage
    }

    pub fn ticks_into_stage(&self) -> i32 {
        self.onpart
    }

    pub fn is_direct(&self) -> bool {
        self.direct
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn destination(&self) -> Option<Point> {
        self.waypoints.last().copied()
    }

    /// Velocity of the stage currently walked
    pub fn current_velocity(&self) -> Option<Velocity> {
        self.velocities.get(self.stage).copied()
    }

    /// Whether the first stage actually goes somewhere
    pub fn starts_moving(&self) -> bool {
        self.waypoints.len() >= 2 && self.waypoints[0] != self.waypoints[1]
    }

    /// Advance one tick along the plan
    pub fn advance(&mut self) -> PlanStep {
        if self.done || self.stage + 1 >= self.waypoints.len() {
            self.done = true;
            return PlanStep::Arrived(self.destination().unwrap_or(self.from));
        }

        self.onpart += 1;
        let velocity = self.velocities[self.stage];
        let target = self.waypoints[self.stage + 1];

        let mut x = self.from.x + fixed_mul(velocity.dx, self.onpart);
        let mut y = self.from.y + fixed_mul(velocity.dy, self.onpart);

        // Snap each axis to the target once it is reached or overrun
        if (velocity.dx > 0 && x >= target.x) || (velocity.dx < 0 && x <= target.x) || velocity.dx == 0 {
            x = target.x;
        }
        if (velocity.dy > 0 && y >= target.y) || (velocity.dy < 0 && y <= target.y) || velocity.dy == 0 {
            y = target.y;
        }

        if x != target.x || y != target.y {
            return PlanStep::Moved(Point::new(x, y));
        }

        // Stage finished
        self.from = target;
        self.stage += 1;
        self.onpart = 0;
        if self.stage + 1 >= self.waypoints.len() {
            self.done = true;
            PlanStep::Arrived(target)
        } else {
            PlanStep::StageChanged(target)
        }
    }

    /// Undo the last tick of the current stage.
    /// Returns false when the stage has not consumed any tick yet.
    pub fn rewind(&mut self) -> bool {
        if self.onpart > 0 {
            self.onpart -= 1;
            true
        } else {
            false
        }
    }

    /// Append a waypoint at the end of the plan.
    /// Returns false when the plan is already at capacity.
    pub fn add_waypoint(&mut self, point: Point, speed: WalkSpeed) -> bool {
        if self.waypoints.len() >= MAX_STAGES {
            return false;
        }
        let Some(last) = self.destination() else {
            return false;
        };
        // Already walking there anyway
        if last == point {
            return true;
        }
        self.waypoints.push(point);
        self.velocities.push(stage_velocity(last, point, speed));
        self.done = false;
        true
    }
}

fn fixed_mul(value: i32, ticks: i32) -> i32 {
    // Division truncates toward zero, matching the integer cast of the movement step
    (i64::from(value) * i64::from(ticks) / i64::from(FIXED_ONE)) as i32
}

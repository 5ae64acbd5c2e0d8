use serde::{Deserialize, Serialize};

use crate::pathfinding::Point;
use crate::plan::{MovementPlan, WalkSpeed};
use crate::turning::TurnDirection;

/// Per-character behaviour switches
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterFlags {
    /// Other characters walk through this one
    pub blocking_disabled: bool,
    /// Never use the diagonal loops
    pub diagonal_disabled: bool,
    /// Change direction instantly instead of turning through neighbouring loops
    pub turning_disabled: bool,
    /// Movement only happens when the walk-cycle frame changes
    pub antiglide: bool,
    /// Display scale also changes the walking rate
    pub scale_adjusts_speed: bool,
    /// Current plan was started with a move: no walk-cycle frames
    pub move_without_walk_animation: bool,
}

impl Default for CharacterFlags {
    fn default() -> Self {
        CharacterFlags {
            blocking_disabled: false,
            diagonal_disabled: false,
            turning_disabled: false,
            antiglide: false,
            scale_adjusts_speed: true,
            move_without_walk_animation: false,
        }
    }
}

/// What the character is doing with its movement plan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementState {
    Idle,
    FollowingPlan,
    /// Rotating through neighbouring loops towards `target`
    Turning {
        target: usize,
        steps_left: u32,
        direction: TurnDirection,
        /// Ticks before the next loop is shown
        wait: i32,
    },
    /// Paused while another character gets out of the way
    Waiting { ticks: i32 },
}

/// Idle animation settings and countdown
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleAnimation {
    /// View played when the character has been idle for a while
    pub view: Option<usize>,
    /// Seconds of idleness before the view plays, 0 plays it continuously
    pub delay: i32,
    /// Seconds left before the idle view starts
    pub countdown: i32,
    /// The idle view is currently shown
    pub playing: bool,
    /// Ticks before the next idle frame
    pub frame_wait: i32,
}

impl IdleAnimation {
    pub fn reset_countdown(&mut self) {
        self.countdown = self.delay;
    }
}

/// A character in the world: position, animation cursor and movement state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: usize,
    pub name: String,

    /// Feet position in room units
    pub x: i32,
    pub y: i32,
    /// Visual elevation, not used for collision
    pub z: i32,
    pub room: i32,

    pub enabled: bool,
    pub visible: bool,

    pub walk_speed: WalkSpeed,
    /// Ticks added to every walk-cycle frame delay
    pub anim_speed: i32,
    /// Display scale, 100 is natural size
    pub scale_percent: i32,

    /// View shown while walking
    pub default_view: usize,
    pub view: usize,
    pub loop_index: usize,
    pub frame: usize,

    pub flags: CharacterFlags,

    pub blocking_width: i32,
    pub blocking_height: i32,

    pub state: MovementState,
    pub plan: Option<MovementPlan>,

    /// Ticks counted for the speed throttle
    pub speed_counter: i32,
    /// Position to restore before the next step when a step was shown halfway
    pub pending_rollback: Option<Point>,
    /// Yielding to another character, which must not yield back
    pub awaiting_move: bool,
    /// Ticks before the next walk-cycle frame
    pub anim_wait: i32,
    /// Run the idle countdown on the next tick
    pub process_idle: bool,

    /// Playing a one-shot animation that a walk would interrupt
    pub animating: bool,
    /// View locked by something other than walking
    pub view_locked: bool,

    pub idle: IdleAnimation,
}

impl Character {
    pub fn new(id: usize, name: &str, view: usize, x: i32, y: i32, room: i32) -> Self {
        Character {
            id,
            name: name.to_string(),
            x,
            y,
            z: 0,
            room,
            enabled: true,
            visible: true,
            walk_speed: WalkSpeed::uniform(3),
            anim_speed: 5,
            scale_percent: 100,
            default_view: view,
            view,
            loop_index: 0,
            frame: 0,
            flags: CharacterFlags::default(),
            blocking_width: 0,
            blocking_height: 0,
            state: MovementState::Idle,
            plan: None,
            speed_counter: 0,
            pending_rollback: None,
            awaiting_move: false,
            anim_wait: 0,
            process_idle: false,
            animating: false,
            view_locked: false,
            idle: IdleAnimation::default(),
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, point: Point) {
        self.x = point.x;
        self.y = point.y;
    }

    /// Walking, turning or yielding: anything but standing still
    pub fn is_moving(&self) -> bool {
        self.state != MovementState::Idle
    }

    pub fn is_turning(&self) -> bool {
        matches!(self.state, MovementState::Turning { .. })
    }

    /// Has a plan that is being followed or waited on
    pub fn is_walking_plan(&self) -> bool {
        matches!(self.state, MovementState::FollowingPlan | MovementState::Waiting { .. }) && self.plan.is_some()
    }

    /// Remaining ticks of the current pause, 0 when not paused
    pub fn wait_ticks(&self) -> i32 {
        match self.state {
            MovementState::Waiting { ticks } => ticks,
            MovementState::Turning { wait, .. } => wait,
            _ => 0,
        }
    }

    /// Give the character an idle view
    pub fn set_idle_view(&mut self, view: Option<usize>, delay_seconds: i32) {
        self.idle.view = view;
        self.idle.delay = delay_seconds.max(0);
        self.idle.reset_countdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_character_is_idle() {
        let ch = Character::new(0, "Roger", 2, 100, 120, 1);
        assert_eq!(ch.position(), Point::new(100, 120));
        assert!(!ch.is_moving());
        assert_eq!(ch.wait_ticks(), 0);
        assert!(ch.flags.scale_adjusts_speed);
        assert_eq!(ch.view, ch.default_view);
    }

    #[test]
    fn test_wait_ticks_by_state() {
        let mut ch = Character::new(0, "Roger", 0, 0, 0, 0);
        ch.state = MovementState::Waiting { ticks: 12 };
        assert_eq!(ch.wait_ticks(), 12);
        assert!(!ch.is_walking_plan());
        ch.state = MovementState::Turning {
            target: 2,
            steps_left: 1,
            direction: TurnDirection::Clockwise,
            wait: 4,
        };
        assert!(ch.is_turning());
        assert_eq!(ch.wait_ticks(), 4);
    }

    #[test]
    fn test_character_json_round_trip() {
        let mut ch = Character::new(3, "Ego", 1, 10, 20, 2);
        ch.set_idle_view(Some(4), 10);
        ch.pending_rollback = Some(Point::new(9, 19));
        let json = serde_json::to_string(&ch).unwrap();
        let back: Character = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ch);
        assert_eq!(back.idle.countdown, 10);
    }
}

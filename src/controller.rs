//! Movement controller: turns walk and move requests into per-tick position,
//! loop and frame updates for every character in the active room.
//!
//! The controller never blocks. Requests made with [`Blocking::Block`] return
//! [`Completion::UntilIdle`] and the caller keeps calling
//! [`MovementController::step_all_characters`] until the character is idle.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::catalog::{AnimationCatalog, View};
use crate::character::{Character, MovementState};
use crate::collision::{footprint_overlap, Footprint};
use crate::config::MovementOptions;
use crate::direction::{has_up_down_loops, DiagonalSupport, DirectionStrategy};
use crate::error::InvalidStateError;
use crate::pathfinding::{GridPathfinder, Pathfinder, Point, RouteRequest};
use crate::plan::{PlanStep, Velocity, MAX_STAGES};
use crate::throttle::{self, StepDecision};
use crate::turning::{next_turn_loop, plan_turn};
use crate::walkable::WalkableMask;

/// Base pause when bumping into another character
const BUMP_WAIT: i32 = 30;
/// Extra pause per speed unit the other character is below this speed
const BUMP_SLOW_SPEED: i32 = 5;
/// Idle frames hold this many ticks on top of the animation speed
const IDLE_FRAME_EXTRA_DELAY: i32 = 5;
/// Highest loop a character turns from when it has no diagonals
const HIGHEST_CARDINAL_LOOP: usize = 3;
const HIGHEST_DIAGONAL_LOOP: usize = 7;

static EMPTY_VIEW: View = View { loops: Vec::new() };

/// Whether the caller wants to wait for a request to finish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Blocking {
    Block,
    NoBlock,
}

/// What the caller has to do after a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Nothing left to wait for
    Done,
    /// Keep stepping until this character is idle
    UntilIdle(usize),
}

/// What happened to one character during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Disabled or in another room
    Skipped,
    /// Standing still
    Idle,
    /// Showed the next loop of a turn or waited between turn steps
    Turning,
    /// Moved along the plan, or held this tick because of its scale
    Moving,
    /// Paused, yielding to another character or holding a walk-cycle frame
    Waiting,
    /// Walked into another character and started yielding
    Bumped { other: usize },
    /// Reached the end of the plan
    Arrived,
}

/// Read-only rules shared by every character during a tick
struct Rules<'a> {
    options: &'a MovementOptions,
    strategy: DirectionStrategy,
    catalog: &'a AnimationCatalog,
    mask: &'a WalkableMask,
    active_room: i32,
}

impl Rules<'_> {
    fn view(&self, view: usize) -> &View {
        self.catalog.view(view).unwrap_or(&EMPTY_VIEW)
    }

    fn diagonals(&self, ch: &Character) -> DiagonalSupport {
        let disabled = ch.flags.diagonal_disabled || !self.options.diagonal_walking;
        DiagonalSupport::of_view(self.view(ch.view), disabled)
    }

    /// Move the character onto a loop that exists and has frames
    fn fix_loop(&self, ch: &mut Character) {
        let view = self.view(ch.view);
        if ch.loop_index >= view.loop_count() {
            ch.loop_index = 0;
        }
        if !view.has_frames(ch.loop_index) {
            match view.first_loop_with_frames() {
                Some(l) => ch.loop_index = l,
                None => debug!("{}: view {} has no frames", ch.name, ch.view),
            }
        }
    }

    /// Face along a stage velocity, turning through neighbouring loops when allowed
    fn face_along(&self, ch: &mut Character, velocity: Velocity) {
        let view = self.view(ch.view);
        let diagonals = self.diagonals(ch);
        let Some(wanted) = self.strategy.select(velocity.dx, velocity.dy, view, diagonals) else {
            return;
        };

        if !self.options.turn_before_walking || ch.flags.turning_disabled || !ch.visible {
            ch.loop_index = wanted;
            return;
        }
        // Just played an animation on a loop it cannot turn from
        if ch.loop_index > HIGHEST_CARDINAL_LOOP && !diagonals.for_turning() {
            ch.loop_index = wanted;
            return;
        }
        if ch.loop_index >= view.loop_count() || !view.has_frames(ch.loop_index) || !has_up_down_loops(view) {
            ch.loop_index = wanted;
            return;
        }
        self.start_turning(ch, wanted);
    }

    fn start_turning(&self, ch: &mut Character, target: usize) {
        let allow_diagonal = self.diagonals(ch).for_turning();
        match plan_turn(ch.loop_index, target, self.view(ch.view), allow_diagonal) {
            Some(turn) => {
                debug!("{}: turning from loop {} to {} in {} steps", ch.name, ch.loop_index, target, turn.steps);
                ch.state = MovementState::Turning {
                    target,
                    steps_left: turn.steps,
                    direction: turn.direction,
                    wait: 0,
                };
            }
            None => ch.loop_index = target,
        }
    }

    /// Show the next loop of a turn in progress
    fn advance_turn(&self, ch: &mut Character) {
        let MovementState::Turning { target, steps_left, direction, wait } = ch.state else {
            return;
        };
        if wait > 0 {
            ch.state = MovementState::Turning { target, steps_left, direction, wait: wait - 1 };
            return;
        }

        let steps_left = steps_left.saturating_sub(1);
        let next = if steps_left == 0 {
            target
        } else {
            let allow_diagonal = self.diagonals(ch).for_turning();
            next_turn_loop(ch.loop_index, target, direction, self.view(ch.view), allow_diagonal)
        };
        ch.loop_index = next;
        ch.anim_wait = 0;

        if next == target {
            ch.state = if ch.plan.as_ref().is_some_and(|p| !p.is_done()) {
                MovementState::FollowingPlan
            } else {
                MovementState::Idle
            };
        } else {
            ch.state = MovementState::Turning {
                target,
                steps_left,
                direction,
                wait: ch.anim_speed,
            };
        }
    }

    /// Cancel the plan and leave the character standing on walkable ground
    fn stop_moving(&self, ch: &mut Character) {
        if let Some(rollback) = ch.pending_rollback.take() {
            ch.set_position(rollback);
        }

        if ch.is_walking_plan() {
            let direct = ch.plan.as_ref().is_some_and(|p| p.is_direct());
            if !direct && ch.room == self.active_room {
                if let Some(point) = self.mask.nearest_walkable_point(ch.position()) {
                    ch.set_position(point);
                }
            }
            debug!("{}: stop moving", ch.name);
            ch.idle.reset_countdown();
            ch.process_idle = true;
        }

        if ch.state != MovementState::Idle {
            ch.state = MovementState::Idle;
            if !ch.flags.move_without_walk_animation {
                ch.frame = 0;
            }
        }
        ch.plan = None;
    }

    /// Ground the character blocks for others
    fn footprint(&self, ch: &Character) -> Footprint {
        let sprite_width = self
            .view(ch.view)
            .frame(ch.loop_index, ch.frame)
            .map_or(0, |f| f.width * ch.scale_percent / 100);
        Footprint::around(ch.position(), ch.blocking_width, ch.blocking_height, sprite_width, self.mask.width())
    }

    /// Walkable areas for routing `id`, with the ground other characters
    /// stand on taken out
    fn route_mask(&self, characters: &[Character], id: usize) -> Cow<'_, WalkableMask> {
        let mut mask = Cow::Borrowed(self.mask);
        let mover = &characters[id];
        if mover.flags.blocking_disabled {
            return mask;
        }
        let mover_footprint = self.footprint(mover);
        for (other_id, other) in characters.iter().enumerate() {
            let solid = other_id != id
                && other.enabled
                && other.room == self.active_room
                && !other.flags.blocking_disabled
                && (0..self.mask.width()).contains(&other.x)
                && (0..self.mask.height()).contains(&other.y);
            if !solid {
                continue;
            }
            let footprint = self.footprint(other);
            // Already standing on each other: let them walk apart
            if footprint.contains(mover.position()) || mover_footprint.contains(other.position()) {
                continue;
            }
            mask.to_mut().block_area(footprint.left, footprint.right, footprint.top, footprint.bottom);
        }
        mask
    }

    /// First walking character that `id` is now standing on
    fn find_blocker(&self, characters: &[Character], id: usize) -> Option<usize> {
        let mover = &characters[id];
        if mover.flags.blocking_disabled {
            return None;
        }
        characters.iter().enumerate().find_map(|(other_id, other)| {
            let blocks = other_id != id
                && other.enabled
                && other.room == self.active_room
                && !other.flags.blocking_disabled
                && footprint_overlap(mover.position(), &self.footprint(other))
                && other.is_moving()
                && !other.awaiting_move;
            blocks.then_some(other_id)
        })
    }

    /// Take one step of the plan. Returns the character bumped into, if any.
    fn next_move_step(&self, characters: &mut [Character], id: usize) -> Option<usize> {
        let ch = &mut characters[id];
        let before = ch.position();
        let (step, new_velocity) = {
            let plan = ch.plan.as_mut()?;
            let step = plan.advance();
            (step, plan.current_velocity())
        };
        ch.set_position(step.position());

        if let PlanStep::StageChanged(_) = step {
            if !ch.flags.move_without_walk_animation {
                if let Some(velocity) = new_velocity {
                    self.face_along(ch, velocity);
                }
            }
        }

        let other = self.find_blocker(characters, id)?;
        let other_speed = characters[other].walk_speed.x;
        let other_name = characters[other].name.clone();

        let ch = &mut characters[id];
        let ticks = BUMP_WAIT + (BUMP_SLOW_SPEED - other_speed).max(0) * 5;
        ch.awaiting_move = true;
        if !ch.flags.move_without_walk_animation {
            ch.frame = 0;
            ch.anim_wait = ticks;
        }
        if let Some(plan) = ch.plan.as_mut() {
            if !plan.is_done() && plan.rewind() {
                ch.set_position(before);
            }
        }
        match &mut ch.state {
            MovementState::Turning { wait, .. } => *wait = ticks,
            state => *state = MovementState::Waiting { ticks },
        }
        debug!("{}: bumped into {}, waiting for them to move", ch.name, other_name);
        Some(other)
    }

    /// Movement and walk-cycle animation of a character with a plan
    fn update_moving(&self, characters: &mut [Character], id: usize) -> StepOutcome {
        let mut outcome = StepOutcome::Moving;

        let ch = &mut characters[id];
        if let MovementState::Waiting { ticks } = ch.state {
            ch.state = if ticks > 1 {
                MovementState::Waiting { ticks: ticks - 1 }
            } else {
                MovementState::FollowingPlan
            };
            outcome = StepOutcome::Waiting;
        } else {
            ch.awaiting_move = false;
            let decision = throttle::decide(ch.scale_percent, ch.flags.scale_adjusts_speed, ch.speed_counter);

            // A half step shown last tick is completed before anything else
            if decision.plan_steps() > 0 || decision == StepDecision::SettleHalf {
                if let Some(rollback) = ch.pending_rollback.take() {
                    ch.set_position(rollback);
                }
            }

            let old = ch.position();
            for _ in 0..decision.plan_steps() {
                if let Some(other) = self.next_move_step(characters, id) {
                    outcome = StepOutcome::Bumped { other };
                    break;
                }
                let ch = &characters[id];
                if ch.state != MovementState::FollowingPlan || ch.plan.as_ref().map_or(true, |p| p.is_done()) {
                    break;
                }
            }

            let ch = &mut characters[id];
            if decision == StepDecision::AdvanceHalf {
                let full = ch.position();
                ch.pending_rollback = Some(full);
                ch.set_position(Point::new(old.x + (full.x - old.x) / 2, old.y + (full.y - old.y) / 2));
            }
            if !ch.flags.antiglide {
                ch.speed_counter = throttle::wrap_counter(ch.speed_counter + 1);
            }
        }

        let ch = &mut characters[id];
        let view = self.view(ch.view);
        let frame_count = view.frame_count(ch.loop_index);
        if ch.frame >= frame_count.max(1) {
            ch.frame = if frame_count < 2 { 0 } else { 1 };
        }

        if ch.plan.as_ref().map_or(true, |p| p.is_done()) {
            ch.process_idle = true;
            self.stop_moving(ch);
            if !ch.flags.move_without_walk_animation {
                ch.frame = 0;
            }
            ch.anim_wait = 0;
            debug!("{}: arrived at ({},{})", ch.name, ch.x, ch.y);
            return StepOutcome::Arrived;
        }

        if ch.anim_wait > 0 {
            ch.anim_wait -= 1;
            return outcome;
        }

        if ch.flags.antiglide {
            ch.speed_counter = throttle::wrap_counter(ch.speed_counter + 1);
        }
        if !ch.flags.move_without_walk_animation {
            ch.frame += 1;
            if ch.frame >= frame_count {
                // Frame 0 is the standing frame
                ch.frame = if frame_count < 2 { 0 } else { 1 };
            }
            let delay = view.frame(ch.loop_index, ch.frame).map_or(0, |f| f.delay);
            ch.anim_wait = delay + ch.anim_speed;

            let waiting = matches!(ch.state, MovementState::FollowingPlan | MovementState::Waiting { .. });
            if waiting {
                ch.state = if ch.flags.antiglide && ch.anim_wait > 0 {
                    MovementState::Waiting { ticks: ch.anim_wait }
                } else {
                    MovementState::FollowingPlan
                };
            }
        }
        outcome
    }

    /// Put the walking view back after an idle animation
    fn release_idle_view(&self, ch: &mut Character) {
        ch.idle.playing = false;
        ch.idle.frame_wait = 0;
        ch.idle.reset_countdown();
        ch.view = ch.default_view;
        ch.frame = 0;
        self.fix_loop(ch);
    }

    fn start_idle(&self, ch: &mut Character, idle_view: usize) {
        let Some(view) = self.catalog.view(idle_view) else {
            warn!("{}: idle view {} does not exist", ch.name, idle_view);
            ch.idle.reset_countdown();
            return;
        };

        let disabled = ch.flags.diagonal_disabled || !self.options.diagonal_walking;
        let mut max_loops = view.loop_count();
        if max_loops > 4 && DiagonalSupport::of_view(view, disabled) == DiagonalSupport::None {
            max_loops = 4;
        }
        if ch.loop_index >= max_loops {
            ch.loop_index = 0;
        }

        debug!("{}: now idle (view {})", ch.name, idle_view);
        ch.view = idle_view;
        ch.frame = 0;
        ch.idle.playing = true;
        let delay = view.frame(ch.loop_index, 0).map_or(0, |f| f.delay);
        ch.idle.frame_wait = delay + ch.anim_speed + IDLE_FRAME_EXTRA_DELAY;
    }

    /// Cycle the frames of a playing idle animation
    fn animate_idle(&self, ch: &mut Character) {
        if ch.idle.frame_wait > 0 {
            ch.idle.frame_wait -= 1;
            return;
        }
        let view = self.view(ch.view);
        ch.frame += 1;
        if ch.frame >= view.frame_count(ch.loop_index) {
            if ch.idle.delay == 0 {
                ch.frame = 0;
            } else {
                // One-shot idle animation finished
                self.release_idle_view(ch);
                return;
            }
        }
        let delay = view.frame(ch.loop_index, ch.frame).map_or(0, |f| f.delay);
        ch.idle.frame_wait = delay + ch.anim_speed + IDLE_FRAME_EXTRA_DELAY;
    }

    /// Count down towards the idle animation
    fn update_idle(&self, ch: &mut Character, doing_nothing: bool, tick: u64) {
        let Some(idle_view) = ch.idle.view else {
            ch.process_idle = false;
            return;
        };
        if ch.idle.playing {
            return;
        }
        // A stop requested this tick is counted on the next idle tick
        if !doing_nothing || ch.view_locked || ch.animating {
            ch.idle.reset_countdown();
            return;
        }
        let process_now = std::mem::take(&mut ch.process_idle);
        let game_speed = u64::try_from(self.options.game_speed.max(1)).unwrap_or(1);
        if tick % game_speed == 0 || process_now {
            ch.idle.countdown -= 1;
            if ch.idle.countdown < 0 {
                self.start_idle(ch, idle_view);
            }
        }
    }
}

/// Owns the characters of the world and advances them tick by tick
pub struct MovementController {
    options: MovementOptions,
    strategy: DirectionStrategy,
    catalog: AnimationCatalog,
    mask: WalkableMask,
    pathfinder: Box<dyn Pathfinder>,
    characters: Vec<Character>,
    active_room: i32,
    tick: u64,
}

impl MovementController {
    pub fn new(
        options: MovementOptions,
        catalog: AnimationCatalog,
        mask: WalkableMask,
        pathfinder: Box<dyn Pathfinder>,
        active_room: i32,
    ) -> Self {
        let strategy = options.strategy();
        debug!("Direction strategy {:?} for data version {}", strategy, options.data_version);
        MovementController {
            options,
            strategy,
            catalog,
            mask,
            pathfinder,
            characters: Vec::new(),
            active_room,
            tick: 0,
        }
    }

    /// Controller routing walks with [`GridPathfinder`]
    pub fn with_grid_pathfinder(options: MovementOptions, catalog: AnimationCatalog, mask: WalkableMask, active_room: i32) -> Self {
        Self::new(options, catalog, mask, Box::new(GridPathfinder::new()), active_room)
    }

    /// Borrow the rules and the characters at the same time
    fn split(&mut self) -> (Rules<'_>, &mut Vec<Character>) {
        let rules = Rules {
            options: &self.options,
            strategy: self.strategy,
            catalog: &self.catalog,
            mask: &self.mask,
            active_room: self.active_room,
        };
        (rules, &mut self.characters)
    }

    fn rules(&self) -> Rules<'_> {
        Rules {
            options: &self.options,
            strategy: self.strategy,
            catalog: &self.catalog,
            mask: &self.mask,
            active_room: self.active_room,
        }
    }

    pub fn options(&self) -> &MovementOptions {
        &self.options
    }

    pub fn strategy(&self) -> DirectionStrategy {
        self.strategy
    }

    pub fn catalog(&self) -> &AnimationCatalog {
        &self.catalog
    }

    pub fn mask(&self) -> &WalkableMask {
        &self.mask
    }

    /// Walkable areas may change between ticks, never during one
    pub fn mask_mut(&mut self) -> &mut WalkableMask {
        &mut self.mask
    }

    pub fn active_room(&self) -> i32 {
        self.active_room
    }

    pub fn set_active_room(&mut self, room: i32) {
        self.active_room = room;
    }

    /// Ticks simulated so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn character(&self, id: usize) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn character_mut(&mut self, id: usize) -> Option<&mut Character> {
        self.characters.get_mut(id)
    }

    /// Register a character; its id becomes its index
    pub fn add_character(&mut self, mut character: Character) -> usize {
        let id = self.characters.len();
        character.id = id;
        match self.catalog.view(character.view) {
            None => warn!("{}: view {} is not in the catalog", character.name, character.view),
            Some(view) if view.first_loop_with_frames().is_none() => {
                warn!("{}: view {} has no frames", character.name, character.view)
            }
            Some(_) => {}
        }
        if character.walk_speed.is_zero() {
            warn!("{}: walk speed is 0", character.name);
        }
        self.characters.push(character);
        id
    }

    /// Replace every character and the simulation clock, as when resuming a save
    pub fn restore(&mut self, characters: Vec<Character>, tick: u64, active_room: i32) {
        self.characters = characters;
        for (id, ch) in self.characters.iter_mut().enumerate() {
            ch.id = id;
        }
        self.tick = tick;
        self.active_room = active_room;
    }

    /// Whether the character has finished moving and turning
    pub fn is_idle(&self, id: usize) -> bool {
        self.characters.get(id).map_or(true, |ch| !ch.is_moving())
    }

    fn check_exists(&self, id: usize) -> Result<&Character, InvalidStateError> {
        self.characters.get(id).ok_or(InvalidStateError::UnknownCharacter(id))
    }

    /// Character must exist, be enabled and be in the active room
    fn check_movable(&self, id: usize) -> Result<&Character, InvalidStateError> {
        let ch = self.check_exists(id)?;
        if !ch.enabled {
            return Err(InvalidStateError::Disabled(id));
        }
        if ch.room != self.active_room {
            return Err(InvalidStateError::NotInActiveRoom {
                id,
                room: ch.room,
                active_room: self.active_room,
            });
        }
        Ok(ch)
    }

    /// Walk to a point, animating the walk cycle
    pub fn start_walk(&mut self, id: usize, x: i32, y: i32, blocking: Blocking, ignore_walkable: bool) -> Result<Completion, InvalidStateError> {
        self.start_movement(id, Point::new(x, y), blocking, ignore_walkable, true)
    }

    /// Slide to a point without the walk cycle
    pub fn start_move(&mut self, id: usize, x: i32, y: i32, blocking: Blocking, ignore_walkable: bool) -> Result<Completion, InvalidStateError> {
        self.start_movement(id, Point::new(x, y), blocking, ignore_walkable, false)
    }

    fn start_movement(&mut self, id: usize, dest: Point, blocking: Blocking, ignore_walkable: bool, animate: bool) -> Result<Completion, InvalidStateError> {
        self.check_movable(id)?;

        let resolution = self.options.path_resolution.max(1);
        let (rules, characters) = self.split();
        let ch = &mut characters[id];
        ch.flags.move_without_walk_animation = false;

        let here = (ch.x.div_euclid(resolution), ch.y.div_euclid(resolution));
        if here == (dest.x.div_euclid(resolution), dest.y.div_euclid(resolution)) {
            rules.stop_moving(ch);
            debug!("{}: already at destination, not moving", ch.name);
            return Ok(Completion::Done);
        }

        if animate && ch.animating {
            ch.animating = false;
        }
        if ch.idle.playing {
            rules.release_idle_view(ch);
        }

        // Keep the current pause if already walking so a new destination
        // does not grant a free step
        let old_frame = ch.frame;
        let saved_wait = if ch.is_moving() { Some((ch.wait_ticks(), ch.anim_wait)) } else { None };
        rules.stop_moving(ch);
        ch.frame = old_frame;

        debug!("{}: start {} to ({},{})", ch.name, if animate { "walk" } else { "move" }, dest.x, dest.y);
        if ch.walk_speed.is_zero() {
            warn!("{}: moving with walk speed 0", ch.name);
        }

        let request = RouteRequest {
            start: ch.position(),
            end: dest,
            speed: ch.walk_speed,
            ignore_walls: ignore_walkable,
        };
        let route = {
            let rules = self.rules();
            let mask = rules.route_mask(&self.characters, id);
            self.pathfinder.find_route(&mask, &request)
        };

        let (rules, characters) = self.split();
        let ch = &mut characters[id];
        match route {
            Some(plan) => {
                let first_velocity = if plan.starts_moving() { plan.current_velocity() } else { None };
                ch.plan = Some(plan);
                ch.state = MovementState::FollowingPlan;

                if animate {
                    if let Some(velocity) = first_velocity {
                        rules.face_along(ch, velocity);
                    }
                    let (wait, anim_wait) = saved_wait.unwrap_or((0, 0));
                    ch.anim_wait = anim_wait;
                    if wait > 0 {
                        match &mut ch.state {
                            MovementState::Turning { wait: turn_wait, .. } => *turn_wait = wait,
                            state => *state = MovementState::Waiting { ticks: wait },
                        }
                    }
                } else {
                    ch.flags.move_without_walk_animation = true;
                }
            }
            None => {
                debug!("{}: no route to ({},{})", ch.name, dest.x, dest.y);
                if animate {
                    ch.frame = 0;
                }
            }
        }

        Ok(match blocking {
            Blocking::Block => Completion::UntilIdle(id),
            Blocking::NoBlock => Completion::Done,
        })
    }

    /// Walk straight towards a point, ignoring walkable areas beyond the
    /// first obstacle: the walk ends at the last reachable point of the line
    pub fn walk_straight(&mut self, id: usize, x: i32, y: i32, blocking: Blocking) -> Result<Completion, InvalidStateError> {
        self.check_movable(id)?;
        let dest = {
            let (rules, characters) = self.split();
            rules.stop_moving(&mut characters[id]);
            let from = characters[id].position();
            let mask = rules.route_mask(characters, id);
            mask.last_walkable_point(from, Point::new(x, y))
        };
        debug!("{}: walk straight towards ({},{}), stopping at ({},{})", self.characters[id].name, x, y, dest.x, dest.y);
        self.start_movement(id, dest, blocking, true, true)
    }

    /// Append a waypoint to the plan being followed
    pub fn add_waypoint(&mut self, id: usize, x: i32, y: i32) -> Result<(), InvalidStateError> {
        self.check_movable(id)?;
        let ch = &mut self.characters[id];
        let speed = ch.walk_speed;
        let plan = ch.plan.as_mut().ok_or(InvalidStateError::NotMoving(id))?;
        if !plan.add_waypoint(Point::new(x, y), speed) {
            return Err(InvalidStateError::PlanAtCapacity { id, max: MAX_STAGES });
        }
        debug!("{}: added waypoint ({},{})", ch.name, x, y);
        Ok(())
    }

    /// Cancel any movement; calling it on a standing character changes nothing
    pub fn stop_moving(&mut self, id: usize) -> Result<(), InvalidStateError> {
        self.check_exists(id)?;
        let (rules, characters) = self.split();
        rules.stop_moving(&mut characters[id]);
        Ok(())
    }

    /// Turn towards a point in the room
    pub fn face_location(&mut self, id: usize, x: i32, y: i32, blocking: Blocking) -> Result<Completion, InvalidStateError> {
        self.check_exists(id)?;
        let turn_before_facing = self.options.turn_before_facing;
        let (rules, characters) = self.split();
        let ch = &mut characters[id];

        let (dx, dy) = (x - ch.x, y - ch.y);
        let view = rules.view(ch.view);
        let diagonals = rules.diagonals(ch);
        let Some(wanted) = rules.strategy.select(dx, dy, view, diagonals) else {
            // Facing its own position
            return Ok(Completion::Done);
        };
        debug!("{}: face location ({},{})", ch.name, x, y);

        let highest_turnable = if diagonals == DiagonalSupport::None {
            HIGHEST_CARDINAL_LOOP
        } else {
            HIGHEST_DIAGONAL_LOOP
        };

        let mut turning = false;
        if turn_before_facing && wanted != ch.loop_index && ch.loop_index <= highest_turnable {
            rules.stop_moving(ch);
            if ch.visible {
                rules.start_turning(ch, wanted);
                turning = ch.is_turning();
            } else {
                ch.loop_index = wanted;
            }
        } else {
            ch.loop_index = wanted;
        }
        ch.frame = 0;

        Ok(match blocking {
            Blocking::Block if turning => Completion::UntilIdle(id),
            _ => Completion::Done,
        })
    }

    /// Turn towards another character in the same room
    pub fn face_character(&mut self, id: usize, other: usize, blocking: Blocking) -> Result<Completion, InvalidStateError> {
        let room = self.check_exists(id)?.room;
        let target = self.check_exists(other)?;
        if target.room != room {
            return Err(InvalidStateError::DifferentRooms { first: id, second: other });
        }
        let (x, y) = (target.x, target.y);
        self.face_location(id, x, y, blocking)
    }

    /// Advance every character by one tick, in registration order
    pub fn step_all_characters(&mut self) -> Vec<StepOutcome> {
        let outcomes = (0..self.characters.len()).map(|id| self.step_character(id)).collect();
        self.tick += 1;
        outcomes
    }

    fn step_character(&mut self, id: usize) -> StepOutcome {
        let tick = self.tick;
        let (rules, characters) = self.split();

        let ch = &mut characters[id];
        if !ch.enabled || ch.room != rules.active_room {
            return StepOutcome::Skipped;
        }
        if ch.is_turning() {
            rules.advance_turn(ch);
            return StepOutcome::Turning;
        }
        rules.fix_loop(ch);

        let mut outcome = StepOutcome::Idle;
        let mut doing_nothing = true;
        if ch.is_walking_plan() {
            outcome = rules.update_moving(characters, id);
            doing_nothing = false;
        }

        let ch = &mut characters[id];
        if ch.idle.playing && (!ch.is_moving() || ch.flags.move_without_walk_animation) {
            rules.animate_idle(ch);
        }
        rules.update_idle(ch, doing_nothing, tick);
        outcome
    }

    /// Snap a character onto the nearest walkable point
    pub fn place_on_walkable_area(&mut self, id: usize) -> Result<(), InvalidStateError> {
        let position = self.check_exists(id)?.position();
        if let Some(point) = self.mask.nearest_walkable_point(position) {
            self.characters[id].set_position(point);
        }
        Ok(())
    }
}

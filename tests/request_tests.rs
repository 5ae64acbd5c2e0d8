/// Movement requests: validation, no-op requests, waypoints, stopping and facing.

mod common;

use common::{catalog, controller, controller_with_mask, open_mask, pump_until_idle, CountingPathfinder, ROOM, WALK_VIEW};
use walkcycle::catalog::{LOOP_DOWN, LOOP_LEFT, LOOP_RIGHT};
use walkcycle::config::MovementOptions;
use walkcycle::controller::{Blocking, Completion, MovementController};
use walkcycle::plan::MAX_STAGES;
use walkcycle::{Character, InvalidStateError, MovementState, Point, WalkableMask};

#[test_log::test]
fn test_walk_to_current_position_skips_pathfinding() {
    let (pathfinder, calls) = CountingPathfinder::new();
    let mut ctl = MovementController::new(MovementOptions::default(), catalog(), open_mask(), Box::new(pathfinder), ROOM);
    let id = ctl.add_character(Character::new(0, "Ego", WALK_VIEW, 100, 100, ROOM));
    let before = ctl.character(id).unwrap().clone();

    assert_eq!(ctl.start_walk(id, 100, 100, Blocking::Block, false), Ok(Completion::Done));
    assert_eq!(calls.get(), 0);
    assert_eq!(ctl.character(id).unwrap(), &before);

    ctl.start_walk(id, 150, 100, Blocking::NoBlock, false).unwrap();
    assert_eq!(calls.get(), 1);

    // Walking to where it already stands cancels the walk in progress
    for _ in 0..10 {
        ctl.step_all_characters();
    }
    let here = ctl.character(id).unwrap().position();
    assert_eq!(ctl.start_walk(id, here.x, here.y, Blocking::NoBlock, false), Ok(Completion::Done));
    assert_eq!(calls.get(), 1);
    let ego = ctl.character(id).unwrap();
    assert_eq!(ego.state, MovementState::Idle);
    assert!(ego.plan.is_none());
}

#[test_log::test]
fn test_stop_twice_changes_nothing_more() {
    let mut ctl = controller(MovementOptions::default());
    let id = ctl.add_character(Character::new(0, "Ego", WALK_VIEW, 100, 100, ROOM));

    // Stopping a standing character is a no-op
    let standing = ctl.character(id).unwrap().clone();
    ctl.stop_moving(id).unwrap();
    assert_eq!(ctl.character(id).unwrap(), &standing);

    ctl.start_walk(id, 250, 180, Blocking::NoBlock, false).unwrap();
    for _ in 0..25 {
        ctl.step_all_characters();
    }
    ctl.stop_moving(id).unwrap();
    let stopped = ctl.character(id).unwrap().clone();
    assert_eq!(stopped.state, MovementState::Idle);
    assert!(stopped.plan.is_none());
    assert_eq!(stopped.frame, 0);
    assert!(stopped.position() != Point::new(100, 100));

    ctl.stop_moving(id).unwrap();
    assert_eq!(ctl.character(id).unwrap(), &stopped);
    assert_eq!(ctl.stop_moving(5), Err(InvalidStateError::UnknownCharacter(5)));
}

#[test_log::test]
fn test_add_waypoint_requires_a_plan() {
    let mut ctl = controller(MovementOptions::default());
    let id = ctl.add_character(Character::new(0, "Ego", WALK_VIEW, 100, 100, ROOM));
    assert_eq!(ctl.add_waypoint(id, 120, 100), Err(InvalidStateError::NotMoving(id)));
    assert!(ctl.is_idle(id));
}

#[test_log::test]
fn test_add_waypoint_until_full() {
    let mut ctl = controller(MovementOptions::default());
    let id = ctl.add_character(Character::new(0, "Ego", WALK_VIEW, 100, 100, ROOM));
    ctl.start_walk(id, 150, 100, Blocking::NoBlock, true).unwrap();

    // The plan already holds the start and the destination
    for i in 0..(MAX_STAGES - 2) as i32 {
        ctl.add_waypoint(id, i, 50).unwrap();
    }
    assert_eq!(
        ctl.add_waypoint(id, 300, 50),
        Err(InvalidStateError::PlanAtCapacity { id, max: MAX_STAGES })
    );
    let plan = ctl.character(id).unwrap().plan.as_ref().unwrap();
    assert_eq!(plan.waypoints().len(), MAX_STAGES);
    assert_eq!(plan.destination(), Some(Point::new(MAX_STAGES as i32 - 3, 50)));
}

#[test_log::test]
fn test_waypoint_extends_the_walk() {
    let mut ctl = controller(MovementOptions { turn_before_walking: false, ..MovementOptions::default() });
    let id = ctl.add_character(Character::new(0, "Ego", WALK_VIEW, 100, 100, ROOM));
    ctl.start_walk(id, 160, 100, Blocking::NoBlock, false).unwrap();
    ctl.add_waypoint(id, 160, 160).unwrap();

    pump_until_idle(&mut ctl, id, 200);
    let ego = ctl.character(id).unwrap();
    assert_eq!(ego.position(), Point::new(160, 160));
    assert_eq!(ego.loop_index, LOOP_DOWN);
}

#[test_log::test]
fn test_unreachable_destination_leaves_character_standing() {
    // Destination cell (20, 10) is a wall
    let mut mask = WalkableMask::new(30, 40, 10, 10);
    mask.set_cell(20, 10, 1);
    let mut ctl = controller_with_mask(MovementOptions::default(), mask);
    let id = ctl.add_character(Character::new(0, "Ego", WALK_VIEW, 50, 50, ROOM));
    ctl.character_mut(id).unwrap().frame = 2;

    assert_eq!(ctl.start_walk(id, 205, 105, Blocking::NoBlock, false), Ok(Completion::Done));
    let ego = ctl.character(id).unwrap();
    assert_eq!(ego.state, MovementState::Idle);
    assert!(ego.plan.is_none());
    assert_eq!(ego.frame, 0);
    assert_eq!(ego.position(), Point::new(50, 50));

    // Ignoring walkable areas goes straight there
    ctl.start_walk(id, 205, 105, Blocking::NoBlock, true).unwrap();
    pump_until_idle(&mut ctl, id, 300);
    assert_eq!(ctl.character(id).unwrap().position(), Point::new(205, 105));
}

#[test_log::test]
fn test_requests_outside_active_room_are_rejected() {
    let mut ctl = controller(MovementOptions::default());
    let id = ctl.add_character(Character::new(0, "Ego", WALK_VIEW, 100, 100, ROOM + 1));
    let before = ctl.character(id).unwrap().clone();

    let expected = Err(InvalidStateError::NotInActiveRoom { id, room: ROOM + 1, active_room: ROOM });
    assert_eq!(ctl.start_walk(id, 150, 100, Blocking::NoBlock, false), expected);
    assert_eq!(ctl.start_move(id, 150, 100, Blocking::NoBlock, false), expected);
    assert_eq!(ctl.add_waypoint(id, 150, 100), Err(InvalidStateError::NotInActiveRoom { id, room: ROOM + 1, active_room: ROOM }));
    assert_eq!(ctl.character(id).unwrap(), &before);

    // Characters elsewhere are not stepped
    ctl.step_all_characters();
    assert_eq!(ctl.character(id).unwrap(), &before);
}

#[test_log::test]
fn test_face_character_needs_same_room() {
    let mut ctl = controller(MovementOptions::default());
    let ego = ctl.add_character(Character::new(0, "Ego", WALK_VIEW, 100, 100, ROOM));
    let pal = ctl.add_character(Character::new(0, "Pal", WALK_VIEW, 50, 100, ROOM + 1));

    assert_eq!(
        ctl.face_character(ego, pal, Blocking::Block),
        Err(InvalidStateError::DifferentRooms { first: ego, second: pal })
    );
    assert_eq!(ctl.face_character(ego, 9, Blocking::Block), Err(InvalidStateError::UnknownCharacter(9)));

    ctl.character_mut(pal).unwrap().room = ROOM;
    let done = ctl.face_character(ego, pal, Blocking::Block).unwrap();
    assert_eq!(done, Completion::UntilIdle(ego));
    pump_until_idle(&mut ctl, ego, 100);
    assert_eq!(ctl.character(ego).unwrap().loop_index, LOOP_LEFT);
    assert_eq!(ctl.character(ego).unwrap().position(), Point::new(100, 100));
}

#[test_log::test]
fn test_face_already_facing_does_not_block() {
    let mut ctl = controller(MovementOptions::default());
    let mut ch = Character::new(0, "Ego", WALK_VIEW, 100, 100, ROOM);
    ch.loop_index = LOOP_RIGHT;
    let id = ctl.add_character(ch);

    assert_eq!(ctl.face_location(id, 300, 110, Blocking::Block), Ok(Completion::Done));
    assert!(ctl.is_idle(id));
    assert_eq!(ctl.character(id).unwrap().loop_index, LOOP_RIGHT);
}

#[test_log::test]
fn test_stop_frame_follows_walk_animation_not_antiglide() {
    let mut ctl = controller(MovementOptions::default());
    let mut walker = Character::new(0, "Walker", WALK_VIEW, 100, 100, ROOM);
    walker.loop_index = LOOP_RIGHT;
    walker.flags.antiglide = true;
    let mut slider = Character::new(0, "Slider", WALK_VIEW, 100, 200, ROOM);
    slider.flags.antiglide = true;
    slider.frame = 2;
    let walker = ctl.add_character(walker);
    let slider = ctl.add_character(slider);

    ctl.start_walk(walker, 250, 100, Blocking::NoBlock, false).unwrap();
    ctl.start_move(slider, 250, 200, Blocking::NoBlock, false).unwrap();
    for _ in 0..12 {
        ctl.step_all_characters();
    }
    assert_ne!(ctl.character(walker).unwrap().frame, 0);
    assert_eq!(ctl.character(slider).unwrap().frame, 2);

    ctl.stop_moving(walker).unwrap();
    ctl.stop_moving(slider).unwrap();
    assert_eq!(ctl.character(walker).unwrap().frame, 0);
    // A move never showed the walk cycle, so its frame is left alone
    assert_eq!(ctl.character(slider).unwrap().frame, 2);
    assert!(ctl.is_idle(walker));
    assert!(ctl.is_idle(slider));
}

#[test_log::test]
fn test_place_on_walkable_area() {
    let mut mask = WalkableMask::new(30, 40, 10, 10);
    mask.set_cell(10, 10, 1);
    let mut ctl = controller_with_mask(MovementOptions::default(), mask);
    let stuck = ctl.add_character(Character::new(0, "Stuck", WALK_VIEW, 105, 105, ROOM));
    let free = ctl.add_character(Character::new(0, "Free", WALK_VIEW, 50, 50, ROOM));

    ctl.place_on_walkable_area(stuck).unwrap();
    ctl.place_on_walkable_area(free).unwrap();
    assert_eq!(ctl.character(stuck).unwrap().position(), Point::new(110, 105));
    assert_eq!(ctl.character(free).unwrap().position(), Point::new(50, 50));
    assert_eq!(ctl.place_on_walkable_area(7), Err(InvalidStateError::UnknownCharacter(7)));
}

/// Open room with a wall along cell column 20 (x 200..209)
fn walled_room() -> MovementController {
    let mut mask = WalkableMask::new(30, 40, 10, 10);
    for y in 0..30 {
        mask.set_cell(20, y, 1);
    }
    controller_with_mask(MovementOptions { turn_before_walking: false, ..MovementOptions::default() }, mask)
}

#[test_log::test]
fn test_walk_straight_stops_at_wall() {
    let mut ctl = walled_room();
    let id = ctl.add_character(Character::new(0, "Ego", WALK_VIEW, 105, 105, ROOM));

    assert_eq!(ctl.walk_straight(id, 305, 105, Blocking::Block), Ok(Completion::UntilIdle(id)));
    let plan = ctl.character(id).unwrap().plan.as_ref().unwrap();
    assert!(plan.is_direct());
    assert_eq!(plan.waypoints(), &[Point::new(105, 105), Point::new(199, 105)]);

    pump_until_idle(&mut ctl, id, 100);
    let ego = ctl.character(id).unwrap();
    assert_eq!(ego.position(), Point::new(199, 105));
    assert_eq!(ego.loop_index, LOOP_RIGHT);

    // Nothing in the way: straight to the point
    ctl.walk_straight(id, 120, 40, Blocking::NoBlock).unwrap();
    pump_until_idle(&mut ctl, id, 100);
    assert_eq!(ctl.character(id).unwrap().position(), Point::new(120, 40));
}

#[test_log::test]
fn test_walk_straight_stops_short_of_standing_character() {
    let mut ctl = walled_room();
    let id = ctl.add_character(Character::new(0, "Ego", WALK_VIEW, 105, 105, ROOM));
    ctl.add_character(Character::new(0, "Pal", WALK_VIEW, 150, 105, ROOM));

    ctl.walk_straight(id, 190, 105, Blocking::NoBlock).unwrap();
    pump_until_idle(&mut ctl, id, 100);
    assert_eq!(ctl.character(id).unwrap().position(), Point::new(139, 105));

    let outside = ctl.add_character(Character::new(0, "Away", WALK_VIEW, 50, 50, ROOM + 1));
    assert_eq!(
        ctl.walk_straight(outside, 60, 60, Blocking::NoBlock),
        Err(InvalidStateError::NotInActiveRoom { id: outside, room: ROOM + 1, active_room: ROOM })
    );
}

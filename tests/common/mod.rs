#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use walkcycle::catalog::{AnimationCatalog, View};
use walkcycle::config::MovementOptions;
use walkcycle::controller::MovementController;
use walkcycle::pathfinding::{GridPathfinder, Pathfinder, RouteRequest};
use walkcycle::plan::MovementPlan;
use walkcycle::walkable::WalkableMask;

pub const ROOM: i32 = 1;
pub const WALK_VIEW: usize = 0;
pub const IDLE_VIEW: usize = 1;

/// Walking view with 8 loops of 4 frames, plus a 3-frame idle view
pub fn catalog() -> AnimationCatalog {
    AnimationCatalog::new(vec![View::walking(8, 4, 0), View::walking(8, 3, 0)])
}

/// 40x30 cells of 10x10 room units, all walkable
pub fn open_mask() -> WalkableMask {
    WalkableMask::new(30, 40, 10, 10)
}

pub fn controller(options: MovementOptions) -> MovementController {
    MovementController::with_grid_pathfinder(options, catalog(), open_mask(), ROOM)
}

pub fn controller_with_mask(options: MovementOptions, mask: WalkableMask) -> MovementController {
    MovementController::with_grid_pathfinder(options, catalog(), mask, ROOM)
}

/// Step until the character stops moving; returns the number of ticks taken
pub fn pump_until_idle(controller: &mut MovementController, id: usize, max_ticks: usize) -> usize {
    let mut ticks = 0;
    while !controller.is_idle(id) {
        assert!(ticks < max_ticks, "character {} still moving after {} ticks", id, max_ticks);
        controller.step_all_characters();
        ticks += 1;
    }
    ticks
}

/// Grid pathfinder that counts how often it is asked for a route
pub struct CountingPathfinder {
    inner: GridPathfinder,
    pub calls: Rc<Cell<usize>>,
}

impl CountingPathfinder {
    pub fn new() -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let pathfinder = CountingPathfinder {
            inner: GridPathfinder::new(),
            calls: Rc::clone(&calls),
        };
        (pathfinder, calls)
    }
}

impl Pathfinder for CountingPathfinder {
    fn find_route(&self, mask: &WalkableMask, request: &RouteRequest) -> Option<MovementPlan> {
        self.calls.set(self.calls.get() + 1);
        self.inner.find_route(mask, request)
    }
}

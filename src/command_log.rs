use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::controller::{Blocking, Completion, MovementController};
use crate::error::{InvalidStateError, SaveStateError};

/// Movement requests issued to the controller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Walk with the walk cycle to (x, y)
    Walk { id: usize, x: i32, y: i32, ignore_walkable: bool },
    /// Walk in a straight line towards (x, y) up to the first obstacle
    WalkStraight { id: usize, x: i32, y: i32 },
    /// Slide to (x, y) without the walk cycle
    Move { id: usize, x: i32, y: i32, ignore_walkable: bool },
    /// Append (x, y) to the current plan
    AddWaypoint { id: usize, x: i32, y: i32 },
    /// Cancel movement
    Stop { id: usize },
    /// Turn towards (x, y)
    FaceLocation { id: usize, x: i32, y: i32 },
    /// Turn towards another character
    FaceCharacter { id: usize, other: usize },
    /// Change a cell of the walkable-area mask
    SetCell { x: i32, y: i32, blocked: bool },
}

impl Command {
    /// Issue the command without blocking
    pub fn apply(&self, controller: &mut MovementController) -> Result<Completion, InvalidStateError> {
        match *self {
            Command::Walk { id, x, y, ignore_walkable } => controller.start_walk(id, x, y, Blocking::NoBlock, ignore_walkable),
            Command::WalkStraight { id, x, y } => controller.walk_straight(id, x, y, Blocking::NoBlock),
            Command::Move { id, x, y, ignore_walkable } => controller.start_move(id, x, y, Blocking::NoBlock, ignore_walkable),
            Command::AddWaypoint { id, x, y } => controller.add_waypoint(id, x, y).map(|_| Completion::Done),
            Command::Stop { id } => controller.stop_moving(id).map(|_| Completion::Done),
            Command::FaceLocation { id, x, y } => controller.face_location(id, x, y, Blocking::NoBlock),
            Command::FaceCharacter { id, other } => controller.face_character(id, other, Blocking::NoBlock),
            Command::SetCell { x, y, blocked } => {
                controller.mask_mut().set_cell(x, y, i32::from(blocked));
                Ok(Completion::Done)
            }
        }
    }
}

/// Command with the tick it was issued at
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedCommand {
    /// Controller tick before which the command was applied
    pub tick: u64,
    pub command: Command,
}

/// Command recorder
#[derive(Clone, Debug, Default)]
pub struct CommandLog {
    commands: Vec<LoggedCommand>,
}

impl CommandLog {
    pub fn new() -> Self {
        CommandLog { commands: Vec::new() }
    }

    /// Record a command issued at `tick`
    pub fn record(&mut self, tick: u64, command: Command) {
        self.commands.push(LoggedCommand { tick, command });
    }

    /// Apply a command to the controller and record it
    pub fn issue(&mut self, controller: &mut MovementController, command: Command) -> Result<Completion, InvalidStateError> {
        let result = command.apply(controller);
        self.record(controller.tick(), command);
        result
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Save log to JSON file
    pub fn save_to_file(&self, path: &str) -> Result<(), SaveStateError> {
        let json = serde_json::to_string_pretty(&self.commands)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a log saved with [`CommandLog::save_to_file`]
    pub fn load_from_file(path: &str) -> Result<Self, SaveStateError> {
        let json = fs::read_to_string(path)?;
        let commands = serde_json::from_str(&json)?;
        Ok(CommandLog { commands })
    }

    /// Replay the log on a controller up to (not including) `until_tick`.
    ///
    /// Commands are applied at the tick they were recorded at, before that
    /// tick is stepped. Returns the number of commands the controller rejected.
    pub fn replay(&self, controller: &mut MovementController, until_tick: u64) -> usize {
        let mut rejected = 0;
        let mut next = 0;
        while controller.tick() < until_tick {
            while let Some(logged) = self.commands.get(next) {
                if logged.tick > controller.tick() {
                    break;
                }
                if let Err(e) = logged.command.apply(controller) {
                    warn!("Replayed command {:?} at tick {} was rejected: {}", logged.command, logged.tick, e);
                    rejected += 1;
                }
                next += 1;
            }
            controller.step_all_characters();
        }
        rejected
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let mut walks = 0;
        let mut moves = 0;
        let mut waypoints = 0;
        let mut stops = 0;
        let mut faces = 0;
        let mut cell_changes = 0;

        for logged in &self.commands {
            match logged.command {
                Command::Walk { .. } | Command::WalkStraight { .. } => walks += 1,
                Command::Move { .. } => moves += 1,
                Command::AddWaypoint { .. } => waypoints += 1,
                Command::Stop { .. } => stops += 1,
                Command::FaceLocation { .. } | Command::FaceCharacter { .. } => faces += 1,
                Command::SetCell { .. } => cell_changes += 1,
            }
        }

        let last_tick = self.commands.last().map_or(0, |c| c.tick);

        format!(
            "Last command at tick {}\n\
             Total Commands: {}\n\
             Movement: {} walks, {} moves, {} waypoints, {} stops, {} facing\n\
             Walkable Area Changes: {}",
            last_tick,
            self.commands.len(),
            walks,
            moves,
            waypoints,
            stops,
            faces,
            cell_changes
        )
    }
}

use serde::{Deserialize, Serialize};
use std::fs;

use crate::character::Character;
use crate::controller::MovementController;
use crate::error::SaveStateError;
use crate::walkable::WalkableMask;

/// Snapshot of everything the controller mutates, enough to resume a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveState {
    /// Ticks simulated when the snapshot was taken
    pub tick: u64,
    pub active_room: i32,
    /// Walkable areas of the active room
    pub mask: WalkableMask,
    /// Characters with their plans and per-tick counters
    pub characters: Vec<Character>,
}

impl SaveState {
    /// Take a snapshot of a controller
    pub fn capture(controller: &MovementController) -> Self {
        SaveState {
            tick: controller.tick(),
            active_room: controller.active_room(),
            mask: controller.mask().clone(),
            characters: controller.characters().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, SaveStateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SaveStateError> {
        let state: SaveState = serde_json::from_str(json)?;
        state.check_mask()?;
        Ok(state)
    }

    fn check_mask(&self) -> Result<(), SaveStateError> {
        if self.mask.is_consistent() {
            return Ok(());
        }
        Err(SaveStateError::InvalidMask {
            rows: self.mask.rows,
            cols: self.mask.cols,
            found: self.mask.cells.len(),
        })
    }

    /// Save to file
    pub fn save_to_file(&self, path: &str) -> Result<(), SaveStateError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load from file
    pub fn load_from_file(path: &str) -> Result<Self, SaveStateError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Put the snapshot back into a controller, replacing its characters.
    /// A snapshot with a broken mask leaves the controller untouched.
    pub fn restore_into(self, controller: &mut MovementController) -> Result<(), SaveStateError> {
        self.check_mask()?;
        *controller.mask_mut() = self.mask;
        controller.restore(self.characters, self.tick, self.active_room);
        Ok(())
    }
}

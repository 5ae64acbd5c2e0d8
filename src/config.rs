use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::direction::DirectionStrategy;
use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub movement: MovementOptions,
    #[serde(default)]
    pub room: RoomConfig,
    #[serde(default)]
    pub characters: CharactersConfig,
    #[serde(default)]
    pub visual: VisualConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Game-wide movement switches, read by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementOptions {
    /// Characters may use their diagonal loops
    #[serde(default = "default_true")]
    pub diagonal_walking: bool,
    /// Turn through neighbouring loops when a walk changes direction
    #[serde(default = "default_true")]
    pub turn_before_walking: bool,
    /// Turn through neighbouring loops when facing a location
    #[serde(default = "default_true")]
    pub turn_before_facing: bool,
    /// Version of the loaded game data; 32 and below use the legacy loop rules
    #[serde(default = "default_data_version")]
    pub data_version: u32,
    /// Ticks per second
    #[serde(default = "default_game_speed")]
    pub game_speed: i32,
    /// Room units per pathfinding unit
    #[serde(default = "default_path_resolution")]
    pub path_resolution: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomConfig {
    #[serde(default = "default_cols")]
    pub cols: i32,
    #[serde(default = "default_rows")]
    pub rows: i32,
    #[serde(default = "default_cell_width")]
    pub cell_width: i32,
    #[serde(default = "default_cell_height")]
    pub cell_height: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharactersConfig {
    #[serde(default = "default_walk_speed")]
    pub walk_speed: i32,
    #[serde(default = "default_anim_speed")]
    pub anim_speed: i32,
    #[serde(default)]
    pub blocking_width: i32,
    #[serde(default)]
    pub blocking_height: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_bg_r")]
    pub background_r: u8,
    #[serde(default = "default_bg_g")]
    pub background_g: u8,
    #[serde(default = "default_bg_b")]
    pub background_b: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_enable_command_log")]
    pub enable_command_log: bool,
    #[serde(default = "default_command_log_path")]
    pub command_log_path: String,
}

// Default values
fn default_true() -> bool { true }
fn default_data_version() -> u32 { 50 }
fn default_game_speed() -> i32 { 40 }
fn default_path_resolution() -> i32 { 1 }
fn default_cols() -> i32 { 32 }
fn default_rows() -> i32 { 24 }
fn default_cell_width() -> i32 { 10 }
fn default_cell_height() -> i32 { 10 }
fn default_walk_speed() -> i32 { 3 }
fn default_anim_speed() -> i32 { 5 }
fn default_window_title() -> String { "Walkcycle - Character Movement Demo".to_string() }
fn default_bg_r() -> u8 { 30 }
fn default_bg_g() -> u8 { 30 }
fn default_bg_b() -> u8 { 30 }
fn default_enable_command_log() -> bool { true }
fn default_command_log_path() -> String { "command_log.json".to_string() }

impl Default for MovementOptions {
    fn default() -> Self {
        Self {
            diagonal_walking: true,
            turn_before_walking: true,
            turn_before_facing: true,
            data_version: default_data_version(),
            game_speed: default_game_speed(),
            path_resolution: default_path_resolution(),
        }
    }
}

impl MovementOptions {
    /// Loop selection rules for the loaded game data
    pub fn strategy(&self) -> DirectionStrategy {
        DirectionStrategy::for_data_version(self.data_version)
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
        }
    }
}

impl Default for CharactersConfig {
    fn default() -> Self {
        Self {
            walk_speed: default_walk_speed(),
            anim_speed: default_anim_speed(),
            blocking_width: 0,
            blocking_height: 0,
        }
    }
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            background_r: default_bg_r(),
            background_g: default_bg_g(),
            background_b: default_bg_b(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_command_log: default_enable_command_log(),
            command_log_path: default_command_log_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            movement: MovementOptions::default(),
            room: RoomConfig::default(),
            characters: CharactersConfig::default(),
            visual: VisualConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse a configuration file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Self {
        match fs::read_to_string("config.toml") {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from config.toml");
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config.toml: {}", e);
                    warn!("Using default configuration");
                    Config::default()
                }
            },
            Err(_) => {
                info!("No config.toml found, using default configuration");
                Config::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.movement, MovementOptions::default());
        assert_eq!(config.movement.game_speed, 40);
        assert_eq!(config.room.cols, 32);
        assert_eq!(config.characters.walk_speed, 3);
        assert!(config.logging.enable_command_log);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml_str(
            r#"
            [movement]
            diagonal_walking = false
            data_version = 32

            [room]
            cols = 10
            "#,
        )
        .unwrap();
        assert!(!config.movement.diagonal_walking);
        assert!(config.movement.turn_before_walking);
        assert_eq!(config.movement.strategy(), DirectionStrategy::Legacy);
        assert_eq!(config.room.cols, 10);
        assert_eq!(config.room.rows, 24);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = Config::from_toml_str("[movement]\ngame_speed = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}

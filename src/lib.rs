pub mod catalog;
pub mod character;
pub mod collision;
pub mod command_log;
pub mod config;
pub mod controller;
pub mod direction;
pub mod error;
pub mod pathfinding;
pub mod plan;
pub mod save_state;
pub mod throttle;
pub mod turning;
pub mod walkable;

pub use catalog::{AnimationCatalog, Frame, Loop, View};
pub use character::{Character, CharacterFlags, MovementState};
pub use config::{Config, MovementOptions};
pub use controller::{Blocking, Completion, MovementController, StepOutcome};
pub use error::{ConfigError, InvalidStateError, SaveStateError};
pub use pathfinding::{GridPathfinder, Pathfinder, Point, RouteRequest};
pub use plan::{MovementPlan, WalkSpeed};
pub use walkable::WalkableMask;

pub mod backend;
pub mod constants;
pub mod events;
pub mod ground_sensor;
pub mod input;
pub mod locomotion;
pub mod physics;
pub mod player;
pub mod scenario;
pub mod tether;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::PhysicsBackend;
pub use events::{EventQueue, PlayerEvent};
pub use input::InputEvent;
pub use physics::PhysicsWorld;
pub use player::{Player, StepReport};
pub use scenario::{run_scenario, Scenario, ScenarioError, ScenarioRun};
pub use tether::{RopeRenderFrame, TetherRig};

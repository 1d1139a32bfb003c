//! Headless scripted runs: a static level, a spawn point and timed inputs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use super::constants::physics as consts;
use super::events::PlayerEvent;
use super::input::InputEvent;
use super::physics::PhysicsWorld;
use super::player::{Player, StepReport};
use crate::config::PlayerConfig;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid scenario value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Environment cuboid.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Block {
    pub center: [f32; 3],
    pub size: [f32; 3],
}

/// Input delivered just before the given step (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TimedInput {
    pub step: u64,
    pub event: InputEvent,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Feet position of the player at step 0.
    pub spawn: [f32; 3],
    pub steps: u64,
    pub dt: f32,
    pub gravity: f32,
    pub blocks: Vec<Block>,
    pub inputs: Vec<TimedInput>,
}

impl Default for Scenario {
    /// A flat floor with its top surface at y = 0 and nothing pressed.
    fn default() -> Self {
        Self {
            spawn: [0.0, 0.0, 0.0],
            steps: 120,
            dt: consts::TIMESTEP,
            gravity: consts::DEFAULT_GRAVITY,
            blocks: vec![Block {
                center: [0.0, -0.5, 0.0],
                size: [200.0, 1.0, 20.0],
            }],
            inputs: Vec::new(),
        }
    }
}

impl Scenario {
    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario: Scenario = toml::from_str(&content).map_err(|source| ScenarioError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ScenarioError::Invalid {
                field: "dt",
                reason: format!("must be positive, got {}", self.dt),
            });
        }
        if !self.gravity.is_finite() {
            return Err(ScenarioError::Invalid {
                field: "gravity",
                reason: "must be finite".to_string(),
            });
        }
        if self.spawn.iter().any(|v| !v.is_finite()) {
            return Err(ScenarioError::Invalid {
                field: "spawn",
                reason: "must be finite".to_string(),
            });
        }
        for block in &self.blocks {
            if block.size.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
                return Err(ScenarioError::Invalid {
                    field: "blocks.size",
                    reason: format!("extents must be positive, got {:?}", block.size),
                });
            }
        }
        Ok(())
    }
}

/// Everything a run produced, in step order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioRun {
    pub reports: Vec<StepReport>,
    /// Events paired with the step that emitted them.
    pub events: Vec<(u64, PlayerEvent)>,
}

/// Builds the world, spawns the player and runs every step of the scenario.
pub fn run_scenario(config: &PlayerConfig, scenario: &Scenario) -> ScenarioRun {
    let mut world = PhysicsWorld::new();
    world.set_gravity(scenario.gravity);
    for block in &scenario.blocks {
        world.add_static_block(block.center, block.size);
    }
    let body = world.add_player(scenario.spawn, config.body.radius, config.body.height);
    let mut player = Player::new(&mut world, body, config);
    world.refresh_queries();
    debug!(blocks = scenario.blocks.len(), steps = scenario.steps, "scenario world built");

    let mut inputs: Vec<TimedInput> = scenario.inputs.clone();
    inputs.sort_by_key(|input| input.step);
    let mut pending = inputs.into_iter().peekable();

    let mut run = ScenarioRun::default();
    for step in 1..=scenario.steps {
        while let Some(input) = pending.next_if(|input| input.step <= step) {
            player.push_input(input.event);
        }
        let report = player.step(&mut world, scenario.dt);
        world.step(scenario.dt);
        run.reports.push(report);
        run.events
            .extend(player.drain_events().into_iter().map(|event| (step, event)));
    }

    let final_position = run.reports.last().map(|r| r.position);
    info!(steps = scenario.steps, events = run.events.len(), ?final_position, "scenario finished");
    player.despawn(&mut world);
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_scenario() {
        let toml_str = r#"
spawn = [1.0, 0.0, 0.0]
steps = 30

[[blocks]]
center = [0.0, -0.5, 0.0]
size = [50.0, 1.0, 10.0]

[[inputs]]
step = 5
event = { type = "move", axis = 1.0 }

[[inputs]]
step = 10
event = { type = "jump_pressed" }
"#;
        let scenario: Scenario = toml::from_str(toml_str).unwrap();
        assert_eq!(scenario.spawn, [1.0, 0.0, 0.0]);
        assert_eq!(scenario.steps, 30);
        assert_eq!(scenario.dt, consts::TIMESTEP);
        assert_eq!(scenario.blocks.len(), 1);
        assert_eq!(scenario.inputs[0].event, InputEvent::Move { axis: 1.0 });
        assert_eq!(scenario.inputs[1].event, InputEvent::JumpPressed);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_dt() {
        let scenario = Scenario {
            dt: 0.0,
            ..Scenario::default()
        };
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::Invalid { field: "dt", .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "steps = 7").unwrap();
        let scenario = Scenario::from_file(file.path()).unwrap();
        assert_eq!(scenario.steps, 7);
        assert_eq!(scenario.blocks, Scenario::default().blocks);
    }

    #[test]
    fn test_from_file_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "steps = \"many\"").unwrap();
        assert!(matches!(
            Scenario::from_file(file.path()),
            Err(ScenarioError::Parse { .. })
        ));
    }

    #[test]
    fn test_run_reports_every_step() {
        let scenario = Scenario {
            steps: 20,
            ..Scenario::default()
        };
        let run = run_scenario(&PlayerConfig::default(), &scenario);
        assert_eq!(run.reports.len(), 20);
        assert_eq!(run.reports[19].step, 20);
        assert!(run.reports[19].grounded);
        assert!(run
            .events
            .iter()
            .any(|(_, e)| matches!(e, PlayerEvent::GroundedChanged { grounded: true, .. })));
    }
}

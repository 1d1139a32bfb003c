//! Player configuration parsing from TOML files.
//!
//! Every tunable is loaded once before the entity starts simulating and is
//! immutable afterwards. Out-of-range values are configuration defects and are
//! rejected here, never at simulation time.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Capsule dimensions of the player body.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub radius: f32,
    /// Total capsule height, feet to head.
    pub height: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            height: 2.0,
        }
    }
}

/// Walk, jump and gravity tuning.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    pub max_speed: f32,
    pub acceleration: f32,
    pub ground_deceleration: f32,
    pub air_deceleration: f32,
    pub jump_power: f32,
    pub max_fall_speed: f32,
    pub fall_acceleration: f32,
    /// Gravity multiplier applied while an ascent was cut short.
    pub jump_end_early_gravity_modifier: f32,
    pub coyote_time: f32,
    pub jump_buffer: f32,
    /// Probe distance of the ground and ceiling sweeps.
    pub grounder_distance: f32,
    /// Vertical velocity held while standing; must be <= 0.
    pub grounding_force: f32,
    pub input_dead_zone: f32,
    /// Slerp factor per second used to turn toward the facing direction.
    pub turn_speed: f32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            max_speed: 14.0,
            acceleration: 120.0,
            ground_deceleration: 60.0,
            air_deceleration: 30.0,
            jump_power: 12.0,
            max_fall_speed: 20.0,
            fall_acceleration: 50.0,
            jump_end_early_gravity_modifier: 3.0,
            coyote_time: 0.15,
            jump_buffer: 0.2,
            grounder_distance: 0.1,
            grounding_force: -1.5,
            input_dead_zone: 0.01,
            turn_speed: 20.0,
        }
    }
}

/// Fuel-limited thrust. Present only when the jetpack is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct JetpackConfig {
    pub jetpack_force: f32,
    pub max_rise_speed: f32,
    /// Fuel capacity in seconds of thrust.
    pub max_fuel: f32,
    /// Fuel regained per second while grounded and idle.
    pub fuel_recovery: f32,
    pub horizontal_thrust: f32,
}

impl Default for JetpackConfig {
    fn default() -> Self {
        Self {
            jetpack_force: 160.0,
            max_rise_speed: 15.0,
            max_fuel: 2.0,
            fuel_recovery: 0.5,
            horizontal_thrust: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CrouchConfig {
    pub crouch_height: f32,
    pub crouch_speed_multiplier: f32,
}

impl Default for CrouchConfig {
    fn default() -> Self {
        Self {
            crouch_height: 1.2,
            crouch_speed_multiplier: 0.5,
        }
    }
}

/// Rope structure, spring constants and the renderer passthrough values.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    /// Number of rope nodes, not counting the player attachment point.
    pub node_count: usize,
    /// Rest length of each node-to-node spring.
    pub node_spacing: f32,
    pub node_mass: f32,
    pub node_damping: f32,
    pub spring_strength: f32,
    pub spring_damper: f32,
    pub collider_radius: f32,
    pub player_anchor_offset: [f32; 3],
    pub player_spring_strength: f32,
    pub player_spring_damper: f32,
    pub line_width: f32,
    pub color: [f32; 4],
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            node_count: 20,
            node_spacing: 0.5,
            node_mass: 0.1,
            node_damping: 1.0,
            spring_strength: 1000.0,
            spring_damper: 0.2,
            collider_radius: 0.2,
            player_anchor_offset: [0.0, 1.0, 0.0],
            player_spring_strength: 100.0,
            player_spring_damper: 0.2,
            line_width: 0.1,
            color: [1.0, 1.0, 0.0, 1.0],
        }
    }
}

/// Full player configuration. Optional sections gate the optional
/// sub-systems: a missing `[jetpack]`, `[crouch]` or `[tether]` table
/// disables that sub-system.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub body: BodyConfig,
    pub motor: MotorConfig,
    pub jetpack: Option<JetpackConfig>,
    pub crouch: Option<CrouchConfig>,
    pub tether: Option<TetherConfig>,
}

impl PlayerConfig {
    /// Default tuning with every optional sub-system enabled.
    pub fn full() -> Self {
        Self {
            jetpack: Some(JetpackConfig::default()),
            crouch: Some(CrouchConfig::default()),
            tether: Some(TetherConfig::default()),
            ..Self::default()
        }
    }

    /// Load and validate a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration held in memory.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configuration defects before the entity starts simulating.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let body = &self.body;
        positive("body.radius", body.radius)?;
        positive("body.height", body.height)?;
        if body.height < 2.0 * body.radius {
            return Err(invalid("body.height", "must be at least twice body.radius"));
        }

        let m = &self.motor;
        positive("motor.max_speed", m.max_speed)?;
        non_negative("motor.acceleration", m.acceleration)?;
        non_negative("motor.ground_deceleration", m.ground_deceleration)?;
        non_negative("motor.air_deceleration", m.air_deceleration)?;
        non_negative("motor.jump_power", m.jump_power)?;
        positive("motor.max_fall_speed", m.max_fall_speed)?;
        non_negative("motor.fall_acceleration", m.fall_acceleration)?;
        non_negative(
            "motor.jump_end_early_gravity_modifier",
            m.jump_end_early_gravity_modifier,
        )?;
        non_negative("motor.coyote_time", m.coyote_time)?;
        non_negative("motor.jump_buffer", m.jump_buffer)?;
        positive("motor.grounder_distance", m.grounder_distance)?;
        finite("motor.grounding_force", m.grounding_force)?;
        if m.grounding_force > 0.0 {
            return Err(invalid("motor.grounding_force", "must not point upward"));
        }
        non_negative("motor.input_dead_zone", m.input_dead_zone)?;
        if m.input_dead_zone >= 1.0 {
            return Err(invalid("motor.input_dead_zone", "must be below 1"));
        }
        non_negative("motor.turn_speed", m.turn_speed)?;

        if let Some(j) = &self.jetpack {
            non_negative("jetpack.jetpack_force", j.jetpack_force)?;
            positive("jetpack.max_rise_speed", j.max_rise_speed)?;
            non_negative("jetpack.max_fuel", j.max_fuel)?;
            non_negative("jetpack.fuel_recovery", j.fuel_recovery)?;
            non_negative("jetpack.horizontal_thrust", j.horizontal_thrust)?;
        }

        if let Some(c) = &self.crouch {
            positive("crouch.crouch_height", c.crouch_height)?;
            if c.crouch_height <= 2.0 * body.radius || c.crouch_height > body.height {
                return Err(invalid(
                    "crouch.crouch_height",
                    "must lie between twice body.radius and body.height",
                ));
            }
            non_negative("crouch.crouch_speed_multiplier", c.crouch_speed_multiplier)?;
            if c.crouch_speed_multiplier > 1.0 {
                return Err(invalid("crouch.crouch_speed_multiplier", "must not exceed 1"));
            }
        }

        if let Some(t) = &self.tether {
            if t.node_count == 0 {
                return Err(invalid("tether.node_count", "must be positive"));
            }
            positive("tether.node_spacing", t.node_spacing)?;
            positive("tether.node_mass", t.node_mass)?;
            non_negative("tether.node_damping", t.node_damping)?;
            non_negative("tether.spring_strength", t.spring_strength)?;
            non_negative("tether.spring_damper", t.spring_damper)?;
            positive("tether.collider_radius", t.collider_radius)?;
            for (axis, v) in t.player_anchor_offset.iter().enumerate() {
                if !v.is_finite() {
                    return Err(invalid(
                        "tether.player_anchor_offset",
                        &format!("component {axis} is not finite"),
                    ));
                }
            }
            non_negative("tether.player_spring_strength", t.player_spring_strength)?;
            non_negative("tether.player_spring_damper", t.player_spring_damper)?;
            non_negative("tether.line_width", t.line_width)?;
        }

        Ok(())
    }
}

/// Errors that can occur when loading player configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, "must be finite"))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be positive"))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must not be negative"))
    }
}

//! Simulation constants shared by the physics world and the player systems.

/// Physics constants
pub mod physics {
    /// World gravity in m/s², felt by rope nodes only. The player body has a
    /// zero gravity scale because locomotion integrates its own fall.
    pub const DEFAULT_GRAVITY: f32 = 9.81;

    /// Fixed timestep for the simulation (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;
}

/// Ground and ceiling probe geometry
pub mod sensor {
    /// Probe sphere radius relative to the capsule radius. Slightly smaller so
    /// walls touching the capsule side do not register as ground.
    pub const PROBE_RADIUS_SCALE: f32 = 0.9;
}

/// Facing yaw targets, radians
pub mod facing {
    pub const RIGHT_YAW: f32 = std::f32::consts::FRAC_PI_2;
    pub const LEFT_YAW: f32 = -std::f32::consts::FRAC_PI_2;
}

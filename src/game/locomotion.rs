use nalgebra::Vector3;
use tracing::{debug, trace};

use super::constants::facing as facing_consts;
use super::events::{EventQueue, PlayerEvent};
use super::ground_sensor::ContactSample;
use super::input::InputFrame;
use crate::config::{JetpackConfig, MotorConfig};

/// Per-entity motion state. Owned exclusively by [`Locomotion`].
#[derive(Debug, Clone, PartialEq)]
pub struct MotionState {
    pub grounded: bool,
    /// Simulation time of the last grounded -> airborne transition.
    pub time_left_ground: f32,
    pub jump_requested: bool,
    /// Simulation time of the last unspent jump press.
    pub jump_request_time: f32,
    pub coyote_available: bool,
    pub buffered_jump_available: bool,
    pub ended_jump_early: bool,
    pub jetpack_active: bool,
    pub jetpack_fuel: f32,
    pub frame_velocity: Vector3<f32>,
    pub facing_right: bool,
    /// Smoothed yaw committed to the body, radians.
    pub yaw: f32,
    pub crouching: bool,
}

impl MotionState {
    fn new(fuel: f32) -> Self {
        Self {
            grounded: false,
            time_left_ground: f32::NEG_INFINITY,
            jump_requested: false,
            jump_request_time: f32::NEG_INFINITY,
            coyote_available: false,
            buffered_jump_available: false,
            ended_jump_early: false,
            jetpack_active: false,
            jetpack_fuel: fuel,
            frame_velocity: Vector3::zeros(),
            facing_right: true,
            yaw: facing_consts::RIGHT_YAW,
            crouching: false,
        }
    }
}

/// Rate-limited approach that never overshoots `target`.
pub fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

/// Grounded/airborne state machine with jump timing windows, variable jump
/// height and an optional fuel-limited jetpack.
///
/// One call to [`Locomotion::tick`] runs the fixed order
/// sense -> jump -> horizontal -> gravity/jetpack -> facing and returns the
/// velocity to commit to the body.
#[derive(Debug, Clone)]
pub struct Locomotion {
    motor: MotorConfig,
    jetpack: Option<JetpackConfig>,
    crouch_speed_multiplier: f32,
    state: MotionState,
    time: f32,
    move_axis: f32,
    jumped_this_step: bool,
}

impl Locomotion {
    pub fn new(motor: MotorConfig, jetpack: Option<JetpackConfig>, crouch_speed_multiplier: f32) -> Self {
        let fuel = jetpack.map(|j| j.max_fuel).unwrap_or(0.0);
        Self {
            motor,
            jetpack,
            crouch_speed_multiplier,
            state: MotionState::new(fuel),
            time: 0.0,
            move_axis: 0.0,
            jumped_this_step: false,
        }
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    /// Accumulated simulation time, seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_crouching(&mut self, crouching: bool) {
        self.state.crouching = crouching;
    }

    pub fn has_buffered_jump(&self) -> bool {
        self.state.buffered_jump_available
            && self.time < self.state.jump_request_time + self.motor.jump_buffer
    }

    pub fn can_use_coyote(&self) -> bool {
        self.state.coyote_available
            && !self.state.grounded
            && self.time < self.state.time_left_ground + self.motor.coyote_time
    }

    /// Advances one fixed step and returns the velocity to commit.
    pub fn tick(
        &mut self,
        dt: f32,
        contact: ContactSample,
        input: &InputFrame,
        events: &mut EventQueue,
    ) -> Vector3<f32> {
        self.time += dt;
        self.jumped_this_step = false;
        self.move_axis = input.move_axis;
        if input.jump_pressed {
            self.press_jump();
        }

        self.check_collisions(contact, events);
        self.handle_jump(events);
        if input.jump_released {
            self.release_jump(events);
        }
        self.handle_horizontal(dt);
        self.handle_vertical(dt, events);
        self.handle_facing(dt);

        trace!(
            time = self.time,
            vx = self.state.frame_velocity.x,
            vy = self.state.frame_velocity.y,
            grounded = self.state.grounded,
            "locomotion tick"
        );
        self.state.frame_velocity
    }

    fn press_jump(&mut self) {
        self.state.jump_requested = true;
        self.state.jump_request_time = self.time;
    }

    fn release_jump(&mut self, events: &mut EventQueue) {
        if self.state.jetpack_active {
            self.set_jetpack(false, events);
            return;
        }
        if !self.state.grounded && self.state.frame_velocity.y > 0.0 {
            self.state.ended_jump_early = true;
        }
    }

    fn check_collisions(&mut self, contact: ContactSample, events: &mut EventQueue) {
        if contact.ceiling {
            self.state.frame_velocity.y = self.state.frame_velocity.y.min(0.0);
        }

        if !self.state.grounded && contact.ground {
            let impact_speed = self.state.frame_velocity.y.abs();
            self.state.grounded = true;
            self.state.coyote_available = true;
            self.state.buffered_jump_available = true;
            self.state.ended_jump_early = false;
            if self.state.jetpack_active {
                self.set_jetpack(false, events);
            }
            debug!(time = self.time, impact_speed, "landed");
            events.push(PlayerEvent::GroundedChanged {
                grounded: true,
                impact_speed,
            });
        } else if self.state.grounded && !contact.ground {
            self.state.grounded = false;
            self.state.time_left_ground = self.time;
            debug!(time = self.time, "left ground");
            events.push(PlayerEvent::GroundedChanged {
                grounded: false,
                impact_speed: 0.0,
            });
        }
    }

    fn handle_jump(&mut self, events: &mut EventQueue) {
        let fresh_press = self.state.jump_requested;
        if !fresh_press && !self.has_buffered_jump() {
            return;
        }

        if self.state.grounded || self.can_use_coyote() {
            self.execute_jump(events);
        } else if fresh_press {
            self.try_activate_jetpack(events);
        }

        self.state.jump_requested = false;
    }

    fn execute_jump(&mut self, events: &mut EventQueue) {
        let coyote = !self.state.grounded;
        self.state.ended_jump_early = false;
        self.state.jump_request_time = f32::NEG_INFINITY;
        self.state.buffered_jump_available = false;
        self.state.coyote_available = false;
        self.state.jump_requested = false;
        self.state.frame_velocity.y = self.motor.jump_power;
        self.jumped_this_step = true;
        debug!(time = self.time, coyote, "jumped");
        events.push(PlayerEvent::Jumped);
    }

    /// An airborne press that cannot jump spends itself on the jetpack when
    /// fuel remains. Without fuel the press stays latched as a buffered jump.
    fn try_activate_jetpack(&mut self, events: &mut EventQueue) {
        if self.jetpack.is_none() || self.state.jetpack_active || self.state.jetpack_fuel <= 0.0 {
            return;
        }
        self.state.jump_request_time = f32::NEG_INFINITY;
        self.set_jetpack(true, events);
    }

    fn set_jetpack(&mut self, active: bool, events: &mut EventQueue) {
        if self.state.jetpack_active == active {
            return;
        }
        self.state.jetpack_active = active;
        debug!(time = self.time, active, fuel = self.state.jetpack_fuel, "jetpack");
        events.push(PlayerEvent::JetpackChanged { active });
    }

    fn handle_horizontal(&mut self, dt: f32) {
        let axis = self.move_axis;
        let velocity = &mut self.state.frame_velocity;

        if axis.abs() < self.motor.input_dead_zone {
            let deceleration = if self.state.grounded {
                self.motor.ground_deceleration
            } else {
                self.motor.air_deceleration
            };
            velocity.x = move_toward(velocity.x, 0.0, deceleration * dt);
        } else {
            let multiplier = if self.state.crouching {
                self.crouch_speed_multiplier
            } else {
                1.0
            };
            let target = axis * self.motor.max_speed * multiplier;
            velocity.x = move_toward(velocity.x, target, self.motor.acceleration * dt);

            if let Some(jetpack) = &self.jetpack {
                if self.state.jetpack_active {
                    velocity.x += axis * jetpack.horizontal_thrust * dt;
                }
            }
        }

        // 2.5D: the depth axis never moves.
        velocity.z = 0.0;
    }

    fn handle_vertical(&mut self, dt: f32, events: &mut EventQueue) {
        if self.jumped_this_step {
            return;
        }

        if let Some(jetpack) = self.jetpack {
            if self.state.jetpack_active {
                self.state.frame_velocity.y = move_toward(
                    self.state.frame_velocity.y,
                    jetpack.max_rise_speed,
                    jetpack.jetpack_force * dt,
                );
                self.state.jetpack_fuel = (self.state.jetpack_fuel - dt).max(0.0);
                if self.state.jetpack_fuel <= 0.0 {
                    self.set_jetpack(false, events);
                }
                return;
            }
        }

        let velocity = &mut self.state.frame_velocity;
        if self.state.grounded && velocity.y <= 0.0 {
            velocity.y = self.motor.grounding_force;
        } else {
            let mut gravity = self.motor.fall_acceleration;
            if self.state.ended_jump_early && velocity.y > 0.0 {
                gravity *= self.motor.jump_end_early_gravity_modifier;
            }
            velocity.y = move_toward(velocity.y, -self.motor.max_fall_speed, gravity * dt);
        }

        if let Some(jetpack) = self.jetpack {
            if self.state.grounded {
                self.state.jetpack_fuel =
                    (self.state.jetpack_fuel + jetpack.fuel_recovery * dt).min(jetpack.max_fuel);
            }
        }
    }

    fn handle_facing(&mut self, dt: f32) {
        if self.move_axis.abs() >= self.motor.input_dead_zone {
            let face_right = self.move_axis > 0.0;
            if face_right != self.state.facing_right {
                self.state.facing_right = face_right;
                debug!(time = self.time, face_right, "facing flipped");
            }
        }

        let target = if self.state.facing_right {
            facing_consts::RIGHT_YAW
        } else {
            facing_consts::LEFT_YAW
        };
        let blend = (self.motor.turn_speed * dt).min(1.0);
        self.state.yaw += (target - self.state.yaw) * blend;
    }
}

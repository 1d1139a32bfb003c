use nalgebra::Vector3;
use serde::Serialize;
use tracing::{debug, trace};

use super::backend::PhysicsBackend;
use super::events::{EventQueue, PlayerEvent};
use super::ground_sensor::GroundSensor;
use super::input::{InputEvent, InputLatch};
use super::locomotion::Locomotion;
use super::tether::{RopeRenderFrame, TetherRig};
use crate::config::{BodyConfig, CrouchConfig, PlayerConfig};

/// Snapshot of one step, emitted after the velocity has been committed and
/// before the solver integrates it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub step: u64,
    pub time: f32,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub grounded: bool,
    pub fuel: f32,
    pub jetpack_active: bool,
    pub crouching: bool,
    pub facing_right: bool,
    pub yaw: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rope: Option<RopeRenderFrame>,
}

/// A controllable capsule: sensor, locomotion and the optional crouch and
/// tether sub-systems wired around one physics body.
#[derive(Debug)]
pub struct Player<B: PhysicsBackend> {
    body: B::Body,
    body_config: BodyConfig,
    sensor: GroundSensor,
    locomotion: Locomotion,
    crouch: Option<CrouchConfig>,
    /// Desired crouch state; standing up waits for headroom.
    crouch_wanted: bool,
    tether: Option<TetherRig<B>>,
    input: InputLatch,
    events: EventQueue,
    steps: u64,
}

impl<B: PhysicsBackend> Player<B> {
    /// Wraps an already spawned capsule body whose origin sits at the feet.
    pub fn new(backend: &mut B, body: B::Body, config: &PlayerConfig) -> Self {
        let crouch_multiplier = config
            .crouch
            .map(|c| c.crouch_speed_multiplier)
            .unwrap_or(1.0);
        let locomotion = Locomotion::new(config.motor, config.jetpack, crouch_multiplier);
        backend.set_body_yaw(body, locomotion.state().yaw);

        Self {
            body,
            body_config: config.body,
            sensor: GroundSensor::new(
                config.body.radius,
                config.body.height,
                config.motor.grounder_distance,
            ),
            locomotion,
            crouch: config.crouch,
            crouch_wanted: false,
            tether: config.tether.map(TetherRig::new),
            input: InputLatch::new(),
            events: EventQueue::new(),
            steps: 0,
        }
    }

    pub fn body(&self) -> B::Body {
        self.body
    }

    pub fn tether(&self) -> Option<&TetherRig<B>> {
        self.tether.as_ref()
    }

    pub fn is_crouching(&self) -> bool {
        self.locomotion.state().crouching
    }

    /// Latches an input event for the next step.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Takes every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        self.events.drain()
    }

    /// Runs one fixed step: latch, sense, locomotion, commit, crouch, tether,
    /// render. The caller steps the solver afterwards.
    pub fn step(&mut self, backend: &mut B, dt: f32) -> StepReport {
        self.steps += 1;
        let frame = self.input.take_frame();
        let contact = self.sensor.probe(backend, self.body);

        let velocity = self.locomotion.tick(dt, contact, &frame, &mut self.events);
        backend.set_body_velocity(self.body, velocity);
        backend.set_body_yaw(self.body, self.locomotion.state().yaw);

        if frame.crouch_toggle && self.crouch.is_some() {
            self.crouch_wanted = !self.crouch_wanted;
        }
        self.apply_crouch(backend);

        if frame.tether_toggle {
            if let Some(rig) = &mut self.tether {
                let deployed = rig.toggle(backend, self.body);
                self.events.push(PlayerEvent::TetherChanged { deployed });
            }
        }

        let rope = self
            .tether
            .as_ref()
            .map(|rig| rig.render_frame(backend, self.body));
        let position = backend.body_position(self.body).unwrap_or_else(Vector3::zeros);
        let state = self.locomotion.state();
        trace!(step = self.steps, ?position, ?velocity, "player step");

        StepReport {
            step: self.steps,
            time: self.locomotion.time(),
            position: [position.x, position.y, position.z],
            velocity: [velocity.x, velocity.y, velocity.z],
            grounded: state.grounded,
            fuel: state.jetpack_fuel,
            jetpack_active: state.jetpack_active,
            crouching: state.crouching,
            facing_right: state.facing_right,
            yaw: state.yaw,
            rope,
        }
    }

    fn apply_crouch(&mut self, backend: &mut B) {
        let Some(crouch) = self.crouch else {
            return;
        };
        let crouching = self.locomotion.state().crouching;
        if self.crouch_wanted == crouching {
            return;
        }

        let height = if self.crouch_wanted {
            crouch.crouch_height
        } else {
            let extra = self.body_config.height - crouch.crouch_height;
            if !self.sensor.has_headroom(backend, self.body, extra) {
                trace!("stand blocked by ceiling");
                return;
            }
            self.body_config.height
        };

        backend.resize_capsule(self.body, self.body_config.radius, height);
        self.sensor.set_height(height);
        self.locomotion.set_crouching(self.crouch_wanted);
        self.events.push(PlayerEvent::CrouchChanged {
            crouching: self.crouch_wanted,
        });
        debug!(crouching = self.crouch_wanted, height, "crouch changed");
    }

    /// Removes the rope and the player body. The only place the node arena is
    /// destroyed.
    pub fn despawn(mut self, backend: &mut B) {
        if let Some(rig) = &mut self.tether {
            rig.despawn(backend);
        }
        backend.remove_body(self.body);
        debug!("player despawned");
    }
}

use nalgebra::Vector3;
use serde::Serialize;
use tracing::debug;

use super::backend::{NodeSpec, PhysicsBackend, SpringLink};
use crate::config::TetherConfig;

/// One rope node and the spring tying it to its predecessor.
#[derive(Debug)]
struct NodeSlot<B: PhysicsBackend> {
    body: B::Body,
    kinematic: bool,
    link: Option<B::Joint>,
}

/// Fixed-capacity node slots, built once and toggled active/inactive.
///
/// The boxed slice cannot grow or shrink, so the node sequence keeps the
/// length it was built with for the lifetime of the rig.
#[derive(Debug)]
struct NodeArena<B: PhysicsBackend> {
    slots: Box<[NodeSlot<B>]>,
    active: bool,
}

impl<B: PhysicsBackend> NodeArena<B> {
    fn build(backend: &mut B, config: &TetherConfig, anchor: Vector3<f32>) -> Self {
        let mut slots: Vec<NodeSlot<B>> = Vec::with_capacity(config.node_count);
        for index in 0..config.node_count {
            let kinematic = index == 0;
            let body = backend.spawn_rope_node(
                anchor,
                NodeSpec {
                    kinematic,
                    mass: config.node_mass,
                    linear_damping: config.node_damping,
                    radius: config.collider_radius,
                },
            );
            let link = slots.last().map(|prev| {
                backend.create_spring(SpringLink {
                    body_a: body,
                    anchor_a: Vector3::zeros(),
                    body_b: prev.body,
                    anchor_b: Vector3::zeros(),
                    rest_length: config.node_spacing,
                    stiffness: config.spring_strength,
                    damping: config.spring_damper,
                })
            });
            slots.push(NodeSlot { body, kinematic, link });
        }
        debug!(nodes = slots.len(), "rope node arena built");
        Self {
            slots: slots.into_boxed_slice(),
            active: true,
        }
    }

    fn set_active(&mut self, backend: &mut B, active: bool) {
        for slot in self.slots.iter() {
            backend.set_body_enabled(slot.body, active);
        }
        self.active = active;
    }

    /// Moves every node onto `anchor` and stills the dynamic ones.
    fn reposition(&self, backend: &mut B, anchor: Vector3<f32>) {
        for slot in self.slots.iter() {
            backend.set_body_position(slot.body, anchor);
            if !slot.kinematic {
                backend.set_body_velocity(slot.body, Vector3::zeros());
            }
        }
    }

    fn last(&self) -> Option<&NodeSlot<B>> {
        self.slots.last()
    }
}

/// Rope points handed to the line renderer each step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RopeRenderFrame {
    pub visible: bool,
    /// Node positions followed by the player attachment point.
    pub points: Vec<[f32; 3]>,
    pub line_width: f32,
    pub color: [f32; 4],
}

/// Deployable chain of spring-linked bodies anchored where it was deployed
/// and attached to the player by a zero-length spring.
///
/// Nodes are created on the first deployment and reused on every later one;
/// only the player-side spring comes and goes.
#[derive(Debug)]
pub struct TetherRig<B: PhysicsBackend> {
    config: TetherConfig,
    arena: Option<NodeArena<B>>,
    player_link: Option<B::Joint>,
    deployed: bool,
}

impl<B: PhysicsBackend> TetherRig<B> {
    pub fn new(config: TetherConfig) -> Self {
        Self {
            config,
            arena: None,
            player_link: None,
            deployed: false,
        }
    }

    pub fn is_deployed(&self) -> bool {
        self.deployed
    }

    /// True once the node arena exists.
    pub fn has_nodes(&self) -> bool {
        self.arena.is_some()
    }

    pub fn node_bodies(&self) -> Vec<B::Body> {
        self.arena
            .as_ref()
            .map(|arena| arena.slots.iter().map(|slot| slot.body).collect())
            .unwrap_or_default()
    }

    pub fn node_links(&self) -> Vec<B::Joint> {
        self.arena
            .as_ref()
            .map(|arena| arena.slots.iter().filter_map(|slot| slot.link).collect())
            .unwrap_or_default()
    }

    pub fn player_link(&self) -> Option<B::Joint> {
        self.player_link
    }

    /// World-space attachment point on the player.
    pub fn anchor_position(&self, player_position: Vector3<f32>) -> Vector3<f32> {
        player_position + Vector3::from(self.config.player_anchor_offset)
    }

    /// Returns the new deployed state.
    pub fn toggle(&mut self, backend: &mut B, player: B::Body) -> bool {
        if self.deployed {
            self.retract(backend);
        } else {
            self.deploy(backend, player);
        }
        self.deployed
    }

    pub fn deploy(&mut self, backend: &mut B, player: B::Body) {
        if self.deployed {
            return;
        }
        let Some(player_position) = backend.body_position(player) else {
            return;
        };
        let anchor = self.anchor_position(player_position);

        match &mut self.arena {
            None => self.arena = Some(NodeArena::build(backend, &self.config, anchor)),
            Some(arena) => {
                arena.set_active(backend, true);
                arena.reposition(backend, anchor);
            }
        }

        let Some(last) = self.arena.as_ref().and_then(|arena| arena.last()).map(|slot| slot.body) else {
            return;
        };
        self.player_link = Some(backend.create_spring(SpringLink {
            body_a: player,
            anchor_a: Vector3::from(self.config.player_anchor_offset),
            body_b: last,
            anchor_b: Vector3::zeros(),
            rest_length: 0.0,
            stiffness: self.config.player_spring_strength,
            damping: self.config.player_spring_damper,
        }));
        self.deployed = true;
        debug!(anchor = ?anchor, "tether deployed");
    }

    pub fn retract(&mut self, backend: &mut B) {
        if !self.deployed {
            return;
        }
        if let Some(joint) = self.player_link.take() {
            backend.remove_spring(joint);
        }
        if let Some(arena) = &mut self.arena {
            arena.set_active(backend, false);
        }
        self.deployed = false;
        debug!("tether retracted");
    }

    /// Render snapshot: `node_count + 1` points while deployed, hidden otherwise.
    pub fn render_frame(&self, backend: &B, player: B::Body) -> RopeRenderFrame {
        let mut frame = RopeRenderFrame {
            visible: false,
            points: Vec::new(),
            line_width: self.config.line_width,
            color: self.config.color,
        };
        let Some(arena) = self.arena.as_ref().filter(|arena| self.deployed && arena.active) else {
            return frame;
        };
        let Some(player_position) = backend.body_position(player) else {
            return frame;
        };

        frame.points.reserve(arena.slots.len() + 1);
        for slot in arena.slots.iter() {
            let p = backend.body_position(slot.body).unwrap_or_else(Vector3::zeros);
            frame.points.push([p.x, p.y, p.z]);
        }
        let anchor = self.anchor_position(player_position);
        frame.points.push([anchor.x, anchor.y, anchor.z]);
        frame.visible = true;
        frame
    }

    /// Removes every node and spring. Called when the owning entity is destroyed.
    pub fn despawn(&mut self, backend: &mut B) {
        if let Some(joint) = self.player_link.take() {
            backend.remove_spring(joint);
        }
        if let Some(arena) = self.arena.take() {
            for slot in arena.slots.iter() {
                if let Some(link) = slot.link {
                    backend.remove_spring(link);
                }
                backend.remove_body(slot.body);
            }
        }
        self.deployed = false;
    }
}

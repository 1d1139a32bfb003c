use nalgebra::Vector3;
use std::fmt::Debug;

/// Sphere sweep against the environment category.
#[derive(Debug, Clone, Copy)]
pub struct SweepQuery<B> {
    pub origin: Vector3<f32>,
    pub radius: f32,
    /// Unit direction of travel.
    pub direction: Vector3<f32>,
    pub distance: f32,
    /// Body whose colliders never count as a hit.
    pub exclude: Option<B>,
}

/// Physical description of one rope node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeSpec {
    /// Kinematic nodes are immovable and ignore forces.
    pub kinematic: bool,
    pub mass: f32,
    pub linear_damping: f32,
    pub radius: f32,
}

/// Spring constraint between two bodies, anchors in body-local space.
#[derive(Debug, Clone, Copy)]
pub struct SpringLink<B> {
    pub body_a: B,
    pub anchor_a: Vector3<f32>,
    pub body_b: B,
    pub anchor_b: Vector3<f32>,
    pub rest_length: f32,
    pub stiffness: f32,
    pub damping: f32,
}

/// The rigid-body and constraint solver the core drives.
///
/// The core only decides target velocities, timing windows and constraint
/// topology; integrating bodies and solving contacts and springs happens on
/// the other side of this trait. Every operation is infallible from the
/// caller's point of view: a stale handle is a silent no-op.
pub trait PhysicsBackend {
    type Body: Copy + Eq + Debug;
    type Joint: Copy + Eq + Debug;

    /// True when the swept sphere touches environment geometry.
    fn sweep_sphere(&self, query: &SweepQuery<Self::Body>) -> bool;

    fn body_position(&self, body: Self::Body) -> Option<Vector3<f32>>;
    /// Teleports a body without integrating through the path.
    fn set_body_position(&mut self, body: Self::Body, position: Vector3<f32>);
    fn set_body_velocity(&mut self, body: Self::Body, velocity: Vector3<f32>);
    /// Rotation about the vertical axis, radians.
    fn set_body_yaw(&mut self, body: Self::Body, yaw: f32);
    /// Disabled bodies are skipped by the solver and by queries but keep their handle.
    fn set_body_enabled(&mut self, body: Self::Body, enabled: bool);
    fn remove_body(&mut self, body: Self::Body);
    /// Rebuilds the capsule collider of a body, keeping its feet in place.
    fn resize_capsule(&mut self, body: Self::Body, radius: f32, height: f32);

    fn spawn_rope_node(&mut self, position: Vector3<f32>, spec: NodeSpec) -> Self::Body;
    fn create_spring(&mut self, link: SpringLink<Self::Body>) -> Self::Joint;
    fn remove_spring(&mut self, joint: Self::Joint);
}

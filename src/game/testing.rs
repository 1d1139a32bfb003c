//! Scripted backend for unit tests: ground and ceiling contact are set by the
//! test instead of being computed from geometry.

use nalgebra::Vector3;

use super::backend::{NodeSpec, PhysicsBackend, SpringLink, SweepQuery};

#[derive(Debug, Clone)]
pub struct FakeBody {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
    pub yaw: f32,
    pub enabled: bool,
    pub removed: bool,
    pub node: Option<NodeSpec>,
    pub capsule: Option<(f32, f32)>,
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    pub bodies: Vec<FakeBody>,
    pub joints: Vec<Option<SpringLink<usize>>>,
    pub ground: bool,
    pub ceiling: bool,
    pub sweeps: std::cell::RefCell<Vec<SweepQuery<usize>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_body(&mut self, position: Vector3<f32>) -> usize {
        self.bodies.push(FakeBody {
            position,
            velocity: Vector3::zeros(),
            yaw: 0.0,
            enabled: true,
            removed: false,
            node: None,
            capsule: None,
        });
        self.bodies.len() - 1
    }

    pub fn live_joints(&self) -> usize {
        self.joints.iter().filter(|j| j.is_some()).count()
    }

    pub fn node_count(&self) -> usize {
        self.bodies
            .iter()
            .filter(|b| b.node.is_some() && !b.removed)
            .count()
    }
}

impl PhysicsBackend for FakeBackend {
    type Body = usize;
    type Joint = usize;

    fn sweep_sphere(&self, query: &SweepQuery<usize>) -> bool {
        self.sweeps.borrow_mut().push(*query);
        if query.direction.y < 0.0 {
            self.ground
        } else {
            self.ceiling
        }
    }

    fn body_position(&self, body: usize) -> Option<Vector3<f32>> {
        self.bodies.get(body).filter(|b| !b.removed).map(|b| b.position)
    }

    fn set_body_position(&mut self, body: usize, position: Vector3<f32>) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.position = position;
        }
    }

    fn set_body_velocity(&mut self, body: usize, velocity: Vector3<f32>) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.velocity = velocity;
        }
    }

    fn set_body_yaw(&mut self, body: usize, yaw: f32) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.yaw = yaw;
        }
    }

    fn set_body_enabled(&mut self, body: usize, enabled: bool) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.enabled = enabled;
        }
    }

    fn remove_body(&mut self, body: usize) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.removed = true;
        }
        for joint in &mut self.joints {
            if joint.is_some_and(|j| j.body_a == body || j.body_b == body) {
                *joint = None;
            }
        }
    }

    fn resize_capsule(&mut self, body: usize, radius: f32, height: f32) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.capsule = Some((radius, height));
        }
    }

    fn spawn_rope_node(&mut self, position: Vector3<f32>, spec: NodeSpec) -> usize {
        let id = self.add_body(position);
        self.bodies[id].node = Some(spec);
        id
    }

    fn create_spring(&mut self, link: SpringLink<usize>) -> usize {
        self.joints.push(Some(link));
        self.joints.len() - 1
    }

    fn remove_spring(&mut self, joint: usize) {
        if let Some(slot) = self.joints.get_mut(joint) {
            *slot = None;
        }
    }
}

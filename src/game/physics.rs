use nalgebra::{UnitQuaternion, Vector3};
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::parry::shape::Ball;
use rapier3d::prelude::*;

use super::backend::{NodeSpec, PhysicsBackend, SpringLink, SweepQuery};
use super::constants::physics as consts;

// Collision categories. The player and rope nodes only collide with static
// environment geometry, never with each other.
pub const GROUP_ENVIRONMENT: Group = Group::GROUP_1; // Floors, walls, ceilings
pub const GROUP_PLAYER: Group = Group::GROUP_2;
pub const GROUP_ROPE: Group = Group::GROUP_3;

/// Wrapper around a Rapier3D pipeline acting as the external solver for the
/// player core: it integrates bodies, resolves contacts and solves springs.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
}

/// Capsule collider whose bottom sits on the body origin.
fn build_capsule(radius: f32, height: f32) -> Collider {
    let half_height = (height - 2.0 * radius).max(0.0) / 2.0;
    ColliderBuilder::capsule_y(half_height, radius)
        .translation(vector![0.0, height / 2.0, 0.0])
        .friction(0.0)
        .friction_combine_rule(CoefficientCombineRule::Min)
        .collision_groups(InteractionGroups::new(GROUP_PLAYER, GROUP_ENVIRONMENT))
        .build()
}

impl PhysicsWorld {
    /// Creates a new physics world with default gravity
    pub fn new() -> Self {
        Self {
            gravity: vector![0.0, -consts::DEFAULT_GRAVITY, 0.0],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Sets the gravity felt by rope nodes
    pub fn set_gravity(&mut self, gravity_y: f32) {
        self.gravity = vector![0.0, -gravity_y, 0.0];
    }

    /// Steps the physics simulation forward by dt seconds
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Brings the query pipeline up to date with bodies moved since the last step.
    pub fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Adds an immovable environment cuboid.
    pub fn add_static_block(&mut self, center: [f32; 3], size: [f32; 3]) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![center[0], center[1], center[2]])
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::cuboid(size[0] / 2.0, size[1] / 2.0, size[2] / 2.0)
            .collision_groups(InteractionGroups::new(GROUP_ENVIRONMENT, Group::ALL))
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Adds the player body: a dynamic capsule with its origin at the feet.
    /// Rotation is locked and gravity is left to the locomotion state machine.
    pub fn add_player(&mut self, feet: [f32; 3], radius: f32, height: f32) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![feet[0], feet[1], feet[2]])
            .lock_rotations()
            .gravity_scale(0.0)
            .ccd_enabled(true)
            .build();
        let handle = self.rigid_body_set.insert(body);
        self.collider_set
            .insert_with_parent(build_capsule(radius, height), handle, &mut self.rigid_body_set);
        handle
    }

    /// Gets the position of a rigid body
    pub fn get_position(&self, handle: RigidBodyHandle) -> Option<[f32; 3]> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            [pos.x, pos.y, pos.z]
        })
    }

    /// Number of live spring joints.
    pub fn joint_count(&self) -> usize {
        self.impulse_joint_set.len()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsBackend for PhysicsWorld {
    type Body = RigidBodyHandle;
    type Joint = ImpulseJointHandle;

    fn sweep_sphere(&self, query: &SweepQuery<RigidBodyHandle>) -> bool {
        let origin = query.origin;
        let shape_pos = Isometry::translation(origin.x, origin.y, origin.z);
        let ball = Ball::new(query.radius);

        let mut filter = QueryFilter::default()
            .exclude_sensors()
            .groups(InteractionGroups::new(GROUP_PLAYER, GROUP_ENVIRONMENT));
        if let Some(body) = query.exclude {
            filter = filter.exclude_rigid_body(body);
        }

        self.query_pipeline
            .cast_shape(
                &self.rigid_body_set,
                &self.collider_set,
                &shape_pos,
                &query.direction,
                &ball,
                ShapeCastOptions::with_max_time_of_impact(query.distance),
                filter,
            )
            .is_some()
    }

    fn body_position(&self, body: RigidBodyHandle) -> Option<Vector3<f32>> {
        self.rigid_body_set.get(body).map(|b| *b.translation())
    }

    fn set_body_position(&mut self, body: RigidBodyHandle, position: Vector3<f32>) {
        if let Some(b) = self.rigid_body_set.get_mut(body) {
            b.set_translation(position, true);
            if b.is_kinematic() {
                b.set_next_kinematic_translation(position);
            }
        }
    }

    fn set_body_velocity(&mut self, body: RigidBodyHandle, velocity: Vector3<f32>) {
        if let Some(b) = self.rigid_body_set.get_mut(body) {
            if b.is_dynamic() {
                b.set_linvel(velocity, true);
                b.set_angvel(Vector3::zeros(), true);
            }
        }
    }

    fn set_body_yaw(&mut self, body: RigidBodyHandle, yaw: f32) {
        if let Some(b) = self.rigid_body_set.get_mut(body) {
            b.set_rotation(UnitQuaternion::from_euler_angles(0.0, yaw, 0.0), false);
        }
    }

    fn set_body_enabled(&mut self, body: RigidBodyHandle, enabled: bool) {
        if let Some(b) = self.rigid_body_set.get_mut(body) {
            b.set_enabled(enabled);
        }
    }

    fn remove_body(&mut self, body: RigidBodyHandle) {
        self.rigid_body_set.remove(
            body,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    fn resize_capsule(&mut self, body: RigidBodyHandle, radius: f32, height: f32) {
        let Some(b) = self.rigid_body_set.get(body) else {
            return;
        };
        let colliders: Vec<_> = b.colliders().to_vec();
        for collider_handle in colliders {
            self.collider_set.remove(
                collider_handle,
                &mut self.island_manager,
                &mut self.rigid_body_set,
                true,
            );
        }
        self.collider_set
            .insert_with_parent(build_capsule(radius, height), body, &mut self.rigid_body_set);
    }

    fn spawn_rope_node(&mut self, position: Vector3<f32>, spec: NodeSpec) -> RigidBodyHandle {
        let builder = if spec.kinematic {
            RigidBodyBuilder::kinematic_position_based()
        } else {
            RigidBodyBuilder::dynamic()
        };
        let body = builder
            .translation(position)
            .linear_damping(spec.linear_damping)
            .lock_rotations()
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::ball(spec.radius)
            .mass(spec.mass)
            .collision_groups(InteractionGroups::new(GROUP_ROPE, GROUP_ENVIRONMENT))
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    fn create_spring(&mut self, link: SpringLink<RigidBodyHandle>) -> ImpulseJointHandle {
        let joint = SpringJointBuilder::new(link.rest_length, link.stiffness, link.damping)
            .local_anchor1(Point::from(link.anchor_a))
            .local_anchor2(Point::from(link.anchor_b))
            .build();
        self.impulse_joint_set
            .insert(link.body_a, link.body_b, joint, true)
    }

    fn remove_spring(&mut self, joint: ImpulseJointHandle) {
        self.impulse_joint_set.remove(joint, true);
    }
}
